//! Donation endpoint handlers.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use domain::models::{BrowseFilter, CreateDonationRequest, Donation, PhotoUpload};
use domain::FieldErrors;
use serde::Serialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentSession;

/// Donation plus its derived expiry instant.
#[derive(Debug, Clone, Serialize)]
pub struct DonationResponse {
    #[serde(flatten)]
    pub donation: Donation,
    pub expires_at: DateTime<Utc>,
}

impl From<Donation> for DonationResponse {
    fn from(donation: Donation) -> Self {
        Self {
            expires_at: donation.expires_at(),
            donation,
        }
    }
}

/// Response for donation listings.
#[derive(Debug, Serialize)]
pub struct ListDonationsResponse {
    pub donations: Vec<DonationResponse>,
    pub total: usize,
}

impl From<Vec<Donation>> for ListDonationsResponse {
    fn from(donations: Vec<Donation>) -> Self {
        let donations: Vec<DonationResponse> = donations.into_iter().map(Into::into).collect();
        Self {
            total: donations.len(),
            donations,
        }
    }
}

/// Browse available, unexpired donations. No sign in required.
///
/// GET /api/v1/donations?search=&food_type=&urgent=true
pub async fn list_donations(
    State(state): State<AppState>,
    Query(filter): Query<BrowseFilter>,
) -> Result<Json<ListDonationsResponse>, ApiError> {
    let donations = state.donations.browse(&filter, Utc::now()).await?;
    Ok(Json(donations.into()))
}

/// Get a single donation.
///
/// GET /api/v1/donations/:donation_id
pub async fn get_donation(
    State(state): State<AppState>,
    Path(donation_id): Path<Uuid>,
) -> Result<Json<DonationResponse>, ApiError> {
    let donation = state.donations.get(donation_id).await?;
    Ok(Json(donation.into()))
}

/// Post a donation from a multipart form with an optional `photo` part.
///
/// POST /api/v1/donations
pub async fn create_donation(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    multipart: Multipart,
) -> Result<(StatusCode, Json<DonationResponse>), ApiError> {
    let (request, photo) = read_donation_form(multipart).await?;

    let donation = state
        .donations
        .create(&session, &request, photo, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(donation.into())))
}

/// Accept an available donation.
///
/// POST /api/v1/donations/:donation_id/accept
pub async fn accept_donation(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(donation_id): Path<Uuid>,
) -> Result<Json<DonationResponse>, ApiError> {
    let donation = state
        .donations
        .accept(&session, donation_id, Utc::now())
        .await?;
    Ok(Json(donation.into()))
}

/// Mark an accepted donation as delivered.
///
/// POST /api/v1/donations/:donation_id/complete
pub async fn complete_donation(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(donation_id): Path<Uuid>,
) -> Result<Json<DonationResponse>, ApiError> {
    let donation = state.donations.complete(&session, donation_id).await?;
    Ok(Json(donation.into()))
}

/// Withdraw an available donation.
///
/// POST /api/v1/donations/:donation_id/cancel
pub async fn cancel_donation(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(donation_id): Path<Uuid>,
) -> Result<Json<DonationResponse>, ApiError> {
    let donation = state.donations.cancel(&session, donation_id).await?;
    Ok(Json(donation.into()))
}

/// Collects the text fields and the optional photo from the form.
async fn read_donation_form(
    mut multipart: Multipart,
) -> Result<(CreateDonationRequest, Option<PhotoUpload>), ApiError> {
    let mut request = CreateDonationRequest::default();
    let mut photo = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "photo" {
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(multipart_error)?;
            // Browsers send an empty part when no file is chosen.
            if !bytes.is_empty() {
                photo = Some(PhotoUpload::new(content_type, bytes.to_vec()));
            }
            continue;
        }

        let value = field.text().await.map_err(multipart_error)?;
        match name.as_str() {
            "food_type" => request.food_type = value,
            "quantity" => request.quantity = value,
            "servings" => request.servings = non_empty(value),
            "location" => request.location = value,
            "latitude" => request.latitude = non_empty(value),
            "longitude" => request.longitude = non_empty(value),
            "expiry_hours" => request.expiry_hours = value,
            "description" => request.description = non_empty(value),
            _ => {}
        }
    }

    Ok((request, photo))
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        let mut fields = FieldErrors::new();
        fields.add("photo", "Image must be less than 5MB");
        return ApiError::InvalidFields(fields);
    }
    ApiError::Validation(format!("Invalid form data: {}", err.body_text()))
}
