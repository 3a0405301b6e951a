//! Profile endpoint handlers.

use axum::{extract::State, Json};
use domain::models::{DonationStats, Profile, UpdateProfileRequest};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentSession;

/// GET /api/v1/profiles/me
pub async fn get_my_profile(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Profile>, ApiError> {
    Ok(Json(state.profiles.get(&session).await?))
}

/// Update name, phone and location.
///
/// PUT /api/v1/profiles/me
pub async fn update_my_profile(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, ApiError> {
    Ok(Json(state.profiles.update(&session, &request).await?))
}

/// Dashboard counts.
///
/// GET /api/v1/profiles/me/stats
pub async fn get_my_stats(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<DonationStats>, ApiError> {
    Ok(Json(state.donations.stats(&session).await?))
}
