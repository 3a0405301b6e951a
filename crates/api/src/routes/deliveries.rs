//! Delivery tracking endpoint.

use axum::{extract::State, Json};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentSession;
use crate::routes::donations::ListDonationsResponse;

/// Accepted and completed donations the caller donated or received.
///
/// GET /api/v1/deliveries
pub async fn list_deliveries(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<ListDonationsResponse>, ApiError> {
    let deliveries = state.donations.deliveries(&session).await?;
    Ok(Json(deliveries.into()))
}
