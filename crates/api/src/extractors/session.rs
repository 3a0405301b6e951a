//! Bearer-token session extractor.

use axum::{async_trait, extract::FromRequestParts, http::header, http::request::Parts};
use chrono::Utc;
use domain::models::SessionContext;

use crate::app::AppState;
use crate::error::ApiError;

/// The authenticated caller.
///
/// Resolves `Authorization: Bearer <token>` through the token, the active
/// session and the caller's profile. Rejects with 401 when any of those is
/// missing, and with 404 when the profile is gone.
#[derive(Debug, Clone, Copy)]
pub struct CurrentSession(pub SessionContext);

/// Returns the token from an `Authorization` header value.
pub fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = bearer_token(auth_header).ok_or_else(|| {
            ApiError::Unauthorized("Invalid Authorization header format".to_string())
        })?;

        let session = state.auth.authenticate(token, Utc::now()).await?;
        Ok(CurrentSession(session))
    }
}
