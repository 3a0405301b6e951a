//! Authentication routes for sign up, sign in and sign out.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use domain::models::{Profile, Role};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentSession;
use crate::services::AuthResult;

/// Request body for account creation.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct SignUpRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    pub full_name: String,

    pub role: Role,
}

/// Request body for sign in.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct SignInRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Session token plus the signed-in profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
    pub email: String,
    pub profile: Profile,
}

impl From<AuthResult> for AuthResponse {
    fn from(result: AuthResult) -> Self {
        Self {
            access_token: result.token.token,
            token_type: "Bearer".to_string(),
            expires_in: result.token.expires_in,
            expires_at: result.token.expires_at,
            email: result.email,
            profile: result.profile,
        }
    }
}

/// Create an account and profile, returning a session.
///
/// POST /api/v1/auth/signup
pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    request.validate()?;

    let result = state
        .auth
        .sign_up(
            &request.email,
            &request.password,
            &request.full_name,
            request.role,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(result.into())))
}

/// Sign in with email and password.
///
/// POST /api/v1/auth/signin
pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    request.validate()?;

    let result = state.auth.sign_in(&request.email, &request.password).await?;

    Ok(Json(result.into()))
}

/// End the caller's session.
///
/// POST /api/v1/auth/signout
pub async fn sign_out(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<StatusCode, ApiError> {
    state.auth.sign_out(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_up_request_rejects_bad_email() {
        let request: SignUpRequest = serde_json::from_value(serde_json::json!({
            "email": "not-an-email",
            "password": "long-enough",
            "full_name": "Ana",
            "role": "donor"
        }))
        .unwrap();

        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn test_sign_up_request_unknown_role() {
        let result = serde_json::from_value::<SignUpRequest>(serde_json::json!({
            "email": "a@example.org",
            "password": "long-enough",
            "full_name": "Ana",
            "role": "chef"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_sign_in_request_requires_password() {
        let request = SignInRequest {
            email: "a@example.org".to_string(),
            password: String::new(),
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }
}
