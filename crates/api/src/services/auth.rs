//! Account sign up, sign in, sign out and token resolution.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain::models::profile::sanitize_full_name;
use domain::models::{NewProfile, Profile, Role, SessionContext};
use domain::services::{AccountStore, ProfileStore};
use domain::{FieldErrors, StoreError};
use shared::jwt::{extract_user_id, IssuedToken, JwtConfig, JwtError};
use shared::password::{check_password_strength, hash_password, verify_password, PasswordError};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ApiError;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("Invalid input")]
    InvalidInput(FieldErrors),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Session has ended")]
    SessionEnded,

    #[error("Profile not found")]
    ProfileNotFound,

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Token error: {0}")]
    Token(JwtError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailAlreadyExists => {
                ApiError::Conflict("Email already registered".to_string())
            }
            AuthError::InvalidInput(fields) => ApiError::InvalidFields(fields),
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid email or password".to_string())
            }
            AuthError::InvalidToken => {
                ApiError::Unauthorized("Invalid or expired token".to_string())
            }
            AuthError::SessionEnded => {
                ApiError::Unauthorized("Session has ended, please sign in again".to_string())
            }
            AuthError::ProfileNotFound => ApiError::NotFound("Profile not found".to_string()),
            AuthError::Password(e) => ApiError::Internal(format!("Password error: {}", e)),
            AuthError::Token(e) => ApiError::Internal(format!("Token error: {}", e)),
            AuthError::Store(e) => e.into(),
        }
    }
}

/// Result of a successful sign up or sign in.
#[derive(Debug)]
pub struct AuthResult {
    pub profile: Profile,
    pub email: String,
    pub token: IssuedToken,
}

/// Issues and resolves session tokens over the account and profile stores.
#[derive(Clone)]
pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    profiles: Arc<dyn ProfileStore>,
    jwt: Arc<JwtConfig>,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        profiles: Arc<dyn ProfileStore>,
        jwt: Arc<JwtConfig>,
    ) -> Self {
        Self {
            accounts,
            profiles,
            jwt,
        }
    }

    /// Creates the account and its profile, then signs the user in.
    ///
    /// The email format is checked by the caller.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        role: Role,
    ) -> Result<AuthResult, AuthError> {
        let mut errors = FieldErrors::new();
        if let Err(message) = check_password_strength(password) {
            errors.add("password", message);
        }
        let full_name = sanitize_full_name(full_name, &mut errors);
        errors.into_result().map_err(AuthError::InvalidInput)?;

        let password_hash = hash_password(password)?;
        let account = self
            .accounts
            .create_account(email, &password_hash)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => AuthError::EmailAlreadyExists,
                other => AuthError::Store(other),
            })?;

        let profile = self
            .profiles
            .insert(NewProfile {
                user_id: account.id,
                full_name,
                role,
            })
            .await?;

        let token = self.start_session(account.id).await?;

        info!(user_id = %account.id, profile_id = %profile.id, role = %role, "Account created");

        Ok(AuthResult {
            profile,
            email: account.email,
            token,
        })
    }

    /// Verifies credentials and starts a new session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResult, AuthError> {
        let account = self
            .accounts
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &account.password_hash)? {
            warn!(user_id = %account.id, "Failed sign in");
            return Err(AuthError::InvalidCredentials);
        }

        let profile = self
            .profiles
            .find_by_user_id(account.id)
            .await?
            .ok_or(AuthError::ProfileNotFound)?;

        let pruned = self.accounts.prune_sessions(account.id, Utc::now()).await?;
        if pruned > 0 {
            debug!(user_id = %account.id, pruned = pruned, "Removed ended sessions");
        }

        let token = self.start_session(account.id).await?;

        info!(user_id = %account.id, "Signed in");

        Ok(AuthResult {
            profile,
            email: account.email,
            token,
        })
    }

    /// Ends the caller's session. Later requests with the same token are rejected.
    pub async fn sign_out(&self, session: &SessionContext) -> Result<(), AuthError> {
        if self.accounts.revoke_session(session.session_id).await? {
            info!(user_id = %session.user_id, "Signed out");
        }
        Ok(())
    }

    /// Resolves a bearer token into the caller's session context.
    pub async fn authenticate(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionContext, AuthError> {
        let claims = self.jwt.validate(token).map_err(|e| match e {
            JwtError::TokenExpired | JwtError::InvalidToken | JwtError::DecodingError(_) => {
                AuthError::InvalidToken
            }
            other => AuthError::Token(other),
        })?;

        let user_id = extract_user_id(&claims).map_err(|_| AuthError::InvalidToken)?;
        let session_id = Uuid::parse_str(&claims.jti).map_err(|_| AuthError::InvalidToken)?;

        if !self.accounts.is_session_active(session_id, now).await? {
            return Err(AuthError::SessionEnded);
        }

        let profile = self
            .profiles
            .find_by_user_id(user_id)
            .await?
            .ok_or(AuthError::ProfileNotFound)?;

        Ok(SessionContext::new(session_id, &profile))
    }

    async fn start_session(&self, user_id: Uuid) -> Result<IssuedToken, AuthError> {
        let token = self.jwt.issue(user_id).map_err(AuthError::Token)?;
        let jti = Uuid::parse_str(&token.jti).map_err(|_| AuthError::InvalidToken)?;
        self.accounts
            .create_session(user_id, jti, token.expires_at)
            .await?;
        Ok(token)
    }
}
