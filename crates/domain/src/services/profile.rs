//! Profile operations.

use std::sync::Arc;

use tracing::info;

use crate::errors::DomainError;
use crate::models::{Profile, SessionContext, UpdateProfileRequest};

use super::store::ProfileStore;

#[derive(Clone)]
pub struct ProfileService {
    profiles: Arc<dyn ProfileStore>,
}

impl ProfileService {
    pub fn new(profiles: Arc<dyn ProfileStore>) -> Self {
        Self { profiles }
    }

    /// Caller's own profile.
    pub async fn get(&self, session: &SessionContext) -> Result<Profile, DomainError> {
        self.profiles
            .find_by_id(session.profile_id)
            .await?
            .ok_or_else(profile_not_found)
    }

    /// Validates, sanitizes and saves the caller's profile edits.
    pub async fn update(
        &self,
        session: &SessionContext,
        request: &UpdateProfileRequest,
    ) -> Result<Profile, DomainError> {
        let update = request.validate_and_sanitize()?;
        let profile = self
            .profiles
            .update(session.profile_id, update)
            .await?
            .ok_or_else(profile_not_found)?;

        info!(profile_id = %profile.id, "Profile updated");
        Ok(profile)
    }
}

fn profile_not_found() -> DomainError {
    DomainError::NotFound("Profile not found".to_string())
}
