//! Authenticated caller context.

use uuid::Uuid;

use super::profile::{Profile, Role};

/// Identity of the caller, resolved once per request and passed to every operation that needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionContext {
    /// Account id.
    pub user_id: Uuid,
    /// Token id of the active session.
    pub session_id: Uuid,
    pub profile_id: Uuid,
    pub role: Role,
}

impl SessionContext {
    pub fn new(session_id: Uuid, profile: &Profile) -> Self {
        Self {
            user_id: profile.user_id,
            session_id,
            profile_id: profile.id,
            role: profile.role,
        }
    }
}
