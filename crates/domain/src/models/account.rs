//! Sign-in account.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Credentials for one user. Never serialized.
#[derive(Clone)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// Lowercases and trims an email for lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
