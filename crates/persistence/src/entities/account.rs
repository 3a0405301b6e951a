//! Account and session entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::Account;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the accounts table.
#[derive(Clone, FromRow)]
pub struct AccountEntity {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<AccountEntity> for Account {
    fn from(entity: AccountEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            password_hash: entity.password_hash,
            created_at: entity.created_at,
        }
    }
}

/// Database row mapping for the sessions table.
#[derive(Debug, Clone, FromRow)]
pub struct SessionEntity {
    pub jti: Uuid,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SessionEntity {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && now < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_session_activity() {
        let now = Utc::now();
        let mut session = SessionEntity {
            jti: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            expires_at: now + Duration::minutes(10),
            revoked_at: None,
            created_at: now,
        };

        assert!(session.is_active_at(now));
        assert!(!session.is_active_at(now + Duration::minutes(10)));

        session.revoked_at = Some(now);
        assert!(!session.is_active_at(now));
    }
}
