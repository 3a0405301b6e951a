//! Account and session repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::account::normalize_email;
use domain::models::Account;
use domain::services::AccountStore;
use domain::StoreError;
use sqlx::PgPool;
use uuid::Uuid;

use super::map_sqlx;
use crate::entities::{AccountEntity, SessionEntity};
use crate::metrics::QueryTimer;

/// Repository for accounts and their sign-in sessions.
#[derive(Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    /// Creates a new AccountRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an account. The email is stored normalized.
    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<AccountEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_account");
        let result = sqlx::query_as::<_, AccountEntity>(
            r#"
            INSERT INTO accounts (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(normalize_email(email))
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Find an account by email, ignoring case.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<AccountEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_account_by_email");
        let result = sqlx::query_as::<_, AccountEntity>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM accounts
            WHERE LOWER(email) = $1
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Record an issued token.
    pub async fn insert_session(
        &self,
        user_id: Uuid,
        jti: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("insert_session");
        let result = sqlx::query(
            r#"
            INSERT INTO sessions (jti, user_id, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(jti)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await;
        timer.finish(result).map(|_| ())
    }

    /// Find a session by token id.
    pub async fn find_session(&self, jti: Uuid) -> Result<Option<SessionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_session");
        let result = sqlx::query_as::<_, SessionEntity>(
            r#"
            SELECT jti, user_id, expires_at, revoked_at, created_at
            FROM sessions
            WHERE jti = $1
            "#,
        )
        .bind(jti)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Mark a session revoked. Returns the number of rows affected.
    pub async fn revoke(&self, jti: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("revoke_session");
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET revoked_at = NOW()
            WHERE jti = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(jti)
        .execute(&self.pool)
        .await;
        timer.finish(result).map(|r| r.rows_affected())
    }

    /// Delete a user's revoked or expired sessions. Returns the number removed.
    pub async fn delete_dead_sessions(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_dead_sessions");
        let result = sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE user_id = $1
              AND (revoked_at IS NOT NULL OR expires_at <= $2)
            "#,
        )
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await;
        timer.finish(result).map(|r| r.rows_affected())
    }
}

#[async_trait]
impl AccountStore for AccountRepository {
    async fn create_account(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Account, StoreError> {
        self.create(email, password_hash)
            .await
            .map(Account::from)
            .map_err(map_sqlx)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        AccountRepository::find_by_email(self, email)
            .await
            .map(|entity| entity.map(Account::from))
            .map_err(map_sqlx)
    }

    async fn create_session(
        &self,
        user_id: Uuid,
        jti: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.insert_session(user_id, jti, expires_at)
            .await
            .map_err(map_sqlx)
    }

    async fn is_session_active(&self, jti: Uuid, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let session = self.find_session(jti).await.map_err(map_sqlx)?;
        Ok(session.map(|s| s.is_active_at(now)).unwrap_or(false))
    }

    async fn revoke_session(&self, jti: Uuid) -> Result<bool, StoreError> {
        self.revoke(jti).await.map(|n| n > 0).map_err(map_sqlx)
    }

    async fn prune_sessions(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<u64, StoreError> {
        self.delete_dead_sessions(user_id, now)
            .await
            .map_err(map_sqlx)
    }
}
