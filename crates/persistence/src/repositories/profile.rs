//! Profile repository for database operations.

use async_trait::async_trait;
use domain::models::{NewProfile, Profile, ProfileUpdate};
use domain::services::ProfileStore;
use domain::StoreError;
use sqlx::PgPool;
use uuid::Uuid;

use super::map_sqlx;
use crate::entities::{ProfileEntity, UserRoleDb};
use crate::metrics::QueryTimer;

/// Repository for profile-related database operations.
#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    /// Creates a new ProfileRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the profile for an account.
    pub async fn create(
        &self,
        user_id: Uuid,
        full_name: &str,
        role: UserRoleDb,
    ) -> Result<ProfileEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_profile");
        let result = sqlx::query_as::<_, ProfileEntity>(
            r#"
            INSERT INTO profiles (user_id, full_name, role)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, full_name, phone, location, role, avatar_url,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(full_name)
        .bind(role)
        .fetch_one(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Find the profile owned by an account.
    pub async fn find_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ProfileEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_profile_by_user_id");
        let result = sqlx::query_as::<_, ProfileEntity>(
            r#"
            SELECT id, user_id, full_name, phone, location, role, avatar_url,
                   created_at, updated_at
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Find a profile by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ProfileEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_profile_by_id");
        let result = sqlx::query_as::<_, ProfileEntity>(
            r#"
            SELECT id, user_id, full_name, phone, location, role, avatar_url,
                   created_at, updated_at
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Overwrite the editable fields. `None` stores NULL.
    pub async fn update_details(
        &self,
        id: Uuid,
        full_name: &str,
        phone: Option<&str>,
        location: Option<&str>,
    ) -> Result<Option<ProfileEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_profile");
        let result = sqlx::query_as::<_, ProfileEntity>(
            r#"
            UPDATE profiles
            SET full_name = $2, phone = $3, location = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, full_name, phone, location, role, avatar_url,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(full_name)
        .bind(phone)
        .bind(location)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }
}

#[async_trait]
impl ProfileStore for ProfileRepository {
    async fn insert(&self, profile: NewProfile) -> Result<Profile, StoreError> {
        self.create(profile.user_id, &profile.full_name, profile.role.into())
            .await
            .map(Profile::from)
            .map_err(map_sqlx)
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        ProfileRepository::find_by_user_id(self, user_id)
            .await
            .map(|entity| entity.map(Profile::from))
            .map_err(map_sqlx)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        ProfileRepository::find_by_id(self, id)
            .await
            .map(|entity| entity.map(Profile::from))
            .map_err(map_sqlx)
    }

    async fn update(
        &self,
        profile_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<Profile>, StoreError> {
        self.update_details(
            profile_id,
            &update.full_name,
            update.phone.as_deref(),
            update.location.as_deref(),
        )
        .await
        .map(|entity| entity.map(Profile::from))
        .map_err(map_sqlx)
    }
}
