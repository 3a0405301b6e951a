//! Profile entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Profile, Role};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum UserRoleDb {
    Donor,
    Ngo,
    Volunteer,
    Admin,
}

impl From<UserRoleDb> for Role {
    fn from(role: UserRoleDb) -> Self {
        match role {
            UserRoleDb::Donor => Role::Donor,
            UserRoleDb::Ngo => Role::Ngo,
            UserRoleDb::Volunteer => Role::Volunteer,
            UserRoleDb::Admin => Role::Admin,
        }
    }
}

impl From<Role> for UserRoleDb {
    fn from(role: Role) -> Self {
        match role {
            Role::Donor => UserRoleDb::Donor,
            Role::Ngo => UserRoleDb::Ngo,
            Role::Volunteer => UserRoleDb::Volunteer,
            Role::Admin => UserRoleDb::Admin,
        }
    }
}

/// Database row mapping for the profiles table.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub role: UserRoleDb,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProfileEntity> for Profile {
    fn from(entity: ProfileEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            full_name: entity.full_name,
            phone: entity.phone,
            location: entity.location,
            role: entity.role.into(),
            avatar_url: entity.avatar_url,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
