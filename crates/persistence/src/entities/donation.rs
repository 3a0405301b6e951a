//! Donation entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Donation, DonationStatus};
use sqlx::postgres::{PgHasArrayType, PgTypeInfo};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for donation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "donation_status", rename_all = "lowercase")]
pub enum DonationStatusDb {
    Available,
    Accepted,
    Completed,
    Cancelled,
}

impl PgHasArrayType for DonationStatusDb {
    fn array_type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("_donation_status")
    }
}

impl From<DonationStatusDb> for DonationStatus {
    fn from(status: DonationStatusDb) -> Self {
        match status {
            DonationStatusDb::Available => DonationStatus::Available,
            DonationStatusDb::Accepted => DonationStatus::Accepted,
            DonationStatusDb::Completed => DonationStatus::Completed,
            DonationStatusDb::Cancelled => DonationStatus::Cancelled,
        }
    }
}

impl From<DonationStatus> for DonationStatusDb {
    fn from(status: DonationStatus) -> Self {
        match status {
            DonationStatus::Available => DonationStatusDb::Available,
            DonationStatus::Accepted => DonationStatusDb::Accepted,
            DonationStatus::Completed => DonationStatusDb::Completed,
            DonationStatus::Cancelled => DonationStatusDb::Cancelled,
        }
    }
}

/// Database row mapping for the donations table.
#[derive(Debug, Clone, FromRow)]
pub struct DonationEntity {
    pub id: Uuid,
    pub donor_id: Uuid,
    pub food_type: String,
    pub quantity: String,
    pub servings: Option<i32>,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub expiry_hours: i32,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub status: DonationStatusDb,
    pub accepted_by: Option<Uuid>,
    pub urgent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DonationEntity> for Donation {
    fn from(entity: DonationEntity) -> Self {
        Self {
            id: entity.id,
            donor_id: entity.donor_id,
            food_type: entity.food_type,
            quantity: entity.quantity,
            servings: entity.servings,
            location: entity.location,
            latitude: entity.latitude,
            longitude: entity.longitude,
            expiry_hours: entity.expiry_hours,
            description: entity.description,
            photo_url: entity.photo_url,
            status: entity.status.into(),
            accepted_by: entity.accepted_by,
            urgent: entity.urgent,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            DonationStatus::Available,
            DonationStatus::Accepted,
            DonationStatus::Completed,
            DonationStatus::Cancelled,
        ] {
            let db: DonationStatusDb = status.into();
            assert_eq!(DonationStatus::from(db), status);
        }
    }

    #[test]
    fn test_status_list_binds_as_postgres_array() {
        fn assert_postgres_type<T: sqlx::Type<sqlx::Postgres>>() {}
        assert_postgres_type::<Vec<DonationStatusDb>>();
        assert_eq!(
            sqlx::TypeInfo::name(&DonationStatusDb::array_type_info()),
            "_donation_status"
        );
    }

    #[test]
    fn test_entity_to_domain() {
        let now = Utc::now();
        let recipient = Uuid::new_v4();
        let entity = DonationEntity {
            id: Uuid::new_v4(),
            donor_id: Uuid::new_v4(),
            food_type: "Biryani".to_string(),
            quantity: "8 kg".to_string(),
            servings: Some(35),
            location: "Camp".to_string(),
            latitude: Some(18.51),
            longitude: Some(73.88),
            expiry_hours: 4,
            description: None,
            photo_url: None,
            status: DonationStatusDb::Accepted,
            accepted_by: Some(recipient),
            urgent: true,
            created_at: now,
            updated_at: now,
        };

        let donation: Donation = entity.into();
        assert_eq!(donation.status, DonationStatus::Accepted);
        assert_eq!(donation.accepted_by, Some(recipient));
        assert_eq!(donation.expires_at(), now + chrono::Duration::hours(4));
    }
}
