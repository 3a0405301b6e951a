//! Donation repository for database operations.

use async_trait::async_trait;
use domain::models::{Donation, DonationStatus, NewDonation, StatusChange};
use domain::services::DonationStore;
use domain::StoreError;
use sqlx::PgPool;
use uuid::Uuid;

use super::map_sqlx;
use crate::entities::{DonationEntity, DonationStatusDb};
use crate::metrics::{record_pool_metrics, QueryTimer};

/// Repository for donation-related database operations.
#[derive(Clone)]
pub struct DonationRepository {
    pool: PgPool,
}

impl DonationRepository {
    /// Creates a new DonationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert a new donation. Status defaults to `available`.
    pub async fn create(&self, donation: &NewDonation) -> Result<DonationEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_donation");
        let result = sqlx::query_as::<_, DonationEntity>(
            r#"
            INSERT INTO donations (donor_id, food_type, quantity, servings, location,
                                   latitude, longitude, expiry_hours, description, photo_url, urgent)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, donor_id, food_type, quantity, servings, location, latitude, longitude,
                      expiry_hours, description, photo_url, status, accepted_by, urgent,
                      created_at, updated_at
            "#,
        )
        .bind(donation.donor_id)
        .bind(&donation.food_type)
        .bind(&donation.quantity)
        .bind(donation.servings)
        .bind(&donation.location)
        .bind(donation.latitude)
        .bind(donation.longitude)
        .bind(donation.expiry_hours)
        .bind(&donation.description)
        .bind(&donation.photo_url)
        .bind(donation.urgent)
        .fetch_one(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Find a donation by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<DonationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_donation_by_id");
        let result = sqlx::query_as::<_, DonationEntity>(
            r#"
            SELECT id, donor_id, food_type, quantity, servings, location, latitude, longitude,
                   expiry_hours, description, photo_url, status, accepted_by, urgent,
                   created_at, updated_at
            FROM donations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// List donations in a status, newest first.
    pub async fn list_by_status(
        &self,
        status: DonationStatusDb,
    ) -> Result<Vec<DonationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_donations_by_status");
        let result = sqlx::query_as::<_, DonationEntity>(
            r#"
            SELECT id, donor_id, food_type, quantity, servings, location, latitude, longitude,
                   expiry_hours, description, photo_url, status, accepted_by, urgent,
                   created_at, updated_at
            FROM donations
            WHERE status = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }

    /// List donations a profile gave or received, filtered by status, newest first.
    pub async fn list_for_participant(
        &self,
        profile_id: Uuid,
        statuses: Vec<DonationStatusDb>,
    ) -> Result<Vec<DonationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_donations_for_participant");
        let result = sqlx::query_as::<_, DonationEntity>(
            r#"
            SELECT id, donor_id, food_type, quantity, servings, location, latitude, longitude,
                   expiry_hours, description, photo_url, status, accepted_by, urgent,
                   created_at, updated_at
            FROM donations
            WHERE (donor_id = $1 OR accepted_by = $1)
              AND status = ANY($2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(profile_id)
        .bind(statuses)
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }

    /// List every donation posted by a profile, newest first.
    pub async fn list_by_donor(&self, donor_id: Uuid) -> Result<Vec<DonationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_donations_by_donor");
        let result = sqlx::query_as::<_, DonationEntity>(
            r#"
            SELECT id, donor_id, food_type, quantity, servings, location, latitude, longitude,
                   expiry_hours, description, photo_url, status, accepted_by, urgent,
                   created_at, updated_at
            FROM donations
            WHERE donor_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(donor_id)
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Conditionally update the status.
    ///
    /// The row changes only while its status is still `expected`; returns
    /// `None` when no row matched.
    pub async fn update_status_if(
        &self,
        id: Uuid,
        expected: DonationStatusDb,
        next: DonationStatusDb,
        accepted_by: Option<Uuid>,
    ) -> Result<Option<DonationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("transition_donation");
        let result = sqlx::query_as::<_, DonationEntity>(
            r#"
            UPDATE donations
            SET status = $3,
                accepted_by = COALESCE($4, accepted_by),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING id, donor_id, food_type, quantity, servings, location, latitude, longitude,
                      expiry_hours, description, photo_url, status, accepted_by, urgent,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(next)
        .bind(accepted_by)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }
}

fn into_domain(entities: Vec<DonationEntity>) -> Vec<Donation> {
    entities.into_iter().map(Donation::from).collect()
}

#[async_trait]
impl DonationStore for DonationRepository {
    async fn insert(&self, donation: NewDonation) -> Result<Donation, StoreError> {
        self.create(&donation).await.map(Donation::from).map_err(map_sqlx)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Donation>, StoreError> {
        DonationRepository::find_by_id(self, id)
            .await
            .map(|entity| entity.map(Donation::from))
            .map_err(map_sqlx)
    }

    async fn list_by_status(&self, status: DonationStatus) -> Result<Vec<Donation>, StoreError> {
        DonationRepository::list_by_status(self, status.into())
            .await
            .map(into_domain)
            .map_err(map_sqlx)
    }

    async fn list_for_participant(
        &self,
        profile_id: Uuid,
        statuses: &[DonationStatus],
    ) -> Result<Vec<Donation>, StoreError> {
        let statuses = statuses.iter().copied().map(DonationStatusDb::from).collect();
        DonationRepository::list_for_participant(self, profile_id, statuses)
            .await
            .map(into_domain)
            .map_err(map_sqlx)
    }

    async fn list_by_donor(&self, donor_id: Uuid) -> Result<Vec<Donation>, StoreError> {
        DonationRepository::list_by_donor(self, donor_id)
            .await
            .map(into_domain)
            .map_err(map_sqlx)
    }

    async fn transition(
        &self,
        id: Uuid,
        change: StatusChange,
    ) -> Result<Option<Donation>, StoreError> {
        self.update_status_if(
            id,
            change.expected.into(),
            change.next.into(),
            change.accepted_by,
        )
        .await
        .map(|entity| entity.map(Donation::from))
        .map_err(map_sqlx)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        record_pool_metrics(&self.pool);
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(map_sqlx)
    }
}
