//! Storage ports.
//!
//! Services depend on these traits only. The Postgres implementations live in
//! the `persistence` crate; in-memory ones live in [`super::memory`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::StoreError;
use crate::models::{
    Account, Donation, DonationStatus, NewDonation, NewProfile, Profile, ProfileUpdate,
    StatusChange,
};

/// Donation records.
#[async_trait]
pub trait DonationStore: Send + Sync {
    /// Inserts a donation with status `available`.
    async fn insert(&self, donation: NewDonation) -> Result<Donation, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Donation>, StoreError>;

    /// Donations in `status`, newest first.
    async fn list_by_status(&self, status: DonationStatus) -> Result<Vec<Donation>, StoreError>;

    /// Donations where the profile is donor or recipient and the status is one of
    /// `statuses`, newest first.
    async fn list_for_participant(
        &self,
        profile_id: Uuid,
        statuses: &[DonationStatus],
    ) -> Result<Vec<Donation>, StoreError>;

    /// Donations posted by the profile, in any status.
    async fn list_by_donor(&self, donor_id: Uuid) -> Result<Vec<Donation>, StoreError>;

    /// Applies `change` only if the stored status equals `change.expected`.
    ///
    /// Returns `None` when the donation is missing or its status differs; the
    /// check and the write are atomic.
    async fn transition(
        &self,
        id: Uuid,
        change: StatusChange,
    ) -> Result<Option<Donation>, StoreError>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Profile records.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Creates the profile. Fails with `Conflict` if the account already has one.
    async fn insert(&self, profile: NewProfile) -> Result<Profile, StoreError>;

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, StoreError>;

    async fn update(
        &self,
        profile_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<Profile>, StoreError>;
}

/// Accounts and their sign-in sessions.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Creates an account. Fails with `Conflict` if the email is taken.
    async fn create_account(&self, email: &str, password_hash: &str)
        -> Result<Account, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn create_session(
        &self,
        user_id: Uuid,
        jti: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Returns true if the session exists, is not revoked and has not expired at `now`.
    async fn is_session_active(&self, jti: Uuid, now: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Revokes the session. Returns false if it was unknown or already revoked.
    async fn revoke_session(&self, jti: Uuid) -> Result<bool, StoreError>;

    /// Deletes the user's sessions that are revoked or expired at `now`.
    /// Returns how many were removed.
    async fn prune_sessions(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Binary storage for donation photos.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Stores the bytes under `key` and returns their public URL.
    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>)
        -> Result<String, StoreError>;
}
