//! In-memory storage adapters for development and testing.
//!
//! Each store keeps its records behind a `tokio::sync::RwLock`. Conditional
//! updates hold the write guard across the check and the write.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::StoreError;
use crate::models::account::normalize_email;
use crate::models::{
    Account, Donation, DonationStatus, NewDonation, NewProfile, Profile, ProfileUpdate,
    StatusChange,
};

use super::store::{AccountStore, DonationStore, PhotoStore, ProfileStore};

fn newest_first(mut donations: Vec<Donation>) -> Vec<Donation> {
    donations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    donations
}

/// Donation store backed by a hash map.
#[derive(Debug, Default)]
pub struct InMemoryDonationStore {
    donations: RwLock<HashMap<Uuid, Donation>>,
    /// Whether to simulate backend failures for testing.
    simulate_failure: bool,
}

impl InMemoryDonationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails with a backend error.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    /// A store pre-populated with `donations`.
    pub fn with_donations(donations: impl IntoIterator<Item = Donation>) -> Self {
        Self {
            donations: RwLock::new(donations.into_iter().map(|d| (d.id, d)).collect()),
            simulate_failure: false,
        }
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.simulate_failure {
            tracing::warn!("In-memory donation store simulating failure");
            return Err(StoreError::Backend("Simulated failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DonationStore for InMemoryDonationStore {
    async fn insert(&self, new: NewDonation) -> Result<Donation, StoreError> {
        self.check()?;
        let now = Utc::now();
        let donation = Donation {
            id: Uuid::new_v4(),
            donor_id: new.donor_id,
            food_type: new.food_type,
            quantity: new.quantity,
            servings: new.servings,
            location: new.location,
            latitude: new.latitude,
            longitude: new.longitude,
            expiry_hours: new.expiry_hours,
            description: new.description,
            photo_url: new.photo_url,
            status: DonationStatus::Available,
            accepted_by: None,
            urgent: new.urgent,
            created_at: now,
            updated_at: now,
        };
        self.donations
            .write()
            .await
            .insert(donation.id, donation.clone());
        Ok(donation)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Donation>, StoreError> {
        self.check()?;
        Ok(self.donations.read().await.get(&id).cloned())
    }

    async fn list_by_status(&self, status: DonationStatus) -> Result<Vec<Donation>, StoreError> {
        self.check()?;
        let donations = self.donations.read().await;
        Ok(newest_first(
            donations
                .values()
                .filter(|d| d.status == status)
                .cloned()
                .collect(),
        ))
    }

    async fn list_for_participant(
        &self,
        profile_id: Uuid,
        statuses: &[DonationStatus],
    ) -> Result<Vec<Donation>, StoreError> {
        self.check()?;
        let donations = self.donations.read().await;
        Ok(newest_first(
            donations
                .values()
                .filter(|d| d.is_participant(profile_id) && statuses.contains(&d.status))
                .cloned()
                .collect(),
        ))
    }

    async fn list_by_donor(&self, donor_id: Uuid) -> Result<Vec<Donation>, StoreError> {
        self.check()?;
        let donations = self.donations.read().await;
        Ok(newest_first(
            donations
                .values()
                .filter(|d| d.donor_id == donor_id)
                .cloned()
                .collect(),
        ))
    }

    async fn transition(
        &self,
        id: Uuid,
        change: StatusChange,
    ) -> Result<Option<Donation>, StoreError> {
        self.check()?;
        let mut donations = self.donations.write().await;
        let Some(donation) = donations.get_mut(&id) else {
            return Ok(None);
        };
        if donation.status != change.expected {
            return Ok(None);
        }

        let accepted_by = change.accepted_by.or(donation.accepted_by);
        if change.next.has_recipient() != accepted_by.is_some() {
            return Err(StoreError::Backend(format!(
                "Status {} requires accepted_by to be {}",
                change.next,
                if change.next.has_recipient() { "set" } else { "unset" }
            )));
        }

        donation.status = change.next;
        donation.accepted_by = accepted_by;
        donation.updated_at = Utc::now();
        Ok(Some(donation.clone()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }
}

/// Profile store backed by a hash map.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<Uuid, Profile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn insert(&self, new: NewProfile) -> Result<Profile, StoreError> {
        let mut profiles = self.profiles.write().await;
        if profiles.values().any(|p| p.user_id == new.user_id) {
            return Err(StoreError::Conflict(
                "Profile already exists for this account".to_string(),
            ));
        }

        let now = Utc::now();
        let profile = Profile {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            full_name: new.full_name,
            phone: None,
            location: None,
            role: new.role,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };
        profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        let profiles = self.profiles.read().await;
        Ok(profiles.values().find(|p| p.user_id == user_id).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        Ok(self.profiles.read().await.get(&id).cloned())
    }

    async fn update(
        &self,
        profile_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<Profile>, StoreError> {
        let mut profiles = self.profiles.write().await;
        let Some(profile) = profiles.get_mut(&profile_id) else {
            return Ok(None);
        };
        profile.full_name = update.full_name;
        profile.phone = update.phone;
        profile.location = update.location;
        profile.updated_at = Utc::now();
        Ok(Some(profile.clone()))
    }
}

#[derive(Debug, Clone)]
struct SessionRecord {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
    revoked: bool,
}

/// Account and session store backed by hash maps.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<String, Account>>,
    sessions: RwLock<HashMap<Uuid, SessionRecord>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn create_account(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Account, StoreError> {
        let email = normalize_email(email);
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&email) {
            return Err(StoreError::Conflict("Email already registered".to_string()));
        }

        let account = Account {
            id: Uuid::new_v4(),
            email: email.clone(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        accounts.insert(email, account.clone());
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let email = normalize_email(email);
        Ok(self.accounts.read().await.get(&email).cloned())
    }

    async fn create_session(
        &self,
        user_id: Uuid,
        jti: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.sessions.write().await.insert(
            jti,
            SessionRecord {
                user_id,
                expires_at,
                revoked: false,
            },
        );
        Ok(())
    }

    async fn is_session_active(&self, jti: Uuid, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(&jti)
            .map(|s| !s.revoked && now < s.expires_at)
            .unwrap_or(false))
    }

    async fn revoke_session(&self, jti: Uuid) -> Result<bool, StoreError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&jti) {
            Some(session) if !session.revoked => {
                session.revoked = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn prune_sessions(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id || (!s.revoked && now < s.expires_at));
        Ok((before - sessions.len()) as u64)
    }
}

/// A photo handed to [`InMemoryPhotoStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPhoto {
    pub key: String,
    pub content_type: String,
    pub size: usize,
}

/// Photo store that records uploads without keeping the bytes.
#[derive(Debug)]
pub struct InMemoryPhotoStore {
    base_url: String,
    puts: RwLock<Vec<StoredPhoto>>,
}

impl InMemoryPhotoStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            puts: RwLock::new(Vec::new()),
        }
    }

    /// Uploads received so far.
    pub async fn stored(&self) -> Vec<StoredPhoto> {
        self.puts.read().await.clone()
    }
}

impl Default for InMemoryPhotoStore {
    fn default() -> Self {
        Self::new("http://localhost/photos")
    }
}

#[async_trait]
impl PhotoStore for InMemoryPhotoStore {
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StoreError> {
        self.puts.write().await.push(StoredPhoto {
            key: key.to_string(),
            content_type: content_type.to_string(),
            size: bytes.len(),
        });
        Ok(format!("{}/{}", self.base_url, key))
    }
}
