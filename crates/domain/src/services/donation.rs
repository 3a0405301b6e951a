//! Donation operations: browse, post, accept, complete, cancel and tracking.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{DomainError, FieldErrors};
use crate::models::{
    visible_donations, BrowseFilter, CreateDonationRequest, Donation, DonationStats,
    DonationStatus, NewDonation, PhotoUpload, SessionContext, StatusChange,
};

use super::store::{DonationStore, PhotoStore};

const DELIVERY_STATUSES: [DonationStatus; 2] = [DonationStatus::Accepted, DonationStatus::Completed];

/// Donation use cases over the storage ports.
#[derive(Clone)]
pub struct DonationService {
    donations: Arc<dyn DonationStore>,
    photos: Arc<dyn PhotoStore>,
}

impl DonationService {
    pub fn new(donations: Arc<dyn DonationStore>, photos: Arc<dyn PhotoStore>) -> Self {
        Self { donations, photos }
    }

    /// Returns the browse list at `now`.
    pub async fn browse(
        &self,
        filter: &BrowseFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<Donation>, DomainError> {
        let available = self
            .donations
            .list_by_status(DonationStatus::Available)
            .await?;
        Ok(visible_donations(available, now, filter))
    }

    pub async fn get(&self, id: Uuid) -> Result<Donation, DomainError> {
        self.find(id).await
    }

    /// Posts a donation. The photo, if any, is validated with the form and
    /// uploaded only once everything is valid.
    pub async fn create(
        &self,
        session: &SessionContext,
        request: &CreateDonationRequest,
        photo: Option<PhotoUpload>,
        now: DateTime<Utc>,
    ) -> Result<Donation, DomainError> {
        if !session.role.can_donate() {
            return Err(DomainError::Forbidden(
                "Only donors can post donations".to_string(),
            ));
        }

        let mut photo_errors = FieldErrors::new();
        if let Some(photo) = &photo {
            photo.check(&mut photo_errors);
        }

        let valid = match request.validate_and_sanitize() {
            Ok(valid) => {
                photo_errors.into_result()?;
                valid
            }
            Err(mut errors) => {
                for (field, message) in photo_errors.iter() {
                    errors.add(field, message);
                }
                return Err(errors.into());
            }
        };

        let photo_url = match photo {
            Some(photo) => {
                let key = photo.storage_key(session.user_id, now);
                Some(self.photos.put(&key, &photo.content_type, photo.bytes).await?)
            }
            None => None,
        };

        let donation = self
            .donations
            .insert(NewDonation::from_valid(session.profile_id, valid, photo_url))
            .await?;

        counter!("donations_created_total").increment(1);
        info!(
            donation_id = %donation.id,
            donor_id = %donation.donor_id,
            urgent = donation.urgent,
            "Donation posted"
        );

        Ok(donation)
    }

    /// Claims an available donation for the caller.
    pub async fn accept(
        &self,
        session: &SessionContext,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Donation, DomainError> {
        if !session.role.can_accept() {
            return Err(DomainError::Forbidden(
                "Only NGOs and volunteers can accept donations".to_string(),
            ));
        }

        let donation = self.find(id).await?;
        if donation.donor_id == session.profile_id {
            return Err(DomainError::Forbidden(
                "You cannot accept your own donation".to_string(),
            ));
        }
        if donation.status.has_recipient() {
            return Err(DomainError::AlreadyTaken);
        }
        if !donation.status.can_transition_to(DonationStatus::Accepted) {
            return Err(DomainError::InvalidTransition {
                from: donation.status,
                to: DonationStatus::Accepted,
            });
        }
        if donation.is_expired_at(now) {
            return Err(DomainError::Expired);
        }

        let accepted = self
            .donations
            .transition(id, StatusChange::accept(session.profile_id))
            .await?
            .ok_or_else(|| {
                warn!(donation_id = %id, profile_id = %session.profile_id, "Lost accept race");
                DomainError::AlreadyTaken
            })?;

        counter!("donations_accepted_total").increment(1);
        info!(
            donation_id = %accepted.id,
            accepted_by = %session.profile_id,
            "Donation accepted"
        );

        Ok(accepted)
    }

    /// Marks an accepted donation as delivered. Donor or recipient only.
    pub async fn complete(
        &self,
        session: &SessionContext,
        id: Uuid,
    ) -> Result<Donation, DomainError> {
        let donation = self.find(id).await?;
        if !donation.is_participant(session.profile_id) {
            return Err(DomainError::Forbidden(
                "Only the donor or recipient can complete this delivery".to_string(),
            ));
        }
        if !donation.status.can_transition_to(DonationStatus::Completed) {
            return Err(DomainError::InvalidTransition {
                from: donation.status,
                to: DonationStatus::Completed,
            });
        }

        let completed = match self.donations.transition(id, StatusChange::complete()).await? {
            Some(completed) => completed,
            None => return Err(self.stale(id, DonationStatus::Completed).await),
        };

        counter!("donations_completed_total").increment(1);
        info!(
            donation_id = %completed.id,
            completed_by = %session.profile_id,
            "Delivery completed"
        );

        Ok(completed)
    }

    /// Withdraws an available donation. Donor only.
    pub async fn cancel(
        &self,
        session: &SessionContext,
        id: Uuid,
    ) -> Result<Donation, DomainError> {
        let donation = self.find(id).await?;
        if donation.donor_id != session.profile_id {
            return Err(DomainError::Forbidden(
                "Only the donor can cancel this donation".to_string(),
            ));
        }
        if !donation.status.can_transition_to(DonationStatus::Cancelled) {
            return Err(DomainError::InvalidTransition {
                from: donation.status,
                to: DonationStatus::Cancelled,
            });
        }

        let cancelled = self
            .donations
            .transition(id, StatusChange::cancel())
            .await?
            .ok_or(DomainError::AlreadyTaken)?;

        counter!("donations_cancelled_total").increment(1);
        info!(donation_id = %cancelled.id, "Donation cancelled");

        Ok(cancelled)
    }

    /// In-progress and completed deliveries the caller takes part in, newest first.
    pub async fn deliveries(&self, session: &SessionContext) -> Result<Vec<Donation>, DomainError> {
        Ok(self
            .donations
            .list_for_participant(session.profile_id, &DELIVERY_STATUSES)
            .await?)
    }

    /// Dashboard counts for the caller.
    pub async fn stats(&self, session: &SessionContext) -> Result<DonationStats, DomainError> {
        let donated = self.donations.list_by_donor(session.profile_id).await?;
        let deliveries = self.deliveries(session).await?;

        let mut stats = DonationStats {
            donated: donated.len(),
            ..DonationStats::default()
        };
        for donation in &deliveries {
            match donation.status {
                DonationStatus::Accepted => stats.active += 1,
                DonationStatus::Completed => stats.completed += 1,
                DonationStatus::Available | DonationStatus::Cancelled => {}
            }
            if donation.accepted_by == Some(session.profile_id) {
                stats.received += 1;
            }
        }

        Ok(stats)
    }

    async fn find(&self, id: Uuid) -> Result<Donation, DomainError> {
        self.donations
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Donation not found".to_string()))
    }

    /// Explains a conditional update that matched no row.
    async fn stale(&self, id: Uuid, to: DonationStatus) -> DomainError {
        match self.find(id).await {
            Ok(current) => DomainError::InvalidTransition {
                from: current.status,
                to,
            },
            Err(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::donation::test_support::donation;
    use crate::models::Role;
    use crate::services::memory::{InMemoryDonationStore, InMemoryPhotoStore};
    use chrono::Duration;

    fn session(role: Role) -> SessionContext {
        SessionContext {
            user_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            profile_id: Uuid::new_v4(),
            role,
        }
    }

    fn request() -> CreateDonationRequest {
        CreateDonationRequest {
            food_type: "Idli".to_string(),
            quantity: "60 pieces".to_string(),
            servings: Some("30".to_string()),
            location: "Shivajinagar".to_string(),
            latitude: None,
            longitude: None,
            expiry_hours: "3".to_string(),
            description: None,
        }
    }

    fn service_with(
        store: InMemoryDonationStore,
    ) -> (DonationService, Arc<InMemoryDonationStore>, Arc<InMemoryPhotoStore>) {
        let store = Arc::new(store);
        let photos = Arc::new(InMemoryPhotoStore::default());
        (
            DonationService::new(store.clone(), photos.clone()),
            store,
            photos,
        )
    }

    #[tokio::test]
    async fn test_create_sets_available_and_urgent() {
        let (service, _, _) = service_with(InMemoryDonationStore::new());
        let donor = session(Role::Donor);

        let donation = service
            .create(&donor, &request(), None, Utc::now())
            .await
            .unwrap();

        assert_eq!(donation.status, DonationStatus::Available);
        assert_eq!(donation.donor_id, donor.profile_id);
        assert!(donation.urgent);
        assert_eq!(donation.photo_url, None);
    }

    #[tokio::test]
    async fn test_create_requires_donor_role() {
        let (service, _, _) = service_with(InMemoryDonationStore::new());
        let result = service
            .create(&session(Role::Ngo), &request(), None, Utc::now())
            .await;
        assert!(matches!(result, Err(DomainError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_create_uploads_photo_under_user_key() {
        let (service, _, photos) = service_with(InMemoryDonationStore::new());
        let donor = session(Role::Donor);
        let now = Utc::now();
        let photo = PhotoUpload::new("image/jpeg", vec![0; 1024]);

        let donation = service
            .create(&donor, &request(), Some(photo), now)
            .await
            .unwrap();

        let stored = photos.stored().await;
        let key = format!("{}/{}.jpg", donor.user_id, now.timestamp_millis());
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].key, key);
        assert_eq!(
            donation.photo_url,
            Some(format!("http://localhost/photos/{}", key))
        );
    }

    #[tokio::test]
    async fn test_oversized_photo_rejected_before_storage() {
        let (service, store, photos) = service_with(InMemoryDonationStore::new());
        let photo = PhotoUpload::new("image/jpeg", vec![0; 6 * 1024 * 1024]);

        let result = service
            .create(&session(Role::Donor), &request(), Some(photo), Utc::now())
            .await;

        match result {
            Err(DomainError::Validation(errors)) => {
                assert_eq!(errors.get("photo"), Some("Image must be less than 5MB"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(photos.stored().await.is_empty());
        assert!(store
            .list_by_status(DonationStatus::Available)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_photo_error_reported_with_form_errors() {
        let (service, _, photos) = service_with(InMemoryDonationStore::new());
        let bad = CreateDonationRequest {
            expiry_hours: "49".to_string(),
            ..request()
        };
        let photo = PhotoUpload::new("image/bmp", vec![0; 10]);

        let err = service
            .create(&session(Role::Donor), &bad, Some(photo), Utc::now())
            .await
            .unwrap_err();

        let DomainError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.contains("expiry_hours"));
        assert!(errors.contains("photo"));
        assert!(photos.stored().await.is_empty());
    }

    #[tokio::test]
    async fn test_browse_hides_expired_and_taken() {
        let now = Utc::now();
        let fresh = donation(now - Duration::minutes(30), 2, DonationStatus::Available);
        let expired = donation(now - Duration::hours(5), 4, DonationStatus::Available);
        let taken = donation(now, 12, DonationStatus::Accepted);
        let (service, _, _) = service_with(InMemoryDonationStore::with_donations(vec![
            fresh.clone(),
            expired,
            taken,
        ]));

        let list = service.browse(&BrowseFilter::default(), now).await.unwrap();
        assert_eq!(list, vec![fresh]);
    }

    #[tokio::test]
    async fn test_browse_store_failure() {
        let (service, _, _) = service_with(InMemoryDonationStore::failing());
        let result = service.browse(&BrowseFilter::default(), Utc::now()).await;
        assert!(matches!(result, Err(DomainError::Store(_))));
    }

    #[tokio::test]
    async fn test_accept_records_recipient() {
        let now = Utc::now();
        let available = donation(now, 12, DonationStatus::Available);
        let (service, _, _) =
            service_with(InMemoryDonationStore::with_donations(vec![available.clone()]));
        let ngo = session(Role::Ngo);

        let accepted = service.accept(&ngo, available.id, now).await.unwrap();
        assert_eq!(accepted.status, DonationStatus::Accepted);
        assert_eq!(accepted.accepted_by, Some(ngo.profile_id));

        let again = service.accept(&session(Role::Volunteer), available.id, now).await;
        assert!(matches!(again, Err(DomainError::AlreadyTaken)));
    }

    #[tokio::test]
    async fn test_accept_rules() {
        let now = Utc::now();
        let expired = donation(now - Duration::hours(3), 2, DonationStatus::Available);
        let cancelled = donation(now, 12, DonationStatus::Cancelled);
        let own = donation(now, 12, DonationStatus::Available);
        let (service, _, _) = service_with(InMemoryDonationStore::with_donations(vec![
            expired.clone(),
            cancelled.clone(),
            own.clone(),
        ]));
        let ngo = session(Role::Ngo);

        assert!(matches!(
            service.accept(&session(Role::Donor), own.id, now).await,
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            service.accept(&ngo, Uuid::new_v4(), now).await,
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            service.accept(&ngo, expired.id, now).await,
            Err(DomainError::Expired)
        ));
        assert!(matches!(
            service.accept(&ngo, cancelled.id, now).await,
            Err(DomainError::InvalidTransition { .. })
        ));

        let admin_donor = SessionContext {
            profile_id: own.donor_id,
            ..session(Role::Admin)
        };
        assert!(matches!(
            service.accept(&admin_donor, own.id, now).await,
            Err(DomainError::Forbidden(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_accepts_exactly_one_wins() {
        let now = Utc::now();
        let available = donation(now, 12, DonationStatus::Available);
        let (service, store, _) =
            service_with(InMemoryDonationStore::with_donations(vec![available.clone()]));
        let service = Arc::new(service);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = service.clone();
            let ngo = session(Role::Ngo);
            let id = available.id;
            handles.push(tokio::spawn(async move { service.accept(&ngo, id, now).await }));
        }

        let mut winners = Vec::new();
        let mut taken = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(donation) => winners.push(donation),
                Err(DomainError::AlreadyTaken) => taken += 1,
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        assert_eq!(winners.len(), 1);
        assert_eq!(taken, 7);
        let stored = store.find_by_id(available.id).await.unwrap().unwrap();
        assert_eq!(stored.accepted_by, winners[0].accepted_by);
    }

    #[tokio::test]
    async fn test_complete_by_participants_only() {
        let now = Utc::now();
        let accepted = donation(now, 12, DonationStatus::Accepted);
        let (service, _, _) =
            service_with(InMemoryDonationStore::with_donations(vec![accepted.clone()]));

        let stranger = session(Role::Volunteer);
        assert!(matches!(
            service.complete(&stranger, accepted.id).await,
            Err(DomainError::Forbidden(_))
        ));

        let recipient = SessionContext {
            profile_id: accepted.accepted_by.unwrap(),
            ..session(Role::Ngo)
        };
        let completed = service.complete(&recipient, accepted.id).await.unwrap();
        assert_eq!(completed.status, DonationStatus::Completed);
        assert_eq!(completed.accepted_by, accepted.accepted_by);
    }

    #[tokio::test]
    async fn test_complete_requires_accepted() {
        let now = Utc::now();
        let available = donation(now, 12, DonationStatus::Available);
        let (service, _, _) =
            service_with(InMemoryDonationStore::with_donations(vec![available.clone()]));
        let donor = SessionContext {
            profile_id: available.donor_id,
            ..session(Role::Donor)
        };

        let result = service.complete(&donor, available.id).await;
        assert!(matches!(
            result,
            Err(DomainError::InvalidTransition {
                from: DonationStatus::Available,
                to: DonationStatus::Completed
            })
        ));
    }

    #[tokio::test]
    async fn test_cancel_by_donor() {
        let now = Utc::now();
        let available = donation(now, 12, DonationStatus::Available);
        let accepted = donation(now, 12, DonationStatus::Accepted);
        let (service, _, _) = service_with(InMemoryDonationStore::with_donations(vec![
            available.clone(),
            accepted.clone(),
        ]));

        assert!(matches!(
            service.cancel(&session(Role::Donor), available.id).await,
            Err(DomainError::Forbidden(_))
        ));

        let donor = SessionContext {
            profile_id: available.donor_id,
            ..session(Role::Donor)
        };
        let cancelled = service.cancel(&donor, available.id).await.unwrap();
        assert_eq!(cancelled.status, DonationStatus::Cancelled);
        assert_eq!(cancelled.accepted_by, None);

        let accepted_donor = SessionContext {
            profile_id: accepted.donor_id,
            ..session(Role::Donor)
        };
        assert!(matches!(
            service.cancel(&accepted_donor, accepted.id).await,
            Err(DomainError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_deliveries_and_stats() {
        let (service, _, _) = service_with(InMemoryDonationStore::new());
        let donor = session(Role::Donor);
        let ngo = session(Role::Ngo);
        let now = Utc::now();

        let first = service.create(&donor, &request(), None, now).await.unwrap();
        let second = service.create(&donor, &request(), None, now).await.unwrap();
        service.create(&donor, &request(), None, now).await.unwrap();

        service.accept(&ngo, first.id, now).await.unwrap();
        service.accept(&ngo, second.id, now).await.unwrap();
        service.complete(&donor, second.id).await.unwrap();

        let deliveries = service.deliveries(&ngo).await.unwrap();
        assert_eq!(deliveries.len(), 2);

        let donor_stats = service.stats(&donor).await.unwrap();
        assert_eq!(
            donor_stats,
            DonationStats {
                donated: 3,
                active: 1,
                completed: 1,
                received: 0,
            }
        );

        let ngo_stats = service.stats(&ngo).await.unwrap();
        assert_eq!(ngo_stats.donated, 0);
        assert_eq!(ngo_stats.received, 2);
    }
}
