//! Donation domain model, lifecycle and visibility rules.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use shared::sanitize::{sanitize_optional, sanitize_text};
use shared::validation::{validate_latitude, validate_longitude};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::errors::FieldErrors;

/// Donations expiring within this many hours are urgent.
pub const URGENT_THRESHOLD_HOURS: i32 = 4;

/// Shortest accepted expiry window.
pub const MIN_EXPIRY_HOURS: i32 = 1;

/// Longest accepted expiry window.
pub const MAX_EXPIRY_HOURS: i32 = 48;

/// Largest accepted servings count.
pub const MAX_SERVINGS: i32 = 1000;

/// Returns true if a donation with this expiry window is urgent.
pub fn is_urgent(expiry_hours: i32) -> bool {
    expiry_hours <= URGENT_THRESHOLD_HOURS
}

/// Lifecycle status of a donation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus {
    Available,
    Accepted,
    Completed,
    Cancelled,
}

impl DonationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Available => "available",
            DonationStatus::Accepted => "accepted",
            DonationStatus::Completed => "completed",
            DonationStatus::Cancelled => "cancelled",
        }
    }

    /// Returns true if the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: DonationStatus) -> bool {
        matches!(
            (self, next),
            (DonationStatus::Available, DonationStatus::Accepted)
                | (DonationStatus::Available, DonationStatus::Cancelled)
                | (DonationStatus::Accepted, DonationStatus::Completed)
        )
    }

    /// Returns true if a donation in this status must carry `accepted_by`.
    pub fn has_recipient(&self) -> bool {
        match self {
            DonationStatus::Accepted | DonationStatus::Completed => true,
            DonationStatus::Available | DonationStatus::Cancelled => false,
        }
    }
}

impl FromStr for DonationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "available" => Ok(DonationStatus::Available),
            "accepted" => Ok(DonationStatus::Accepted),
            "completed" => Ok(DonationStatus::Completed),
            "cancelled" => Ok(DonationStatus::Cancelled),
            _ => Err(format!("Invalid donation status: {}", s)),
        }
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A posted unit of surplus food.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Donation {
    pub id: Uuid,
    /// Profile that posted the donation.
    pub donor_id: Uuid,
    pub food_type: String,
    /// Free text with the unit embedded ("10 kg", "3 trays").
    pub quantity: String,
    pub servings: Option<i32>,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub expiry_hours: i32,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub status: DonationStatus,
    /// Profile that accepted the donation.
    pub accepted_by: Option<Uuid>,
    pub urgent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Donation {
    /// Instant after which the food is no longer offered.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + Duration::hours(self.expiry_hours as i64)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    /// Returns true if browsing users should see this donation at `now`.
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        self.status == DonationStatus::Available && !self.is_expired_at(now)
    }

    /// Returns true if the profile is the donor or the accepting recipient.
    pub fn is_participant(&self, profile_id: Uuid) -> bool {
        self.donor_id == profile_id || self.accepted_by == Some(profile_id)
    }
}

/// Optional predicates applied on top of visibility when browsing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct BrowseFilter {
    /// Case-insensitive substring of location or food type.
    pub search: Option<String>,
    /// Exact food type.
    pub food_type: Option<String>,
    /// Only urgent donations.
    pub urgent: bool,
}

impl BrowseFilter {
    pub fn matches(&self, donation: &Donation) -> bool {
        // The query is used as typed; surrounding spaces take part in the match.
        if let Some(query) = self.search.as_deref().filter(|q| !q.is_empty()) {
            let query = query.to_lowercase();
            if !donation.location.to_lowercase().contains(&query)
                && !donation.food_type.to_lowercase().contains(&query)
            {
                return false;
            }
        }

        if let Some(food_type) = self.food_type.as_deref().filter(|f| !f.is_empty()) {
            if donation.food_type != food_type {
                return false;
            }
        }

        !self.urgent || donation.urgent
    }
}

/// Produces the browse list: visible donations matching `filter`, newest first.
pub fn visible_donations(
    donations: impl IntoIterator<Item = Donation>,
    now: DateTime<Utc>,
    filter: &BrowseFilter,
) -> Vec<Donation> {
    let mut visible: Vec<Donation> = donations
        .into_iter()
        .filter(|d| d.is_visible_at(now) && filter.matches(d))
        .collect();
    visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    visible
}

/// Donation form as posted by a donor. Numeric fields arrive as text.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateDonationRequest {
    #[validate(length(max = 100, message = "Food type must be less than 100 characters"))]
    pub food_type: String,

    #[validate(length(max = 50, message = "Quantity must be less than 50 characters"))]
    pub quantity: String,

    pub servings: Option<String>,

    #[validate(length(max = 200, message = "Location must be less than 200 characters"))]
    pub location: String,

    pub latitude: Option<String>,

    pub longitude: Option<String>,

    pub expiry_hours: String,

    #[validate(length(max = 1000, message = "Description must be less than 1000 characters"))]
    pub description: Option<String>,
}

/// Sanitized, typed donation fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidDonation {
    pub food_type: String,
    pub quantity: String,
    pub servings: Option<i32>,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub expiry_hours: i32,
    pub description: Option<String>,
}

impl ValidDonation {
    pub fn urgent(&self) -> bool {
        is_urgent(self.expiry_hours)
    }
}

impl CreateDonationRequest {
    /// Validates the form and returns sanitized values, or every failing field.
    pub fn validate_and_sanitize(&self) -> Result<ValidDonation, FieldErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };

        let food_type = sanitize_text(&self.food_type);
        if food_type.is_empty() {
            errors.add("food_type", "Food type is required");
        }

        let quantity = sanitize_text(&self.quantity);
        if quantity.is_empty() {
            errors.add("quantity", "Quantity is required");
        }

        let location = sanitize_text(&self.location);
        if location.is_empty() {
            errors.add("location", "Location is required");
        }

        let servings = match non_blank(self.servings.as_deref()) {
            None => None,
            Some(raw) => match raw.parse::<i32>() {
                Ok(n) if (1..=MAX_SERVINGS).contains(&n) => Some(n),
                _ => {
                    errors.add("servings", "Servings must be between 1 and 1000");
                    None
                }
            },
        };

        let expiry_hours = match non_blank(Some(&self.expiry_hours)) {
            None => {
                errors.add("expiry_hours", "Expiry time is required");
                0
            }
            Some(raw) => match raw.parse::<i32>() {
                Ok(n) if (MIN_EXPIRY_HOURS..=MAX_EXPIRY_HOURS).contains(&n) => n,
                _ => {
                    errors.add("expiry_hours", "Expiry hours must be between 1 and 48");
                    0
                }
            },
        };

        let (latitude, longitude) = self.coordinates(&mut errors);

        errors.into_result()?;

        Ok(ValidDonation {
            food_type,
            quantity,
            servings,
            location,
            latitude,
            longitude,
            expiry_hours,
            description: sanitize_optional(self.description.as_deref()),
        })
    }

    fn coordinates(&self, errors: &mut FieldErrors) -> (Option<f64>, Option<f64>) {
        let latitude = non_blank(self.latitude.as_deref()).and_then(|raw| {
            match raw.parse::<f64>().map_err(|_| ()).and_then(|lat| {
                validate_latitude(lat).map(|_| lat).map_err(|_| ())
            }) {
                Ok(lat) => Some(lat),
                Err(()) => {
                    errors.add("latitude", "Latitude must be between -90 and 90");
                    None
                }
            }
        });

        let longitude = non_blank(self.longitude.as_deref()).and_then(|raw| {
            match raw.parse::<f64>().map_err(|_| ()).and_then(|lon| {
                validate_longitude(lon).map(|_| lon).map_err(|_| ())
            }) {
                Ok(lon) => Some(lon),
                Err(()) => {
                    errors.add("longitude", "Longitude must be between -180 and 180");
                    None
                }
            }
        });

        match (latitude, longitude) {
            (Some(lat), Some(lon)) => (Some(lat), Some(lon)),
            (None, None) => (None, None),
            (Some(_), None) if !errors.contains("longitude") => {
                errors.add("longitude", "Latitude and longitude must be provided together");
                (None, None)
            }
            (None, Some(_)) if !errors.contains("latitude") => {
                errors.add("latitude", "Latitude and longitude must be provided together");
                (None, None)
            }
            _ => (None, None),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Values the store needs to insert a donation. Status starts as available.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDonation {
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
    pub urgent: bool,
}

impl NewDonation {
    pub fn from_valid(donor_id: Uuid, valid: ValidDonation, photo_url: Option<String>) -> Self {
        Self {
            donor_id,
            urgent: valid.urgent(),
            food_type: valid.food_type,
            quantity: valid.quantity,
            servings: valid.servings,
            location: valid.location,
            latitude: valid.latitude,
            longitude: valid.longitude,
            expiry_hours: valid.expiry_hours,
            description: valid.description,
            photo_url,
        }
    }
}

/// A conditional status update. Applied only while the stored status equals `expected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub expected: DonationStatus,
    pub next: DonationStatus,
    /// Recipient to record; `None` keeps the stored value.
    pub accepted_by: Option<Uuid>,
}

impl StatusChange {
    pub fn accept(recipient: Uuid) -> Self {
        Self {
            expected: DonationStatus::Available,
            next: DonationStatus::Accepted,
            accepted_by: Some(recipient),
        }
    }

    pub fn complete() -> Self {
        Self {
            expected: DonationStatus::Accepted,
            next: DonationStatus::Completed,
            accepted_by: None,
        }
    }

    pub fn cancel() -> Self {
        Self {
            expected: DonationStatus::Available,
            next: DonationStatus::Cancelled,
            accepted_by: None,
        }
    }
}

/// Per-profile donation counts for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DonationStats {
    /// Donations posted by the profile, in any status.
    pub donated: usize,
    /// Deliveries in progress where the profile is donor or recipient.
    pub active: usize,
    /// Completed deliveries where the profile is donor or recipient.
    pub completed: usize,
    /// Donations the profile accepted, in progress or completed.
    pub received: usize,
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Builds a donation with the given creation time, window and status.
    pub fn donation(
        created_at: DateTime<Utc>,
        expiry_hours: i32,
        status: DonationStatus,
    ) -> Donation {
        Donation {
            id: Uuid::new_v4(),
            donor_id: Uuid::new_v4(),
            food_type: "Rice".to_string(),
            quantity: "10 kg".to_string(),
            servings: Some(40),
            location: "Koregaon Park".to_string(),
            latitude: None,
            longitude: None,
            expiry_hours,
            description: None,
            photo_url: None,
            status,
            accepted_by: if status.has_recipient() {
                Some(Uuid::new_v4())
            } else {
                None
            },
            urgent: is_urgent(expiry_hours),
            created_at,
            updated_at: created_at,
        }
    }
}
