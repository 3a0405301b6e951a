//! Profile domain model and role capabilities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::sanitize::{sanitize_optional, sanitize_text};
use shared::validation::validate_phone;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::errors::FieldErrors;

/// Role chosen at sign up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Donor,
    Ngo,
    Volunteer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Donor => "donor",
            Role::Ngo => "ngo",
            Role::Volunteer => "volunteer",
            Role::Admin => "admin",
        }
    }

    /// Returns true if the role may post donations.
    pub fn can_donate(&self) -> bool {
        match self {
            Role::Donor | Role::Admin => true,
            Role::Ngo | Role::Volunteer => false,
        }
    }

    /// Returns true if the role may accept donations.
    pub fn can_accept(&self) -> bool {
        match self {
            Role::Ngo | Role::Volunteer | Role::Admin => true,
            Role::Donor => false,
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "donor" => Ok(Role::Donor),
            "ngo" => Ok(Role::Ngo),
            "volunteer" => Ok(Role::Volunteer),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const MAX_NAME_CHARS: usize = 100;

/// Public profile attached to an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Profile {
    pub id: Uuid,
    /// Owning account.
    pub user_id: Uuid,
    pub full_name: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub role: Role,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values needed to create a profile at sign up.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProfile {
    pub user_id: Uuid,
    pub full_name: String,
    pub role: Role,
}

/// Sanitized profile edits. `None` clears the stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub phone: Option<String>,
    pub location: Option<String>,
}

/// Profile edit form.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateProfileRequest {
    pub full_name: String,

    #[validate(length(max = 20, message = "Phone must be less than 20 characters"))]
    pub phone: Option<String>,

    #[validate(length(max = 200, message = "Location must be less than 200 characters"))]
    pub location: Option<String>,
}

impl UpdateProfileRequest {
    /// Validates the form and returns the sanitized update.
    pub fn validate_and_sanitize(&self) -> Result<ProfileUpdate, FieldErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };

        let full_name = sanitize_full_name(&self.full_name, &mut errors);

        let phone = sanitize_optional(self.phone.as_deref());
        if let Some(phone) = phone.as_deref() {
            if let Err(e) = validate_phone(phone) {
                errors.add_validation("phone", &e);
            }
        }

        let location = sanitize_optional(self.location.as_deref());

        errors.into_result()?;

        Ok(ProfileUpdate {
            full_name,
            phone,
            location,
        })
    }
}

/// Sanitizes a display name, recording an error if it is blank or too long.
pub fn sanitize_full_name(raw: &str, errors: &mut FieldErrors) -> String {
    let name = sanitize_text(raw);
    if raw.trim().is_empty() {
        errors.add("full_name", "Name is required");
    } else if name.is_empty() {
        errors.add("full_name", "Name cannot be empty after sanitization");
    } else if name.chars().count() > MAX_NAME_CHARS {
        errors.add("full_name", "Name must be less than 100 characters");
    }
    name
}
