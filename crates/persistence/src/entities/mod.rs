//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod account;
pub mod donation;
pub mod profile;

pub use account::{AccountEntity, SessionEntity};
pub use donation::{DonationEntity, DonationStatusDb};
pub use profile::{ProfileEntity, UserRoleDb};
