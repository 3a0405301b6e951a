//! Domain models for FoodLink.

pub mod account;
pub mod donation;
pub mod photo;
pub mod profile;
pub mod session;

pub use account::Account;
pub use donation::{
    visible_donations, BrowseFilter, CreateDonationRequest, Donation, DonationStats,
    DonationStatus, NewDonation, StatusChange, ValidDonation,
};
pub use photo::PhotoUpload;
pub use profile::{NewProfile, Profile, ProfileUpdate, Role, UpdateProfileRequest};
pub use session::SessionContext;
