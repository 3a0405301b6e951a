//! Domain services for FoodLink.
//!
//! Services hold the use cases and talk to storage through the ports in [`store`].

pub mod donation;
pub mod memory;
pub mod profile;
pub mod store;

pub use donation::DonationService;
pub use memory::{InMemoryAccountStore, InMemoryDonationStore, InMemoryPhotoStore, InMemoryProfileStore};
pub use profile::ProfileService;
pub use store::{AccountStore, DonationStore, PhotoStore, ProfileStore};
