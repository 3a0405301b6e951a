//! API-side services and storage adapters.

pub mod auth;
pub mod photo_storage;

pub use auth::{AuthError, AuthResult, AuthService};
pub use photo_storage::LocalPhotoStore;
