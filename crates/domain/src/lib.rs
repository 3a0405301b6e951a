//! Domain layer for the FoodLink backend.
//!
//! This crate contains:
//! - Domain models (Donation, Profile, Account, SessionContext)
//! - The donation lifecycle and visibility rules
//! - Storage ports and their in-memory adapters
//! - Business logic services
//! - Domain error types

pub mod errors;
pub mod models;
pub mod services;

pub use errors::{DomainError, FieldErrors, StoreError};
