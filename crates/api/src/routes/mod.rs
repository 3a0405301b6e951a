//! HTTP route handlers.

pub mod auth;
pub mod deliveries;
pub mod donations;
pub mod health;
pub mod profiles;
