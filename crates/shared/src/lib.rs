//! Shared utilities and common types for the FoodLink backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Text sanitization for user-submitted form fields
//! - Field validators (phone numbers, photo uploads, coordinates)
//! - Session token issuing and validation (JWT)
//! - Password hashing with Argon2id

pub mod jwt;
pub mod password;
pub mod sanitize;
pub mod validation;
