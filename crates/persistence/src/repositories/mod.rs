//! Repository implementations for database operations.
//!
//! Each repository also implements the matching domain storage port.

pub mod account;
pub mod donation;
pub mod profile;

pub use account::AccountRepository;
pub use donation::DonationRepository;
pub use profile::ProfileRepository;

use domain::StoreError;

/// Maps a database error onto the storage error the domain understands.
pub(crate) fn map_sqlx(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some("23505") => StoreError::Conflict("Resource already exists".into()),
            _ => {
                tracing::error!(error = %db_err, "Database error");
                StoreError::Backend(format!("Database error: {}", db_err))
            }
        },
        other => {
            tracing::error!(error = %other, "Database error");
            StoreError::Backend(format!("Database error: {}", other))
        }
    }
}
