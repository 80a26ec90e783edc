//! Database repositories for the Grace Pharmacy API.
//!
//! This module provides data access for:
//! - Patient users (`users` table)
//! - Medical profiles (`profiles` table)
//!
//! Identities and sessions live in [`crate::auth::db`].

pub mod profiles;
pub mod users;

use grace_pharmacy_core::StoreError;

pub use profiles::ProfileRepository;
pub use users::PatientRepository;

/// Maps a query failure to a store error.
pub(crate) fn unavailable(err: sqlx::Error) -> StoreError {
    StoreError::Unavailable {
        details: err.to_string(),
    }
}

/// Builds the error for a row that does not decode.
pub(crate) fn corrupt(details: String) -> StoreError {
    StoreError::Corrupt { details }
}
