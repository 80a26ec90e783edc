//! Error handling foundation for the Grace Pharmacy API.
//!
//! This module provides the `Result` type alias using rootcause and the
//! storage error shared by every repository. Each crate defines its own
//! domain-specific error types in its own error module.

use rootcause::Report;
use std::fmt;

/// A Result type alias using rootcause's Report for error handling.
///
/// Each layer maps lower-level reports into its own context as errors propagate.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

/// Errors raised by a backing store (identities, sessions, records).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached or the query failed.
    Unavailable { details: String },
    /// A stored row could not be decoded into a domain type.
    Corrupt { details: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { details } => write!(f, "store unavailable: {details}"),
            Self::Corrupt { details } => write!(f, "corrupt stored record: {details}"),
        }
    }
}

impl std::error::Error for StoreError {}
