//! Core domain types and utilities for the Grace Pharmacy API.
//!
//! This crate provides the foundational types, error handling, and shared
//! identifiers used by the access-control and records crates.

pub mod error;
pub mod id;

pub use error::{Result, StoreError};
pub use id::{IdentityId, ParseIdError, ProfileId, UserId};
