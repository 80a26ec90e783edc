//! Error types for the access crate.
//!
//! Errors are reported through rootcause:
//! - `AuthenticationError`: failures of the login flow and session resolution
//! - `TransitionError`: an event that is not valid in the current auth phase

use crate::phase::{AuthEvent, AuthPhase};
use std::fmt;

/// Errors from authentication operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// The provider denied the login, the callback was malformed, or the
    /// provider could not be reached.
    ExchangeFailed { reason: String },
    /// The identity or session store failed; no session may be created.
    StoreUnavailable { details: String },
    /// A session token no longer resolves to a local user.
    SessionNotResolved,
}

impl AuthenticationError {
    /// Builds an `ExchangeFailed` error.
    pub fn exchange(reason: impl Into<String>) -> Self {
        Self::ExchangeFailed {
            reason: reason.into(),
        }
    }

    /// Builds a `StoreUnavailable` error from any displayable cause.
    pub fn store(cause: impl fmt::Display) -> Self {
        Self::StoreUnavailable {
            details: cause.to_string(),
        }
    }
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExchangeFailed { reason } => {
                write!(f, "OAuth exchange failed: {reason}")
            }
            Self::StoreUnavailable { details } => {
                write!(f, "identity store unavailable: {details}")
            }
            Self::SessionNotResolved => {
                write!(f, "session does not resolve to a user")
            }
        }
    }
}

impl std::error::Error for AuthenticationError {}

/// An event was applied to a phase that has no transition for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionError {
    pub phase: AuthPhase,
    pub event: AuthEvent,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no transition from {:?} on {:?}", self.phase, self.event)
    }
}

impl std::error::Error for TransitionError {}
