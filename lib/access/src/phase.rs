//! Per-request authentication phases and their transitions.
//!
//! ```text
//! Anonymous --Initiate--> PendingExchange --CallbackSucceeded--> Resolved
//! Resolved --SessionAttached--> Authenticated
//! PendingExchange --CallbackFailed--> Anonymous
//! Authenticated --Logout | SessionUnresolved--> Anonymous
//! ```

use serde::Serialize;

use crate::error::TransitionError;

/// Where a request stands in the login lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthPhase {
    Anonymous,
    PendingExchange,
    Resolved,
    Authenticated,
}

/// Something that moves a request between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthEvent {
    Initiate,
    CallbackSucceeded,
    CallbackFailed,
    SessionAttached,
    Logout,
    SessionUnresolved,
}

impl AuthPhase {
    /// Applies an event, returning the next phase.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] when the event has no meaning in this phase.
    pub fn on(self, event: AuthEvent) -> Result<Self, TransitionError> {
        use AuthEvent as E;
        use AuthPhase as P;

        match (self, event) {
            (P::Anonymous, E::Initiate) => Ok(P::PendingExchange),
            (P::PendingExchange, E::CallbackSucceeded) => Ok(P::Resolved),
            (P::PendingExchange, E::CallbackFailed) => Ok(P::Anonymous),
            (P::Resolved, E::SessionAttached) => Ok(P::Authenticated),
            (P::Authenticated, E::Logout | E::SessionUnresolved) => Ok(P::Anonymous),
            (phase, event) => Err(TransitionError { phase, event }),
        }
    }

    /// Returns true once a session is attached.
    #[must_use]
    pub fn is_authenticated(self) -> bool {
        self == Self::Authenticated
    }
}
