//! Request-time access control.
//!
//! The [`AccessGuard`] decides whether a request may continue to a mutating
//! handler. Every reason to refuse (no cookie, unknown or expired session,
//! deleted user, store failure) collapses into [`Access::Deny`]; callers never
//! see an error from the guard.

use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

use crate::error::AuthenticationError;
use crate::phase::AuthPhase;
use crate::session::{Resolution, Session, SessionCodec, SessionId, SessionStore};
use crate::user::LocalUser;

/// The user and session behind an allowed request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    session: Session,
    user: LocalUser,
}

impl AuthenticatedUser {
    #[must_use]
    pub fn new(session: Session, user: LocalUser) -> Self {
        Self { session, user }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn user(&self) -> &LocalUser {
        &self.user
    }
}

/// Outcome of an access check.
#[derive(Debug, Clone)]
pub enum Access {
    Allow(AuthenticatedUser),
    Deny,
}

impl Access {
    /// The auth phase the request ends up in.
    #[must_use]
    pub fn phase(&self) -> AuthPhase {
        match self {
            Self::Allow(_) => AuthPhase::Authenticated,
            Self::Deny => AuthPhase::Anonymous,
        }
    }

    /// Returns the authenticated user when allowed.
    #[must_use]
    pub fn into_user(self) -> Option<AuthenticatedUser> {
        match self {
            Self::Allow(user) => Some(user),
            Self::Deny => None,
        }
    }
}

/// Gate in front of every mutating operation.
#[derive(Clone)]
pub struct AccessGuard {
    sessions: Arc<dyn SessionStore>,
    codec: SessionCodec,
}

impl AccessGuard {
    #[must_use]
    pub fn new(sessions: Arc<dyn SessionStore>, codec: SessionCodec) -> Self {
        Self { sessions, codec }
    }

    /// Checks the session a request carries.
    #[instrument(skip_all)]
    pub async fn check(&self, session_id: Option<&SessionId>) -> Access {
        let Some(session_id) = session_id else {
            debug!("no session cookie");
            return Access::Deny;
        };

        let session = match self.sessions.find_by_id(session_id).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                debug!("session not found");
                return Access::Deny;
            }
            Err(e) => {
                error!(error = %e, "session lookup failed, treating request as anonymous");
                return Access::Deny;
            }
        };

        if session.is_expired() {
            debug!(expired_at = %session.expires_at(), "session expired");
            if let Err(e) = self.sessions.delete(session_id).await {
                warn!(error = %e, "failed to delete expired session");
            }
            return Access::Deny;
        }

        match self.codec.deserialize(session.token()).await {
            Ok(Resolution::Found(user)) => Access::Allow(AuthenticatedUser::new(session, user)),
            Ok(Resolution::NotFound) => {
                debug!(
                    reason = %AuthenticationError::SessionNotResolved,
                    "downgrading request to anonymous"
                );
                Access::Deny
            }
            Err(e) => {
                error!(error = %e, "user lookup failed, treating request as anonymous");
                Access::Deny
            }
        }
    }
}
