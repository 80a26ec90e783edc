//! Session management for authenticated users.
//!
//! A session is a server-side record created after a successful login. Its
//! token is the user's external id and nothing else; the full user is
//! re-read from the identity store on every request through the
//! [`SessionCodec`].

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use grace_pharmacy_core::{Result, StoreError};
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::AuthenticationError;
use crate::store::IdentityStore;
use crate::user::{ExternalId, LocalUser};

/// Unique identifier for a session.
///
/// Session IDs are opaque strings carried by the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a new session ID from a string.
    #[must_use]
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Generates a fresh random session ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// Returns the session ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The compact value stored in a session: the user's external id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(ExternalId);

impl SessionToken {
    #[must_use]
    pub fn new(external_id: ExternalId) -> Self {
        Self(external_id)
    }

    #[must_use]
    pub fn external_id(&self) -> &ExternalId {
        &self.0
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// A server-side session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier for this session.
    id: SessionId,
    /// Token identifying the logged-in user.
    token: SessionToken,
    /// When the session was created.
    created_at: DateTime<Utc>,
    /// When the session expires.
    expires_at: DateTime<Utc>,
}

impl Session {
    /// Creates a new session valid for the specified duration.
    #[must_use]
    pub fn new(id: SessionId, token: SessionToken, duration: Duration) -> Self {
        let now = Utc::now();
        Self {
            id,
            token,
            created_at: now,
            expires_at: now + duration,
        }
    }

    /// Reconstitutes a session from storage.
    #[must_use]
    pub fn with_all_fields(
        id: SessionId,
        token: SessionToken,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            token,
            created_at,
            expires_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    #[must_use]
    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns true if the session has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Persistent storage for session records.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, session: &Session) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, StoreError>;

    /// Deletes a session by ID (logout). Deleting an unknown ID is not an error.
    async fn delete(&self, id: &SessionId) -> Result<(), StoreError>;

    /// Deletes expired sessions, returning how many were removed.
    async fn delete_expired(&self) -> Result<u64, StoreError>;
}

/// Session store held in process memory.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored sessions.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.sessions.read().map_err(|_| poisoned())?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable {
        details: "session map lock poisoned".to_string(),
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, session: &Session) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        sessions.insert(session.id().clone(), session.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        let sessions = self.sessions.read().map_err(|_| poisoned())?;
        Ok(sessions.get(id).cloned())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        sessions.remove(id);
        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired());
        Ok((before - sessions.len()) as u64)
    }
}

/// Result of turning a session token back into a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(LocalUser),
    /// No user matches the token, e.g. the record was deleted after login.
    NotFound,
}

/// Converts users to session tokens and back.
#[derive(Clone)]
pub struct SessionCodec {
    store: Arc<dyn IdentityStore>,
}

impl SessionCodec {
    #[must_use]
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    /// The token for a user is exactly its external id.
    #[must_use]
    pub fn serialize(user: &LocalUser) -> SessionToken {
        SessionToken::new(user.external_id().clone())
    }

    /// Re-reads the user a token refers to.
    pub async fn deserialize(
        &self,
        token: &SessionToken,
    ) -> std::result::Result<Resolution, Report<AuthenticationError>> {
        let user = self
            .store
            .find_by_external_id(token.external_id())
            .await
            .map_err(AuthenticationError::store)?;

        Ok(match user {
            Some(user) => Resolution::Found(user),
            None => Resolution::NotFound,
        })
    }
}
