//! Authentication module for the Grace Pharmacy server.
//!
//! This module provides:
//! - GitHub OAuth login (`/github`, `/github/callback`, `/logout`)
//! - Database-backed identity and session repositories
//! - The `RequireAuth` extractor that guards mutating routes
//!
//! Sessions store only the GitHub account id; every guarded request resolves
//! it back to the local user, so deleting the user revokes the session.

pub mod db;
pub mod github;
pub mod middleware;
pub mod routes;

use chrono::Duration;
use grace_pharmacy_access::{
    AccessGuard, IdentityResolver, IdentityStore, LoginFlow, OAuthExchange, SessionCodec,
    SessionStore,
};
use grace_pharmacy_records::{PatientStore, ProfileStore};
use std::sync::Arc;

use crate::config::SessionConfig;

pub use github::GitHubExchange;
pub use middleware::RequireAuth;
pub use routes::{dashboard, github_callback, github_login, logout};

/// Shared application state.
pub struct AppState {
    /// Patient user records.
    pub patients: Arc<dyn PatientStore>,
    /// Medical profile records.
    pub profiles: Arc<dyn ProfileStore>,
    /// Login and logout.
    pub login: LoginFlow,
    /// Gate for mutating routes.
    pub guard: AccessGuard,
    /// Session configuration.
    pub session_config: SessionConfig,
}

impl AppState {
    /// Wires the auth components around the given stores.
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        sessions: Arc<dyn SessionStore>,
        exchange: Arc<dyn OAuthExchange>,
        patients: Arc<dyn PatientStore>,
        profiles: Arc<dyn ProfileStore>,
        session_config: SessionConfig,
    ) -> Self {
        let login = LoginFlow::new(
            exchange,
            IdentityResolver::new(identities.clone()),
            sessions.clone(),
            Duration::minutes(session_config.duration_minutes),
        );
        let guard = AccessGuard::new(sessions, SessionCodec::new(identities));
        Self {
            patients,
            profiles,
            login,
            guard,
            session_config,
        }
    }
}
