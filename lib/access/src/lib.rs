//! Authentication and access control for the Grace Pharmacy API.
//!
//! This crate provides:
//! - Local users resolved from OAuth provider profiles (`IdentityResolver`)
//! - Server-side sessions keyed by the user's external id (`SessionCodec`)
//! - The request-time gate in front of mutating operations (`AccessGuard`)
//! - The login state machine tying them together (`LoginFlow`, `AuthPhase`)
//!
//! Storage is abstracted behind `IdentityStore` and `SessionStore`; in-memory
//! implementations are included.
//!
//! # Example
//!
//! ```
//! use grace_pharmacy_access::{
//!     IdentityResolver, InMemoryIdentityStore, ProviderProfile, SessionCodec,
//! };
//! use std::sync::Arc;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let store = Arc::new(InMemoryIdentityStore::new());
//! let resolver = IdentityResolver::new(store.clone());
//!
//! let profile = ProviderProfile::new("583231", "octocat");
//! let user = resolver.resolve(&profile).await.unwrap();
//! assert_eq!(user.display_name(), "octocat");
//! assert_eq!(user.email(), "no-email@github.com");
//!
//! let token = SessionCodec::serialize(&user);
//! assert_eq!(token.as_str(), "583231");
//! # });
//! ```

pub mod config;
pub mod error;
pub mod exchange;
pub mod flow;
pub mod guard;
pub mod phase;
pub mod provider;
pub mod resolver;
pub mod session;
pub mod store;
pub mod user;

// Re-export main types at crate root
pub use config::{EMAIL_SCOPE, GitHubOAuthConfig};
pub use error::{AuthenticationError, TransitionError};
pub use exchange::{CallbackParams, LoginInitiation, OAuthExchange, PendingLogin};
pub use flow::{LoginFlow, LoginOutcome};
pub use guard::{Access, AccessGuard, AuthenticatedUser};
pub use phase::{AuthEvent, AuthPhase};
pub use provider::ProviderProfile;
pub use resolver::IdentityResolver;
pub use session::{
    InMemorySessionStore, Resolution, Session, SessionCodec, SessionId, SessionStore, SessionToken,
};
pub use store::{IdentityStore, InMemoryIdentityStore, InsertOutcome};
pub use user::{ExternalId, LocalUser, PLACEHOLDER_EMAIL};
