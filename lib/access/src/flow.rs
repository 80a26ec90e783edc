//! The login flow: redirect, callback, session issue and logout.

use chrono::Duration;
use rootcause::prelude::Report;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::error::AuthenticationError;
use crate::exchange::{CallbackParams, LoginInitiation, OAuthExchange, PendingLogin};
use crate::phase::{AuthEvent, AuthPhase};
use crate::resolver::IdentityResolver;
use crate::session::{Session, SessionCodec, SessionId, SessionStore};
use crate::user::LocalUser;

/// A completed login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: LocalUser,
    pub session: Session,
    pub phase: AuthPhase,
}

/// Drives a request through the OAuth handshake to an attached session.
#[derive(Clone)]
pub struct LoginFlow {
    exchange: Arc<dyn OAuthExchange>,
    resolver: IdentityResolver,
    sessions: Arc<dyn SessionStore>,
    session_duration: Duration,
}

impl LoginFlow {
    #[must_use]
    pub fn new(
        exchange: Arc<dyn OAuthExchange>,
        resolver: IdentityResolver,
        sessions: Arc<dyn SessionStore>,
        session_duration: Duration,
    ) -> Self {
        Self {
            exchange,
            resolver,
            sessions,
            session_duration,
        }
    }

    /// Starts a login by building the provider redirect.
    pub fn begin(&self) -> LoginInitiation {
        debug!("redirecting to identity provider");
        self.exchange.initiate()
    }

    /// Completes a login from the provider callback.
    ///
    /// No session is created unless every step succeeds.
    ///
    /// # Errors
    ///
    /// `ExchangeFailed` for a denied, malformed or unverifiable callback;
    /// `StoreUnavailable` when the user or session cannot be stored.
    #[instrument(skip_all)]
    pub async fn complete(
        &self,
        params: &CallbackParams,
        pending: Option<&PendingLogin>,
    ) -> Result<LoginOutcome, Report<AuthenticationError>> {
        let user = match self.exchange_and_resolve(params, pending).await {
            Ok(user) => user,
            Err(e) => {
                match e.current_context() {
                    AuthenticationError::StoreUnavailable { .. } => {
                        error!(error = %e, "login aborted, identity store unavailable");
                    }
                    _ => warn!(error = %e, "login callback failed"),
                }
                return Err(e);
            }
        };
        let phase = AuthPhase::PendingExchange
            .on(AuthEvent::CallbackSucceeded)
            .and_then(|phase| phase.on(AuthEvent::SessionAttached))
            .map_err(|e| AuthenticationError::exchange(e.to_string()))?;

        let session = Session::new(
            SessionId::generate(),
            SessionCodec::serialize(&user),
            self.session_duration,
        );
        self.sessions
            .create(&session)
            .await
            .map_err(|e| {
                error!(error = %e, "login aborted, session store unavailable");
                AuthenticationError::store(e)
            })?;

        info!(user_id = %user.id(), ?phase, "login complete");
        Ok(LoginOutcome {
            user,
            session,
            phase,
        })
    }

    async fn exchange_and_resolve(
        &self,
        params: &CallbackParams,
        pending: Option<&PendingLogin>,
    ) -> Result<LocalUser, Report<AuthenticationError>> {
        let code = params.authorization_code(pending)?;
        let pending = pending.ok_or_else(|| AuthenticationError::exchange("no login in progress"))?;
        let profile = self.exchange.complete(code, pending).await?;
        self.resolver.resolve(&profile).await
    }

    /// Destroys a session.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` if the session store fails.
    pub async fn logout(&self, session_id: &SessionId) -> Result<(), Report<AuthenticationError>> {
        self.sessions
            .delete(session_id)
            .await
            .map_err(AuthenticationError::store)?;
        debug!("session destroyed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::{Access, AccessGuard};
    use crate::provider::ProviderProfile;
    use crate::session::InMemorySessionStore;
    use crate::store::{IdentityStore, InMemoryIdentityStore, InsertOutcome};
    use crate::user::ExternalId;
    use async_trait::async_trait;
    use grace_pharmacy_core::StoreError;
    use std::sync::Mutex;

    /// Hands out a fixed profile, or fails when none is scripted.
    struct ScriptedExchange {
        profile: Mutex<Option<ProviderProfile>>,
    }

    #[async_trait]
    impl OAuthExchange for ScriptedExchange {
        fn initiate(&self) -> LoginInitiation {
            LoginInitiation {
                authorization_url: "https://github.com/login/oauth/authorize?scope=user%3Aemail"
                    .to_string(),
                pending: pending(),
            }
        }

        async fn complete(
            &self,
            _code: &str,
            _pending: &PendingLogin,
        ) -> Result<ProviderProfile, Report<AuthenticationError>> {
            let profile = self.profile.lock().unwrap().clone();
            Ok(profile.ok_or_else(|| AuthenticationError::exchange("bad_verification_code"))?)
        }
    }

    fn pending() -> PendingLogin {
        PendingLogin {
            csrf_token: "csrf".to_string(),
            pkce_verifier: "verifier".to_string(),
        }
    }

    fn callback() -> CallbackParams {
        CallbackParams {
            code: Some("code".to_string()),
            state: Some("csrf".to_string()),
            ..CallbackParams::default()
        }
    }

    struct Fixture {
        flow: LoginFlow,
        guard: AccessGuard,
        exchange: Arc<ScriptedExchange>,
        sessions: Arc<InMemorySessionStore>,
    }

    fn fixture(profile: Option<ProviderProfile>) -> Fixture {
        let identities = Arc::new(InMemoryIdentityStore::new());
        let sessions = Arc::new(InMemorySessionStore::new());
        let exchange = Arc::new(ScriptedExchange {
            profile: Mutex::new(profile),
        });
        let flow = LoginFlow::new(
            exchange.clone(),
            IdentityResolver::new(identities.clone()),
            sessions.clone(),
            Duration::hours(1),
        );
        let guard = AccessGuard::new(sessions.clone(), SessionCodec::new(identities));
        Fixture {
            flow,
            guard,
            exchange,
            sessions,
        }
    }

    #[test]
    fn begin_requests_email_scope() {
        let fx = fixture(None);
        let initiation = fx.flow.begin();
        assert!(initiation.authorization_url.contains("user%3Aemail"));
        assert_eq!(initiation.pending, pending());
    }

    #[tokio::test]
    async fn successful_callback_attaches_session() {
        let fx = fixture(Some(ProviderProfile::new("gh-1", "octocat")));
        let p = pending();

        let outcome = fx.flow.complete(&callback(), Some(&p)).await.unwrap();

        assert_eq!(outcome.phase, AuthPhase::Authenticated);
        assert_eq!(outcome.session.token().as_str(), "gh-1");
        let access = fx.guard.check(Some(outcome.session.id())).await;
        let allowed = access.into_user().expect("session should resolve");
        assert_eq!(allowed.user().display_name(), "octocat");
    }

    #[tokio::test]
    async fn failed_exchange_creates_no_session() {
        let fx = fixture(None);
        let p = pending();

        let err = fx.flow.complete(&callback(), Some(&p)).await.unwrap_err();

        assert!(matches!(
            err.current_context(),
            AuthenticationError::ExchangeFailed { .. }
        ));
        assert!(fx.sessions.is_empty().unwrap());
    }

    struct UnavailableIdentities;

    #[async_trait]
    impl IdentityStore for UnavailableIdentities {
        async fn find_by_external_id(
            &self,
            _external_id: &ExternalId,
        ) -> grace_pharmacy_core::Result<Option<LocalUser>, StoreError> {
            Err(StoreError::Unavailable {
                details: "connection refused".to_string(),
            }
            .into())
        }

        async fn insert(
            &self,
            _user: &LocalUser,
        ) -> grace_pharmacy_core::Result<InsertOutcome, StoreError> {
            Err(StoreError::Unavailable {
                details: "connection refused".to_string(),
            }
            .into())
        }
    }

    #[tokio::test]
    async fn identity_store_outage_creates_no_session() {
        let sessions = Arc::new(InMemorySessionStore::new());
        let flow = LoginFlow::new(
            Arc::new(ScriptedExchange {
                profile: Mutex::new(Some(ProviderProfile::new("gh-1", "octocat"))),
            }),
            IdentityResolver::new(Arc::new(UnavailableIdentities)),
            sessions.clone(),
            Duration::hours(1),
        );
        let p = pending();

        let err = flow.complete(&callback(), Some(&p)).await.unwrap_err();

        assert!(matches!(
            err.current_context(),
            AuthenticationError::StoreUnavailable { .. }
        ));
        assert!(sessions.is_empty().unwrap());
    }

    #[tokio::test]
    async fn csrf_mismatch_never_reaches_provider() {
        let fx = fixture(Some(ProviderProfile::new("gh-1", "octocat")));
        let p = PendingLogin {
            csrf_token: "expected".to_string(),
            pkce_verifier: "v".to_string(),
        };

        let result = fx.flow.complete(&callback(), Some(&p)).await;

        assert!(result.is_err());
        assert!(fx.sessions.is_empty().unwrap());
        assert!(fx.exchange.profile.lock().unwrap().is_some());
    }

    #[tokio::test]
    async fn logout_destroys_session() {
        let fx = fixture(Some(ProviderProfile::new("gh-1", "octocat")));
        let p = pending();
        let outcome = fx.flow.complete(&callback(), Some(&p)).await.unwrap();

        fx.flow.logout(outcome.session.id()).await.unwrap();

        assert!(matches!(
            fx.guard.check(Some(outcome.session.id())).await,
            Access::Deny
        ));
    }
}
