//! Find-or-create resolution of provider profiles to local users.

use rootcause::prelude::Report;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::error::AuthenticationError;
use crate::provider::ProviderProfile;
use crate::store::{IdentityStore, InsertOutcome};
use crate::user::LocalUser;

/// Maps a provider profile to exactly one local user.
///
/// An existing record is returned as stored: fields are never synced from a
/// newer provider profile. A record is created only when none exists for the
/// external id; if a concurrent login inserts first, that record wins.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn IdentityStore>,
}

impl IdentityResolver {
    #[must_use]
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    /// Resolves a profile to its local user, creating it on first login.
    #[instrument(skip_all, fields(external_id = %profile.external_id()))]
    pub async fn resolve(
        &self,
        profile: &ProviderProfile,
    ) -> Result<LocalUser, Report<AuthenticationError>> {
        if let Some(existing) = self
            .store
            .find_by_external_id(profile.external_id())
            .await
            .map_err(AuthenticationError::store)?
        {
            debug!(user_id = %existing.id(), "reusing existing identity");
            return Ok(existing);
        }

        let candidate = LocalUser::from_profile(profile);
        match self
            .store
            .insert(&candidate)
            .await
            .map_err(AuthenticationError::store)?
        {
            InsertOutcome::Inserted => {
                info!(user_id = %candidate.id(), "created identity on first login");
                Ok(candidate)
            }
            InsertOutcome::Conflict => {
                debug!("concurrent first login won the insert, fetching stored identity");
                let stored = self
                    .store
                    .find_by_external_id(profile.external_id())
                    .await
                    .map_err(AuthenticationError::store)?
                    .ok_or_else(|| {
                        AuthenticationError::store("identity vanished after insert conflict")
                    })?;
                Ok(stored)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryIdentityStore;
    use crate::user::ExternalId;
    use async_trait::async_trait;
    use grace_pharmacy_core::StoreError;
    use tokio::sync::Barrier;

    fn resolver_with_store() -> (IdentityResolver, Arc<InMemoryIdentityStore>) {
        let store = Arc::new(InMemoryIdentityStore::new());
        (IdentityResolver::new(store.clone()), store)
    }

    #[tokio::test]
    async fn first_login_creates_exactly_one_user() {
        let (resolver, store) = resolver_with_store();
        let profile = ProviderProfile::new("583231", "octocat")
            .with_display_name(Some("The Octocat".to_string()))
            .with_emails(vec!["octocat@github.com".to_string()]);

        let created = resolver.resolve(&profile).await.unwrap();
        let again = resolver.resolve(&profile).await.unwrap();

        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(created.id(), again.id());
        assert_eq!(again.display_name(), "The Octocat");
    }

    #[tokio::test]
    async fn missing_name_and_email_fall_back() {
        let (resolver, _) = resolver_with_store();

        let user = resolver
            .resolve(&ProviderProfile::new("1", "octocat"))
            .await
            .unwrap();

        assert_eq!(user.display_name(), "octocat");
        assert_eq!(user.email(), "no-email@github.com");
    }

    #[tokio::test]
    async fn returning_user_is_not_synced_from_new_profile() {
        let (resolver, store) = resolver_with_store();
        let first = ProviderProfile::new("gh-42", "alice").with_emails(vec!["a@x.com".to_string()]);
        let second = ProviderProfile::new("gh-42", "alice")
            .with_display_name(Some("Alice Renamed".to_string()))
            .with_emails(vec!["b@x.com".to_string()]);

        let created = resolver.resolve(&first).await.unwrap();
        let reused = resolver.resolve(&second).await.unwrap();

        assert_eq!(created, reused);
        assert_eq!(reused.email(), "a@x.com");
        assert_eq!(reused.display_name(), "alice");
        assert_eq!(store.len().unwrap(), 1);
    }

    /// Holds every lookup until both concurrent logins have missed.
    struct RacingStore {
        inner: InMemoryIdentityStore,
        barrier: Barrier,
        lookups: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl IdentityStore for RacingStore {
        async fn find_by_external_id(
            &self,
            external_id: &ExternalId,
        ) -> grace_pharmacy_core::Result<Option<LocalUser>, StoreError> {
            let found = self.inner.find_by_external_id(external_id).await?;
            let n = self
                .lookups
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if n < 2 {
                self.barrier.wait().await;
            }
            Ok(found)
        }

        async fn insert(
            &self,
            user: &LocalUser,
        ) -> grace_pharmacy_core::Result<InsertOutcome, StoreError> {
            self.inner.insert(user).await
        }
    }

    #[tokio::test]
    async fn concurrent_first_logins_share_one_record() {
        let store = Arc::new(RacingStore {
            inner: InMemoryIdentityStore::new(),
            barrier: Barrier::new(2),
            lookups: std::sync::atomic::AtomicUsize::new(0),
        });
        let resolver = IdentityResolver::new(store.clone());
        let a = ProviderProfile::new("gh-7", "seven").with_emails(vec!["a@x.com".to_string()]);
        let b = ProviderProfile::new("gh-7", "seven").with_emails(vec!["b@x.com".to_string()]);

        let (left, right) = tokio::join!(resolver.resolve(&a), resolver.resolve(&b));
        let (left, right) = (left.unwrap(), right.unwrap());

        assert_eq!(left.id(), right.id());
        assert_eq!(left.email(), right.email());
        assert_eq!(store.inner.len().unwrap(), 1);
    }

    struct UnavailableStore;

    #[async_trait]
    impl IdentityStore for UnavailableStore {
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
    async fn store_outage_fails_with_store_unavailable() {
        let resolver = IdentityResolver::new(Arc::new(UnavailableStore));

        let err = resolver
            .resolve(&ProviderProfile::new("1", "x"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.current_context(),
            AuthenticationError::StoreUnavailable { .. }
        ));
    }
}
