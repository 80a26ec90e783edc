//! Identity store interface and an in-memory implementation.

use async_trait::async_trait;
use grace_pharmacy_core::{Result, StoreError};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::user::{ExternalId, LocalUser};

/// Outcome of inserting a new local user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The record was written.
    Inserted,
    /// A record with the same external id already exists; nothing was written.
    Conflict,
}

/// Persistent collection of local users keyed by external id.
///
/// Implementations must enforce uniqueness of the external id and report a
/// duplicate insert as [`InsertOutcome::Conflict`] rather than an error.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Looks up the user for an external id.
    async fn find_by_external_id(
        &self,
        external_id: &ExternalId,
    ) -> Result<Option<LocalUser>, StoreError>;

    /// Inserts a new user.
    async fn insert(&self, user: &LocalUser) -> Result<InsertOutcome, StoreError>;
}

/// Identity store held in process memory.
///
/// Used by tests and by local runs without a database.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    users: RwLock<HashMap<ExternalId, LocalUser>>,
}

impl InMemoryIdentityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes the user for an external id, returning it if present.
    pub fn remove(&self, external_id: &ExternalId) -> Result<Option<LocalUser>, StoreError> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        Ok(users.remove(external_id))
    }

    /// Returns the number of stored users.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.users.read().map_err(|_| poisoned())?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable {
        details: "identity map lock poisoned".to_string(),
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_by_external_id(
        &self,
        external_id: &ExternalId,
    ) -> Result<Option<LocalUser>, StoreError> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.get(external_id).cloned())
    }

    async fn insert(&self, user: &LocalUser) -> Result<InsertOutcome, StoreError> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        if users.contains_key(user.external_id()) {
            return Ok(InsertOutcome::Conflict);
        }
        users.insert(user.external_id().clone(), user.clone());
        Ok(InsertOutcome::Inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderProfile;

    #[tokio::test]
    async fn insert_then_find() {
        let store = InMemoryIdentityStore::new();
        let user = LocalUser::from_profile(&ProviderProfile::new("gh-1", "one"));

        assert_eq!(store.insert(&user).await.unwrap(), InsertOutcome::Inserted);

        let found = store
            .find_by_external_id(user.external_id())
            .await
            .unwrap()
            .expect("user should exist");
        assert_eq!(found, user);
    }

    #[tokio::test]
    async fn duplicate_external_id_conflicts() {
        let store = InMemoryIdentityStore::new();
        let first = LocalUser::from_profile(&ProviderProfile::new("gh-1", "one"));
        let second = LocalUser::from_profile(&ProviderProfile::new("gh-1", "other"));

        store.insert(&first).await.unwrap();
        assert_eq!(store.insert(&second).await.unwrap(), InsertOutcome::Conflict);

        let found = store
            .find_by_external_id(&ExternalId::from("gh-1"))
            .await
            .unwrap()
            .expect("user should exist");
        assert_eq!(found.display_name(), "one");
        assert_eq!(store.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn remove_deletes_record() {
        let store = InMemoryIdentityStore::new();
        let user = LocalUser::from_profile(&ProviderProfile::new("gh-1", "one"));
        store.insert(&user).await.unwrap();

        assert!(store.remove(user.external_id()).unwrap().is_some());
        assert!(store.is_empty().unwrap());
        assert!(
            store
                .find_by_external_id(user.external_id())
                .await
                .unwrap()
                .is_none()
        );
    }
}
