//! Storage interfaces for patients and profiles, with in-memory implementations.

use async_trait::async_trait;
use grace_pharmacy_core::{ProfileId, Result, StoreError, UserId};
use std::sync::RwLock;

use crate::patient::{Patient, PatientChanges};
use crate::profile::{Profile, ProfileChanges};

/// Persistent collection of patient users.
#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Returns every patient, oldest first.
    async fn list(&self) -> Result<Vec<Patient>, StoreError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<Patient>, StoreError>;

    /// Returns true if a patient other than `excluding` uses the email.
    async fn email_taken(&self, email: &str, excluding: Option<UserId>)
    -> Result<bool, StoreError>;

    async fn insert(&self, patient: &Patient) -> Result<(), StoreError>;

    /// Applies changes to an existing patient. Returns false if none matched.
    async fn update(&self, id: UserId, changes: &PatientChanges) -> Result<bool, StoreError>;

    /// Deletes a patient. Returns false if none matched.
    async fn delete(&self, id: UserId) -> Result<bool, StoreError>;
}

/// Persistent collection of medical profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Profile>, StoreError>;

    async fn find_by_id(&self, id: ProfileId) -> Result<Option<Profile>, StoreError>;

    async fn insert(&self, profile: &Profile) -> Result<(), StoreError>;

    async fn update(&self, id: ProfileId, changes: &ProfileChanges) -> Result<bool, StoreError>;

    async fn delete(&self, id: ProfileId) -> Result<bool, StoreError>;
}

fn poisoned(what: &str) -> StoreError {
    StoreError::Unavailable {
        details: format!("{what} lock poisoned"),
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPatientStore {
    patients: RwLock<Vec<Patient>>,
}

impl InMemoryPatientStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PatientStore for InMemoryPatientStore {
    async fn list(&self) -> Result<Vec<Patient>, StoreError> {
        let patients = self.patients.read().map_err(|_| poisoned("patient"))?;
        Ok(patients.clone())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<Patient>, StoreError> {
        let patients = self.patients.read().map_err(|_| poisoned("patient"))?;
        Ok(patients.iter().find(|p| p.id == id).cloned())
    }

    async fn email_taken(
        &self,
        email: &str,
        excluding: Option<UserId>,
    ) -> Result<bool, StoreError> {
        let patients = self.patients.read().map_err(|_| poisoned("patient"))?;
        Ok(patients
            .iter()
            .any(|p| p.email == email && Some(p.id) != excluding))
    }

    async fn insert(&self, patient: &Patient) -> Result<(), StoreError> {
        let mut patients = self.patients.write().map_err(|_| poisoned("patient"))?;
        patients.push(patient.clone());
        Ok(())
    }

    async fn update(&self, id: UserId, changes: &PatientChanges) -> Result<bool, StoreError> {
        let mut patients = self.patients.write().map_err(|_| poisoned("patient"))?;
        match patients.iter_mut().find(|p| p.id == id) {
            Some(patient) => {
                patient.apply(changes);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        let mut patients = self.patients.write().map_err(|_| poisoned("patient"))?;
        let before = patients.len();
        patients.retain(|p| p.id != id);
        Ok(patients.len() != before)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<Vec<Profile>>,
}

impl InMemoryProfileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn list(&self) -> Result<Vec<Profile>, StoreError> {
        let profiles = self.profiles.read().map_err(|_| poisoned("profile"))?;
        Ok(profiles.clone())
    }

    async fn find_by_id(&self, id: ProfileId) -> Result<Option<Profile>, StoreError> {
        let profiles = self.profiles.read().map_err(|_| poisoned("profile"))?;
        Ok(profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn insert(&self, profile: &Profile) -> Result<(), StoreError> {
        let mut profiles = self.profiles.write().map_err(|_| poisoned("profile"))?;
        profiles.push(profile.clone());
        Ok(())
    }

    async fn update(&self, id: ProfileId, changes: &ProfileChanges) -> Result<bool, StoreError> {
        let mut profiles = self.profiles.write().map_err(|_| poisoned("profile"))?;
        match profiles.iter_mut().find(|p| p.id == id) {
            Some(profile) => {
                profile.apply(changes);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: ProfileId) -> Result<bool, StoreError> {
        let mut profiles = self.profiles.write().map_err(|_| poisoned("profile"))?;
        let before = profiles.len();
        profiles.retain(|p| p.id != id);
        Ok(profiles.len() != before)
    }
}
