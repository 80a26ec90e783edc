//! Patient medical profiles.

use chrono::{DateTime, Utc};
use grace_pharmacy_core::ProfileId;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A stored medical profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: ProfileId,
    pub chronic_medication: String,
    pub allergies: String,
    pub next_of_kin: String,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    #[must_use]
    pub fn new(draft: NewProfile) -> Self {
        Self {
            id: ProfileId::new(),
            chronic_medication: draft.chronic_medication,
            allergies: draft.allergies,
            next_of_kin: draft.next_of_kin,
            phone_number: draft.phone_number,
            created_at: Utc::now(),
        }
    }

    pub fn apply(&mut self, changes: &ProfileChanges) {
        if let Some(v) = &changes.chronic_medication {
            self.chronic_medication.clone_from(v);
        }
        if let Some(v) = &changes.allergies {
            self.allergies.clone_from(v);
        }
        if let Some(v) = &changes.next_of_kin {
            self.next_of_kin.clone_from(v);
        }
        if let Some(v) = &changes.phone_number {
            self.phone_number.clone_from(v);
        }
    }
}

/// Request body for creating or updating a profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInput {
    pub chronic_medication: Option<String>,
    pub allergies: Option<String>,
    pub next_of_kin: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
    pub chronic_medication: String,
    pub allergies: String,
    pub next_of_kin: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub chronic_medication: Option<String>,
    pub allergies: Option<String>,
    pub next_of_kin: Option<String>,
    pub phone_number: Option<String>,
}

fn present(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.is_empty())
}

impl ProfileInput {
    /// Validates a create request.
    ///
    /// # Errors
    ///
    /// `MissingFields` if any field is absent or empty.
    pub fn into_new(self) -> Result<NewProfile, ValidationError> {
        let (Some(chronic_medication), Some(allergies), Some(next_of_kin), Some(phone_number)) = (
            present(self.chronic_medication),
            present(self.allergies),
            present(self.next_of_kin),
            present(self.phone_number),
        ) else {
            return Err(ValidationError::MissingFields);
        };

        Ok(NewProfile {
            chronic_medication,
            allergies,
            next_of_kin,
            phone_number,
        })
    }

    /// Validates an update request.
    ///
    /// # Errors
    ///
    /// `NoChanges` if no field carries a value.
    pub fn into_changes(self) -> Result<ProfileChanges, ValidationError> {
        let changes = ProfileChanges {
            chronic_medication: present(self.chronic_medication),
            allergies: present(self.allergies),
            next_of_kin: present(self.next_of_kin),
            phone_number: present(self.phone_number),
        };
        if changes == ProfileChanges::default() {
            return Err(ValidationError::NoChanges);
        }
        Ok(changes)
    }
}
