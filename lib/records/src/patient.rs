//! Patient user records.

use chrono::{DateTime, Utc};
use grace_pharmacy_core::UserId;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::ValidationError;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Returns true if the address has the shape `local@domain.tld`.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" => Ok(Self::Male),
            "Female" => Ok(Self::Female),
            "Other" => Ok(Self::Other),
            _ => Err(ValidationError::InvalidGender),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "18-30")]
    YoungAdult,
    #[serde(rename = "31-50")]
    Adult,
    #[serde(rename = "51+")]
    Senior,
}

impl AgeGroup {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::YoungAdult => "18-30",
            Self::Adult => "31-50",
            Self::Senior => "51+",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgeGroup {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "18-30" => Ok(Self::YoungAdult),
            "31-50" => Ok(Self::Adult),
            "51+" => Ok(Self::Senior),
            _ => Err(ValidationError::InvalidAgeGroup),
        }
    }
}

/// A stored patient user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: UserId,
    pub patient_name: String,
    pub company: String,
    pub position: String,
    pub gender: Gender,
    pub age_group: AgeGroup,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl Patient {
    /// Creates a patient from a validated request with a fresh id.
    #[must_use]
    pub fn new(draft: NewPatient) -> Self {
        Self {
            id: UserId::new(),
            patient_name: draft.patient_name,
            company: draft.company,
            position: draft.position,
            gender: draft.gender,
            age_group: draft.age_group,
            email: draft.email,
            created_at: Utc::now(),
        }
    }

    /// Applies a validated partial update.
    pub fn apply(&mut self, changes: &PatientChanges) {
        if let Some(v) = &changes.patient_name {
            self.patient_name.clone_from(v);
        }
        if let Some(v) = &changes.company {
            self.company.clone_from(v);
        }
        if let Some(v) = &changes.position {
            self.position.clone_from(v);
        }
        if let Some(v) = changes.gender {
            self.gender = v;
        }
        if let Some(v) = changes.age_group {
            self.age_group = v;
        }
        if let Some(v) = &changes.email {
            self.email.clone_from(v);
        }
    }
}

/// Request body for creating or updating a patient.
///
/// Empty strings count as absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInput {
    pub patient_name: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub gender: Option<String>,
    pub age_group: Option<String>,
    pub email: Option<String>,
}

/// A fully validated create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPatient {
    pub patient_name: String,
    pub company: String,
    pub position: String,
    pub gender: Gender,
    pub age_group: AgeGroup,
    pub email: String,
}

/// A validated partial update. At least one field is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientChanges {
    pub patient_name: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub gender: Option<Gender>,
    pub age_group: Option<AgeGroup>,
    pub email: Option<String>,
}

fn present(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.is_empty())
}

fn checked_email(email: String) -> Result<String, ValidationError> {
    if is_valid_email(&email) {
        Ok(email)
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

impl PatientInput {
    /// Validates a create request.
    ///
    /// # Errors
    ///
    /// Checks run in order: all fields present, email shape, gender, age group.
    pub fn into_new(self) -> Result<NewPatient, ValidationError> {
        let (
            Some(patient_name),
            Some(company),
            Some(position),
            Some(gender),
            Some(age_group),
            Some(email),
        ) = (
            present(self.patient_name),
            present(self.company),
            present(self.position),
            present(self.gender),
            present(self.age_group),
            present(self.email),
        )
        else {
            return Err(ValidationError::MissingFields);
        };

        let email = checked_email(email)?;
        let gender = gender.parse()?;
        let age_group = age_group.parse()?;

        Ok(NewPatient {
            patient_name,
            company,
            position,
            gender,
            age_group,
            email,
        })
    }

    /// Validates an update request.
    ///
    /// # Errors
    ///
    /// Invalid gender, age group or email, or no field provided.
    pub fn into_changes(self) -> Result<PatientChanges, ValidationError> {
        let changes = PatientChanges {
            patient_name: present(self.patient_name),
            company: present(self.company),
            position: present(self.position),
            gender: present(self.gender).map(|g| g.parse()).transpose()?,
            age_group: present(self.age_group).map(|a| a.parse()).transpose()?,
            email: present(self.email).map(checked_email).transpose()?,
        };

        if changes == PatientChanges::default() {
            return Err(ValidationError::NoChanges);
        }
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_input() -> PatientInput {
        PatientInput {
            patient_name: Some("Jane Doe".to_string()),
            company: Some("Acme".to_string()),
            position: Some("Engineer".to_string()),
            gender: Some("Female".to_string()),
            age_group: Some("31-50".to_string()),
            email: Some("jane@acme.com".to_string()),
        }
    }

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("@c.com"));
    }

    #[test]
    fn valid_create_request() {
        let new = complete_input().into_new().unwrap();
        assert_eq!(new.gender, Gender::Female);
        assert_eq!(new.age_group, AgeGroup::Adult);
        assert_eq!(new.email, "jane@acme.com");
    }

    #[test]
    fn create_requires_every_field() {
        let mut input = complete_input();
        input.company = Some(String::new());
        assert_eq!(input.into_new(), Err(ValidationError::MissingFields));

        let mut input = complete_input();
        input.email = None;
        assert_eq!(input.into_new(), Err(ValidationError::MissingFields));
    }

    #[test]
    fn create_checks_email_before_enums() {
        let mut input = complete_input();
        input.email = Some("not-an-email".to_string());
        input.gender = Some("Unknown".to_string());
        assert_eq!(input.into_new(), Err(ValidationError::InvalidEmail));
    }

    #[test]
    fn create_rejects_unknown_gender_and_age_group() {
        let mut input = complete_input();
        input.gender = Some("male".to_string());
        assert_eq!(input.into_new(), Err(ValidationError::InvalidGender));

        let mut input = complete_input();
        input.age_group = Some("65+".to_string());
        assert_eq!(input.into_new(), Err(ValidationError::InvalidAgeGroup));
    }

    #[test]
    fn update_needs_a_field() {
        assert_eq!(
            PatientInput::default().into_changes(),
            Err(ValidationError::NoChanges)
        );
        let blank = PatientInput {
            company: Some(String::new()),
            ..PatientInput::default()
        };
        assert_eq!(blank.into_changes(), Err(ValidationError::NoChanges));
    }

    #[test]
    fn update_validates_supplied_fields_only() {
        let input = PatientInput {
            age_group: Some("51+".to_string()),
            ..PatientInput::default()
        };
        let changes = input.into_changes().unwrap();
        assert_eq!(changes.age_group, Some(AgeGroup::Senior));
        assert!(changes.email.is_none());

        let input = PatientInput {
            email: Some("bad".to_string()),
            ..PatientInput::default()
        };
        assert_eq!(input.into_changes(), Err(ValidationError::InvalidEmail));
    }

    #[test]
    fn apply_changes_only_set_fields() {
        let mut patient = Patient::new(complete_input().into_new().unwrap());
        let changes = PatientChanges {
            position: Some("Manager".to_string()),
            gender: Some(Gender::Other),
            ..PatientChanges::default()
        };

        patient.apply(&changes);

        assert_eq!(patient.position, "Manager");
        assert_eq!(patient.gender, Gender::Other);
        assert_eq!(patient.patient_name, "Jane Doe");
    }

    #[test]
    fn serializes_with_api_field_names() {
        let patient = Patient::new(complete_input().into_new().unwrap());
        let json = serde_json::to_value(&patient).unwrap();
        assert_eq!(json["patientName"], "Jane Doe");
        assert_eq!(json["ageGroup"], "31-50");
        assert_eq!(json["gender"], "Female");
        assert!(json.get("createdAt").is_some());
    }
}
