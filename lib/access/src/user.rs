//! Local user domain type.
//!
//! A `LocalUser` is the durable record kept for each distinct external
//! identity. It is created on the first successful login for an external id
//! and never modified by the login path afterwards.

use chrono::{DateTime, Utc};
use grace_pharmacy_core::IdentityId;
use serde::{Deserialize, Serialize};

use crate::provider::ProviderProfile;

/// Email stored when the provider discloses no address.
pub const PLACEHOLDER_EMAIL: &str = "no-email@github.com";

/// Identifier of a user within the external identity provider's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalId(String);

impl ExternalId {
    /// Creates an external id from the provider's identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the external id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExternalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExternalId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The locally stored record of an authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalUser {
    /// Store identifier, assigned before the record is inserted.
    id: IdentityId,
    /// Identifier in the provider's namespace. Unique and immutable.
    external_id: ExternalId,
    /// Human-readable name.
    display_name: String,
    /// Email address, or [`PLACEHOLDER_EMAIL`].
    email: String,
    /// When the record was created.
    created_at: DateTime<Utc>,
}

impl LocalUser {
    /// Builds a new record from a provider profile.
    ///
    /// The display name falls back to the account handle and the email falls
    /// back to [`PLACEHOLDER_EMAIL`].
    #[must_use]
    pub fn from_profile(profile: &ProviderProfile) -> Self {
        let display_name = profile
            .display_name()
            .unwrap_or_else(|| profile.account_handle())
            .to_string();
        let email = profile
            .primary_email()
            .unwrap_or(PLACEHOLDER_EMAIL)
            .to_string();

        Self {
            id: IdentityId::new(),
            external_id: profile.external_id().clone(),
            display_name,
            email,
            created_at: Utc::now(),
        }
    }

    /// Creates a user with all fields specified.
    ///
    /// Use this when reconstituting a user from storage.
    #[must_use]
    pub fn with_all_fields(
        id: IdentityId,
        external_id: ExternalId,
        display_name: String,
        email: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            external_id,
            display_name,
            email,
            created_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> IdentityId {
        self.id
    }

    #[must_use]
    pub fn external_id(&self) -> &ExternalId {
        &self.external_id
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_profile_uses_supplied_fields() {
        let profile = ProviderProfile::new("583231", "octocat")
            .with_display_name(Some("The Octocat".to_string()))
            .with_emails(vec!["octocat@github.com".to_string()]);

        let user = LocalUser::from_profile(&profile);

        assert_eq!(user.external_id().as_str(), "583231");
        assert_eq!(user.display_name(), "The Octocat");
        assert_eq!(user.email(), "octocat@github.com");
    }

    #[test]
    fn from_profile_falls_back_to_handle_and_placeholder() {
        let profile = ProviderProfile::new("583231", "octocat");

        let user = LocalUser::from_profile(&profile);

        assert_eq!(user.display_name(), "octocat");
        assert_eq!(user.email(), "no-email@github.com");
    }

    #[test]
    fn from_profile_sets_creation_time() {
        let before = Utc::now();
        let user = LocalUser::from_profile(&ProviderProfile::new("1", "a"));
        let after = Utc::now();

        assert!(user.created_at() >= before);
        assert!(user.created_at() <= after);
    }

    #[test]
    fn with_all_fields_preserves_values() {
        let id = IdentityId::new();
        let created = Utc::now() - chrono::Duration::days(3);
        let user = LocalUser::with_all_fields(
            id,
            ExternalId::new("gh-42"),
            "Alice".to_string(),
            "a@x.com".to_string(),
            created,
        );

        assert_eq!(user.id(), id);
        assert_eq!(user.external_id(), &ExternalId::from("gh-42"));
        assert_eq!(user.display_name(), "Alice");
        assert_eq!(user.email(), "a@x.com");
        assert_eq!(user.created_at(), created);
    }

    #[test]
    fn serializes_camel_case() {
        let user = LocalUser::from_profile(&ProviderProfile::new("7", "seven"));
        let json = serde_json::to_value(&user).expect("serialize");

        assert_eq!(json["externalId"], "7");
        assert_eq!(json["displayName"], "seven");
        assert!(json.get("createdAt").is_some());
    }
}
