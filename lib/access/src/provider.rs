//! Provider profile returned by a successful OAuth exchange.

use crate::user::ExternalId;

/// Attributes disclosed by the external identity provider.
///
/// Ephemeral: produced by an [`OAuthExchange`](crate::OAuthExchange),
/// consumed by the [`IdentityResolver`](crate::IdentityResolver), never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    external_id: ExternalId,
    account_handle: String,
    display_name: Option<String>,
    emails: Vec<String>,
}

impl ProviderProfile {
    /// Creates a profile with no display name and no emails.
    #[must_use]
    pub fn new(external_id: impl Into<String>, account_handle: impl Into<String>) -> Self {
        Self {
            external_id: ExternalId::new(external_id),
            account_handle: account_handle.into(),
            display_name: None,
            emails: Vec::new(),
        }
    }

    /// Sets the display name. Blank names are treated as absent.
    #[must_use]
    pub fn with_display_name(mut self, name: Option<String>) -> Self {
        self.display_name = name.filter(|n| !n.trim().is_empty());
        self
    }

    /// Sets the disclosed emails, most preferred first.
    #[must_use]
    pub fn with_emails(mut self, emails: Vec<String>) -> Self {
        self.emails = emails;
        self
    }

    #[must_use]
    pub fn external_id(&self) -> &ExternalId {
        &self.external_id
    }

    /// Returns the provider login handle (e.g. the GitHub username).
    #[must_use]
    pub fn account_handle(&self) -> &str {
        &self.account_handle
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    #[must_use]
    pub fn emails(&self) -> &[String] {
        &self.emails
    }

    /// Returns the first disclosed email, if any.
    #[must_use]
    pub fn primary_email(&self) -> Option<&str> {
        self.emails.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_display_name_is_absent() {
        let profile = ProviderProfile::new("1", "handle").with_display_name(Some("  ".to_string()));
        assert!(profile.display_name().is_none());
    }

    #[test]
    fn primary_email_is_first() {
        let profile = ProviderProfile::new("1", "handle")
            .with_emails(vec!["a@x.com".to_string(), "b@x.com".to_string()]);
        assert_eq!(profile.primary_email(), Some("a@x.com"));
        assert_eq!(profile.emails().len(), 2);
    }

    #[test]
    fn no_emails_means_no_primary() {
        let profile = ProviderProfile::new("1", "handle");
        assert!(profile.primary_email().is_none());
    }
}
