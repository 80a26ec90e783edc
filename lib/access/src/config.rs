//! GitHub OAuth configuration.
//!
//! Loaded from the environment by the server (`GITHUB__CLIENT_ID`,
//! `GITHUB__CLIENT_SECRET`, `GITHUB__CALLBACK_URL`, optional `GITHUB__SCOPES`).

use serde::{Deserialize, Serialize};

/// Scope that lets the application read the user's email addresses.
pub const EMAIL_SCOPE: &str = "user:email";

/// Configuration for the GitHub OAuth application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubOAuthConfig {
    /// The OAuth App client ID.
    client_id: String,
    /// The OAuth App client secret.
    client_secret: String,
    /// The registered callback URL (e.g. "https://api.example.com/github/callback").
    callback_url: String,
    /// Scopes to request as a comma-separated string.
    /// Default: "user:email"
    #[serde(default = "default_scopes")]
    scopes: String,
}

fn default_scopes() -> String {
    EMAIL_SCOPE.to_string()
}

impl GitHubOAuthConfig {
    #[must_use]
    pub fn new(client_id: String, client_secret: String, callback_url: String) -> Self {
        Self {
            client_id,
            client_secret,
            callback_url,
            scopes: default_scopes(),
        }
    }

    /// Adds a scope to request, ignoring duplicates.
    #[must_use]
    pub fn add_scope(mut self, scope: &str) -> Self {
        if !self.scopes().contains(&scope) {
            self.scopes = format!("{},{scope}", self.scopes);
        }
        self
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    #[must_use]
    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    /// Returns the scopes to request.
    ///
    /// [`EMAIL_SCOPE`] is always included, whatever was configured.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        let mut scopes: Vec<&str> = self
            .scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if !scopes.contains(&EMAIL_SCOPE) {
            scopes.push(EMAIL_SCOPE);
        }
        scopes
    }
}
