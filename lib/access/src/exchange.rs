//! OAuth exchange adapter interface.
//!
//! An adapter performs the provider-specific half of the three-legged
//! handshake: building the authorization redirect and turning an
//! authorization code into a [`ProviderProfile`].

use async_trait::async_trait;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};

use crate::error::AuthenticationError;
use crate::provider::ProviderProfile;

/// State kept by the browser between the redirect and the callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLogin {
    pub csrf_token: String,
    pub pkce_verifier: String,
}

/// Where to send the user agent, and what to remember until it returns.
#[derive(Debug, Clone)]
pub struct LoginInitiation {
    pub authorization_url: String,
    pub pending: PendingLogin,
}

/// Query parameters the provider appends to the callback URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by the provider when the user denied access.
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Validates the callback against the pending login and returns the code.
    ///
    /// # Errors
    ///
    /// `ExchangeFailed` when the provider reported an error, the callback is
    /// missing fields, no login is pending, or the state does not match.
    pub fn authorization_code(
        &self,
        pending: Option<&PendingLogin>,
    ) -> Result<&str, AuthenticationError> {
        if let Some(error) = &self.error {
            let description = self.error_description.as_deref().unwrap_or("");
            return Err(AuthenticationError::exchange(format!(
                "provider returned '{error}' {description}"
            )));
        }

        let pending =
            pending.ok_or_else(|| AuthenticationError::exchange("no login in progress"))?;
        let code = self
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AuthenticationError::exchange("callback missing code"))?;
        let state = self
            .state
            .as_deref()
            .ok_or_else(|| AuthenticationError::exchange("callback missing state"))?;

        if state != pending.csrf_token {
            return Err(AuthenticationError::exchange("CSRF state mismatch"));
        }

        Ok(code)
    }
}

/// Provider-specific OAuth handshake.
#[async_trait]
pub trait OAuthExchange: Send + Sync {
    /// Builds the authorization redirect. The requested scopes always
    /// include email disclosure.
    fn initiate(&self) -> LoginInitiation;

    /// Exchanges an authorization code for the user's provider profile.
    async fn complete(
        &self,
        code: &str,
        pending: &PendingLogin,
    ) -> Result<ProviderProfile, Report<AuthenticationError>>;
}
