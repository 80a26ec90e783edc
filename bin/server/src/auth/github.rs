//! GitHub OAuth exchange.
//!
//! Implements the provider half of the login flow:
//! - builds the `https://github.com/login/oauth/authorize` redirect with a
//!   CSRF state and a PKCE challenge
//! - exchanges the authorization code for an access token
//! - reads `/user` and `/user/emails` from the REST API into a
//!   [`ProviderProfile`]

use async_trait::async_trait;
use grace_pharmacy_access::{
    AuthenticationError, GitHubOAuthConfig, LoginInitiation, OAuthExchange, PendingLogin,
    ProviderProfile,
};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EmptyExtraTokenFields,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, StandardTokenResponse, TokenResponse,
    TokenUrl,
    basic::{BasicClient, BasicTokenType},
};
use rootcause::prelude::Report;
use serde::Deserialize;
use std::fmt;
use tracing::{debug, instrument, warn};

/// GitHub OAuth authorization URL.
const GITHUB_AUTH_URL: &str = "https://github.com/login/oauth/authorize";

/// GitHub OAuth token URL.
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

/// GitHub REST API base URL.
const GITHUB_API_URL: &str = "https://api.github.com";

/// GitHub rejects API requests without a User-Agent.
const USER_AGENT: &str = concat!("grace-pharmacy-api/", env!("CARGO_PKG_VERSION"));

type GitHubTokenResponse = StandardTokenResponse<EmptyExtraTokenFields, BasicTokenType>;

/// GitHub OAuth client.
#[derive(Clone)]
pub struct GitHubExchange {
    config: GitHubOAuthConfig,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    redirect_url: RedirectUrl,
    api_url: String,
    http_client: reqwest::Client,
}

impl GitHubExchange {
    /// Creates a GitHub client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the callback URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: GitHubOAuthConfig) -> Result<Self, GitHubSetupError> {
        let auth_url = AuthUrl::new(GITHUB_AUTH_URL.to_string())
            .map_err(|e| GitHubSetupError::invalid_url(GITHUB_AUTH_URL, e))?;
        let token_url = TokenUrl::new(GITHUB_TOKEN_URL.to_string())
            .map_err(|e| GitHubSetupError::invalid_url(GITHUB_TOKEN_URL, e))?;
        let redirect_url = RedirectUrl::new(config.callback_url().to_string())
            .map_err(|e| GitHubSetupError::invalid_url(config.callback_url(), e))?;

        // Following redirects on the token endpoint would expose the code.
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| GitHubSetupError::HttpClient {
                details: e.to_string(),
            })?;

        Ok(Self {
            config,
            auth_url,
            token_url,
            redirect_url,
            api_url: GITHUB_API_URL.to_string(),
            http_client,
        })
    }

    async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<String, AuthenticationError> {
        let client = BasicClient::new(ClientId::new(self.config.client_id().to_string()))
            .set_client_secret(ClientSecret::new(self.config.client_secret().to_string()))
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let token: GitHubTokenResponse = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_string()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| AuthenticationError::exchange(format!("token exchange failed: {e}")))?;

        Ok(token.access_token().secret().clone())
    }

    async fn fetch_user(&self, access_token: &str) -> Result<GitHubUser, AuthenticationError> {
        self.http_client
            .get(format!("{}/user", self.api_url))
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| AuthenticationError::exchange(format!("profile request failed: {e}")))?
            .json()
            .await
            .map_err(|e| AuthenticationError::exchange(format!("invalid profile response: {e}")))
    }

    /// Lists the account's email addresses. Missing scope or a failed request
    /// yields an empty list.
    async fn fetch_emails(&self, access_token: &str) -> Vec<GitHubEmail> {
        let response = self
            .http_client
            .get(format!("{}/user/emails", self.api_url))
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);

        let result = match response {
            Ok(response) => response.json().await,
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| {
            warn!(error = %e, "could not list GitHub emails");
            Vec::new()
        })
    }
}

#[async_trait]
impl OAuthExchange for GitHubExchange {
    fn initiate(&self) -> LoginInitiation {
        let client = BasicClient::new(ClientId::new(self.config.client_id().to_string()))
            .set_client_secret(ClientSecret::new(self.config.client_secret().to_string()))
            .set_auth_uri(self.auth_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (auth_url, csrf_token) = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(
                self.config
                    .scopes()
                    .into_iter()
                    .map(|scope| Scope::new(scope.to_string())),
            )
            .set_pkce_challenge(pkce_challenge)
            .url();

        LoginInitiation {
            authorization_url: auth_url.to_string(),
            pending: PendingLogin {
                csrf_token: csrf_token.secret().clone(),
                pkce_verifier: pkce_verifier.secret().clone(),
            },
        }
    }

    #[instrument(skip_all)]
    async fn complete(
        &self,
        code: &str,
        pending: &PendingLogin,
    ) -> Result<ProviderProfile, Report<AuthenticationError>> {
        let access_token = self.exchange_code(code, &pending.pkce_verifier).await?;
        let user = self.fetch_user(&access_token).await?;
        let emails = self.fetch_emails(&access_token).await;
        debug!(login = %user.login, email_count = emails.len(), "fetched GitHub profile");
        Ok(into_provider_profile(user, emails))
    }
}

/// `GET /user` response fields we use.
#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: u64,
    login: String,
    name: Option<String>,
    /// Public email, if the user chose to publish one.
    email: Option<String>,
}

/// One entry of `GET /user/emails`.
#[derive(Debug, Deserialize)]
struct GitHubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

/// Builds the provider profile. Emails are ordered primary first, then
/// verified; the public profile email comes last if not already listed.
fn into_provider_profile(user: GitHubUser, mut emails: Vec<GitHubEmail>) -> ProviderProfile {
    emails.sort_by_key(|e| (!e.primary, !e.verified));
    let mut addresses: Vec<String> = emails.into_iter().map(|e| e.email).collect();
    if let Some(public) = user.email.filter(|e| !e.is_empty()) {
        if !addresses.contains(&public) {
            addresses.push(public);
        }
    }

    ProviderProfile::new(user.id.to_string(), user.login)
        .with_display_name(user.name)
        .with_emails(addresses)
}

/// Errors building the GitHub client at start-up.
#[derive(Debug)]
pub enum GitHubSetupError {
    InvalidUrl { url: String, reason: String },
    HttpClient { details: String },
}

impl GitHubSetupError {
    fn invalid_url(url: &str, reason: impl fmt::Display) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for GitHubSetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl { url, reason } => write!(f, "invalid URL '{url}': {reason}"),
            Self::HttpClient { details } => write!(f, "failed to build HTTP client: {details}"),
        }
    }
}

impl std::error::Error for GitHubSetupError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(callback_url: &str) -> GitHubOAuthConfig {
        GitHubOAuthConfig::new(
            "client-123".to_string(),
            "secret".to_string(),
            callback_url.to_string(),
        )
    }

    fn email(address: &str, primary: bool, verified: bool) -> GitHubEmail {
        GitHubEmail {
            email: address.to_string(),
            primary,
            verified,
        }
    }

    fn user(email: Option<&str>) -> GitHubUser {
        GitHubUser {
            id: 583231,
            login: "octocat".to_string(),
            name: Some("The Octocat".to_string()),
            email: email.map(str::to_string),
        }
    }

    #[test]
    fn authorization_url_requests_email_scope_with_pkce() {
        let exchange = GitHubExchange::new(config("http://localhost:3000/github/callback")).unwrap();

        let initiation = exchange.initiate();

        let url = &initiation.authorization_url;
        assert!(url.starts_with(GITHUB_AUTH_URL));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("scope=user%3Aemail"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains(&format!("state={}", initiation.pending.csrf_token)));
        assert!(!initiation.pending.pkce_verifier.is_empty());
    }

    #[test]
    fn each_login_gets_fresh_state() {
        let exchange = GitHubExchange::new(config("http://localhost:3000/github/callback")).unwrap();
        assert_ne!(
            exchange.initiate().pending.csrf_token,
            exchange.initiate().pending.csrf_token
        );
    }

    #[test]
    fn invalid_callback_url_is_rejected() {
        let result = GitHubExchange::new(config("not a url"));
        assert!(matches!(result, Err(GitHubSetupError::InvalidUrl { .. })));
    }

    #[test]
    fn primary_email_comes_first() {
        let emails = vec![
            email("old@example.com", false, false),
            email("work@example.com", false, true),
            email("octocat@github.com", true, true),
        ];

        let profile = into_provider_profile(user(None), emails);

        assert_eq!(profile.external_id().as_str(), "583231");
        assert_eq!(profile.display_name(), Some("The Octocat"));
        assert_eq!(
            profile.emails(),
            ["octocat@github.com", "work@example.com", "old@example.com"]
        );
    }

    #[test]
    fn public_email_used_when_list_is_empty() {
        let profile = into_provider_profile(user(Some("public@example.com")), Vec::new());
        assert_eq!(profile.primary_email(), Some("public@example.com"));
    }

    #[test]
    fn public_email_not_duplicated() {
        let profile = into_provider_profile(
            user(Some("octocat@github.com")),
            vec![email("octocat@github.com", true, true)],
        );
        assert_eq!(profile.emails().len(), 1);
    }
}
