//! Router fixtures shared by handler tests.

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, Response, header},
};
use grace_pharmacy_access::{
    AuthenticationError, InMemoryIdentityStore, InMemorySessionStore, LoginInitiation,
    OAuthExchange, PendingLogin, ProviderProfile,
};
use grace_pharmacy_records::{InMemoryPatientStore, InMemoryProfileStore};
use rootcause::prelude::Report;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use crate::auth::AppState;
use crate::config::SessionConfig;

/// Exchange that returns a fixed profile, or fails when none is given.
pub struct StubExchange {
    profile: Option<ProviderProfile>,
}

#[async_trait]
impl OAuthExchange for StubExchange {
    fn initiate(&self) -> LoginInitiation {
        LoginInitiation {
            authorization_url:
                "https://github.com/login/oauth/authorize?scope=user%3Aemail&state=csrf"
                    .to_string(),
            pending: PendingLogin {
                csrf_token: "csrf".to_string(),
                pkce_verifier: "verifier".to_string(),
            },
        }
    }

    async fn complete(
        &self,
        _code: &str,
        _pending: &PendingLogin,
    ) -> Result<ProviderProfile, Report<AuthenticationError>> {
        match &self.profile {
            Some(profile) => Ok(profile.clone()),
            None => Err(AuthenticationError::exchange("bad_verification_code").into()),
        }
    }
}

/// The full router over in-memory stores.
pub struct TestApp {
    router: Router,
}

impl TestApp {
    pub fn new(profile: Option<ProviderProfile>) -> Self {
        let state = AppState::new(
            Arc::new(InMemoryIdentityStore::new()),
            Arc::new(InMemorySessionStore::new()),
            Arc::new(StubExchange { profile }),
            Arc::new(InMemoryPatientStore::new()),
            Arc::new(InMemoryProfileStore::new()),
            SessionConfig::default(),
        );
        Self {
            router: crate::router(Arc::new(state)),
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        self.send(Method::GET, uri, cookie, None).await
    }

    /// Runs the login redirect and callback, returning the session cookie
    /// pair (`session=<id>`) if one was issued.
    pub async fn login(&self) -> Option<String> {
        let redirect = self.get("/github", None).await;
        let auth_state = Self::cookie(&redirect, "auth_state")?;

        let callback = self
            .get("/github/callback?code=abc&state=csrf", Some(&auth_state))
            .await;
        Self::cookie(&callback, "session")
    }

    /// Returns the `name=value` pair of a non-empty `Set-Cookie` header.
    pub fn cookie(response: &Response<Body>, name: &str) -> Option<String> {
        let prefix = format!("{name}=");
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| value.split(';').next())
            .find(|pair| pair.starts_with(&prefix) && pair.len() > prefix.len())
            .map(str::to_string)
    }
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
