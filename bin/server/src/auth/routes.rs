//! Authentication routes for login, callback, logout and the dashboard.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use grace_pharmacy_access::{CallbackParams, PendingLogin, SessionId};
use serde_json::json;
use std::sync::Arc;
use time::Duration as TimeDuration;
use tracing::{debug, info, warn};

use super::{AppState, RequireAuth};

/// Session cookie name.
pub(crate) const SESSION_COOKIE: &str = "session";

/// Auth state cookie name (CSRF token and PKCE verifier during the OAuth flow).
const AUTH_STATE_COOKIE: &str = "auth_state";

/// Initiates the GitHub login flow by redirecting to the authorization page.
pub async fn github_login(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let initiation = state.login.begin();

    let auth_state_json = match serde_json::to_string(&initiation.pending) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "failed to encode auth state");
            return Redirect::to("/").into_response();
        }
    };

    let cookie = Cookie::build((AUTH_STATE_COOKIE, auth_state_json))
        .path("/")
        .http_only(true)
        .secure(state.session_config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(10));

    (jar.add(cookie), Redirect::to(&initiation.authorization_url)).into_response()
}

/// Handles the callback after the user authorizes the application on GitHub.
///
/// Any failure sends the user back to `/` without a session. A session the
/// browser already held is replaced.
pub async fn github_callback(
    State(state): State<Arc<AppState>>,
    params: Result<Query<CallbackParams>, QueryRejection>,
    jar: CookieJar,
) -> impl IntoResponse {
    let pending: Option<PendingLogin> = jar
        .get(AUTH_STATE_COOKIE)
        .and_then(|cookie| serde_json::from_str(cookie.value()).ok());

    let remove_auth_state = Cookie::build((AUTH_STATE_COOKIE, ""))
        .path("/")
        .max_age(TimeDuration::ZERO);
    let jar = jar.add(remove_auth_state);

    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => {
            warn!(error = %rejection, "malformed OAuth callback");
            return (jar, Redirect::to("/"));
        }
    };

    let outcome = match state.login.complete(&params, pending.as_ref()).await {
        Ok(outcome) => outcome,
        Err(e) => {
            debug!(error = %e, "redirecting home after failed login");
            return (jar, Redirect::to("/"));
        }
    };

    if let Some(previous) = jar.get(SESSION_COOKIE) {
        let previous = SessionId::new(previous.value().to_string());
        if let Err(e) = state.login.logout(&previous).await {
            warn!(error = %e, "failed to delete replaced session");
        }
    }

    let session_cookie = Cookie::build((
        SESSION_COOKIE,
        outcome.session.id().as_str().to_string(),
    ))
    .path("/")
    .http_only(true)
    .secure(state.session_config.secure_cookies)
    .same_site(SameSite::Lax)
    .max_age(TimeDuration::minutes(state.session_config.duration_minutes));

    (jar.add(session_cookie), Redirect::to("/dashboard"))
}

/// Logs out the user by deleting their session.
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    if let Some(session_cookie) = jar.get(SESSION_COOKIE) {
        let session_id = SessionId::new(session_cookie.value().to_string());
        if let Err(e) = state.login.logout(&session_id).await {
            warn!(error = %e, "failed to delete session on logout");
        }
    }

    let remove_session = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(TimeDuration::ZERO);

    (jar.add(remove_session), Redirect::to("/"))
}

/// Greets the signed-in user.
pub async fn dashboard(RequireAuth(auth): RequireAuth) -> impl IntoResponse {
    info!(user_id = %auth.user().id(), "dashboard visited");
    Json(json!({
        "message": format!("Welcome, {}!", auth.user().display_name()),
    }))
}
