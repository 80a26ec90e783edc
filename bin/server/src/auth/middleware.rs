//! Authentication extractors for Axum.

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use grace_pharmacy_access::{Access, AuthenticatedUser, SessionId};
use serde_json::json;
use std::sync::Arc;

use super::AppState;
use super::routes::SESSION_COOKIE;

/// Extractor for requiring an authenticated user.
///
/// Requests without a session that resolves to a user are rejected with
/// `401 {"error":"Not authenticated"}` before the handler runs.
pub struct RequireAuth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        let session_id = jar
            .get(SESSION_COOKIE)
            .map(|cookie| SessionId::new(cookie.value().to_string()));

        match app_state.guard.check(session_id.as_ref()).await {
            Access::Allow(user) => Ok(RequireAuth(user)),
            Access::Deny => Err(AuthRejection::NotAuthenticated),
        }
    }
}

/// Rejection type for authentication extractors.
#[derive(Debug)]
pub enum AuthRejection {
    NotAuthenticated,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::NotAuthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Not authenticated" })),
            )
                .into_response(),
        }
    }
}
