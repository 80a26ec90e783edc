//! JSON API for patient users and medical profiles.
//!
//! Reads are open; every create, update and delete goes through
//! [`RequireAuth`](crate::auth::RequireAuth) before the body is looked at.

pub mod profiles;
pub mod root;
pub mod users;

use axum::{Json, Router, extract::rejection::JsonRejection, routing::get};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

use crate::auth::AppState;

pub use root::welcome;

/// Routes under `/users` and `/profiles`.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/profiles",
            get(profiles::list_profiles).post(profiles::create_profile),
        )
        .route(
            "/profiles/{id}",
            get(profiles::get_profile)
                .put(profiles::update_profile)
                .delete(profiles::delete_profile),
        )
}

/// Reads a JSON body of string fields.
///
/// Fields that are not strings are dropped so the rest of the body still
/// validates. A missing, malformed or non-object body counts as empty.
fn body_or_default<T: DeserializeOwned + Default>(body: Result<Json<Value>, JsonRejection>) -> T {
    let fields = match body {
        Ok(Json(Value::Object(fields))) => fields,
        Ok(Json(_)) => {
            debug!("request body is not a JSON object");
            return T::default();
        }
        Err(rejection) => {
            debug!(error = %rejection, "unreadable request body");
            return T::default();
        }
    };

    let strings: Map<String, Value> = fields
        .into_iter()
        .filter(|(name, value)| {
            if !value.is_string() {
                debug!(field = %name, "ignoring non-string field");
            }
            value.is_string()
        })
        .collect();

    serde_json::from_value(Value::Object(strings)).unwrap_or_else(|e| {
        debug!(error = %e, "request body does not match the expected fields");
        T::default()
    })
}
