//! Grace Pharmacy API server.
//!
//! This crate wires the access and records libraries into an axum
//! application: GitHub login, guarded JSON endpoints for patient users and
//! medical profiles, and PostgreSQL repositories behind them.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;

#[cfg(test)]
pub(crate) mod test_support;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::auth::AppState;

/// Builds the application router.
///
/// CORS is left to the caller since it depends on deployment configuration.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(api::welcome))
        .route("/github", get(auth::github_login))
        .route("/github/callback", get(auth::github_callback))
        .route("/logout", get(auth::logout))
        .route("/dashboard", get(auth::dashboard))
        .merge(api::router())
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
