//! HTTP error boundary.
//!
//! Handlers return [`ApiError`]; its `IntoResponse` impl logs the detail and
//! answers with a JSON body of the form `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use grace_pharmacy_records::ValidationError;
use serde_json::json;
use std::any::Any;
use std::fmt;

/// Message returned when a handler panics.
pub const PANIC_MESSAGE: &str = "Something went wrong!";

/// Errors surfaced by API handlers.
#[derive(Debug)]
pub enum ApiError {
    /// The request failed validation.
    BadRequest(String),
    /// The addressed record does not exist.
    NotFound(&'static str),
    /// A store operation failed. `message` is returned to the client,
    /// `details` only logged.
    Internal {
        message: &'static str,
        details: String,
    },
}

impl ApiError {
    /// Builds an internal error from any displayable cause.
    pub fn internal(message: &'static str, cause: impl fmt::Display) -> Self {
        Self::Internal {
            message,
            details: cause.to_string(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest(message) => write!(f, "bad request: {message}"),
            Self::NotFound(message) => write!(f, "not found: {message}"),
            Self::Internal { message, details } => write!(f, "{message}: {details}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message.to_string()),
            Self::Internal { message, details } => {
                tracing::error!(%details, "{message}");
                (StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Response for a panicking handler, used with `CatchPanicLayer`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let details = panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_default();
    tracing::error!(%details, "handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": PANIC_MESSAGE })),
    )
        .into_response()
}
