//! Patient user handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use grace_pharmacy_core::UserId;
use grace_pharmacy_records::{Patient, PatientInput, ValidationError};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use super::body_or_default;
use crate::auth::{AppState, RequireAuth};
use crate::error::ApiError;

const NOT_FOUND: &str = "User not found";

/// Ids that do not parse cannot match a stored user.
fn parse_id(raw: &str) -> Result<UserId, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound(NOT_FOUND))
}

pub async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Patient>>, ApiError> {
    let patients = state
        .patients
        .list()
        .await
        .map_err(|e| ApiError::internal("Failed to fetch users", e))?;
    Ok(Json(patients))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    let id = parse_id(&id)?;
    state
        .patients
        .find_by_id(id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch user", e))?
        .map(Json)
        .ok_or(ApiError::NotFound(NOT_FOUND))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let draft = body_or_default::<PatientInput>(body).into_new()?;

    let taken = state
        .patients
        .email_taken(&draft.email, None)
        .await
        .map_err(|e| ApiError::internal("Failed to create user", e))?;
    if taken {
        return Err(ValidationError::DuplicateEmail.into());
    }

    let patient = Patient::new(draft);
    state
        .patients
        .insert(&patient)
        .await
        .map_err(|e| ApiError::internal("Failed to create user", e))?;

    info!(user_id = %patient.id, by = %auth.user().id(), "patient user created");
    Ok((StatusCode::CREATED, Json(json!({ "id": patient.id }))))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let changes = body_or_default::<PatientInput>(body).into_changes()?;

    if let Some(email) = &changes.email {
        let taken = state
            .patients
            .email_taken(email, Some(id))
            .await
            .map_err(|e| ApiError::internal("Failed to update user", e))?;
        if taken {
            return Err(ValidationError::DuplicateEmail.into());
        }
    }

    let updated = state
        .patients
        .update(id, &changes)
        .await
        .map_err(|e| ApiError::internal("Failed to update user", e))?;
    if !updated {
        return Err(ApiError::NotFound(NOT_FOUND));
    }

    info!(user_id = %id, by = %auth.user().id(), "patient user updated");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let deleted = state
        .patients
        .delete(id)
        .await
        .map_err(|e| ApiError::internal("Failed to delete user", e))?;
    if !deleted {
        return Err(ApiError::NotFound(NOT_FOUND));
    }

    info!(user_id = %id, by = %auth.user().id(), "patient user deleted");
    Ok(StatusCode::NO_CONTENT)
}
