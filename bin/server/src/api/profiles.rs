//! Medical profile handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use grace_pharmacy_core::ProfileId;
use grace_pharmacy_records::{Profile, ProfileInput};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use super::body_or_default;
use crate::auth::{AppState, RequireAuth};
use crate::error::ApiError;

const NOT_FOUND: &str = "Profile not found";

fn parse_id(raw: &str) -> Result<ProfileId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest("Invalid ID format".to_string()))
}

pub async fn list_profiles(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Profile>>, ApiError> {
    let profiles = state
        .profiles
        .list()
        .await
        .map_err(|e| ApiError::internal("Failed to fetch profiles", e))?;
    Ok(Json(profiles))
}

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Profile>, ApiError> {
    let id = parse_id(&id)?;
    state
        .profiles
        .find_by_id(id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch profile", e))?
        .map(Json)
        .ok_or(ApiError::NotFound(NOT_FOUND))
}

pub async fn create_profile(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let profile = Profile::new(body_or_default::<ProfileInput>(body).into_new()?);
    state
        .profiles
        .insert(&profile)
        .await
        .map_err(|e| ApiError::internal("Failed to create profile", e))?;

    info!(profile_id = %profile.id, by = %auth.user().id(), "profile created");
    Ok((StatusCode::CREATED, Json(json!({ "id": profile.id }))))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let changes = body_or_default::<ProfileInput>(body).into_changes()?;

    let updated = state
        .profiles
        .update(id, &changes)
        .await
        .map_err(|e| ApiError::internal("Failed to update profile", e))?;
    if !updated {
        return Err(ApiError::NotFound(NOT_FOUND));
    }

    info!(profile_id = %id, by = %auth.user().id(), "profile updated");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_profile(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let deleted = state
        .profiles
        .delete(id)
        .await
        .map_err(|e| ApiError::internal("Failed to delete profile", e))?;
    if !deleted {
        return Err(ApiError::NotFound(NOT_FOUND));
    }

    info!(profile_id = %id, by = %auth.user().id(), "profile deleted");
    Ok(StatusCode::NO_CONTENT)
}
