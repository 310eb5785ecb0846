use axum::{extract::State, Extension, Json};

use crate::dto::ProfileRequest;
use crate::error::{AppError, AppResult};
use crate::models::user::{Profile, Session};
use crate::AppState;

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> AppResult<Json<Profile>> {
    let profile = state
        .backend
        .get_profile(session.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".into()))?;
    Ok(Json(profile))
}

/// Merge write: fields left out of the body keep their stored value.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(body): Json<ProfileRequest>,
) -> AppResult<Json<Profile>> {
    body.check()?;
    state
        .backend
        .save_profile(session.user_id, &body.into_fields())
        .await?;

    let profile = state
        .backend
        .get_profile(session.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".into()))?;
    Ok(Json(profile))
}
