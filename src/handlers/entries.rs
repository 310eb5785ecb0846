use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::dto::{DeleteResponse, EntryListResponse, EntryRequest};
use crate::error::AppResult;
use crate::models::entry::StoredEntry;
use crate::models::user::Session;
use crate::AppState;

pub async fn list_entries(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> AppResult<Json<EntryListResponse>> {
    let entries = state.backend.list_entries(session.user_id).await?;
    Ok(Json(EntryListResponse {
        total: entries.len(),
        entries,
    }))
}

pub async fn create_entry(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(body): Json<EntryRequest>,
) -> AppResult<(StatusCode, Json<StoredEntry>)> {
    body.check()?;
    let entry = state
        .backend
        .save_entry(session.user_id, &body.into_draft(None))
        .await?;

    tracing::info!(user_id = %session.user_id, entry_id = %entry.id, "Entry created");
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(entry_id): Path<Uuid>,
    Json(body): Json<EntryRequest>,
) -> AppResult<Json<StoredEntry>> {
    body.check()?;
    let entry = state
        .backend
        .save_entry(session.user_id, &body.into_draft(Some(entry_id)))
        .await?;
    Ok(Json(entry))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    state.backend.delete_entry(session.user_id, entry_id).await?;

    tracing::info!(user_id = %session.user_id, entry_id = %entry_id, "Entry deleted");
    Ok(Json(DeleteResponse {
        deleted: true,
        id: entry_id,
    }))
}
