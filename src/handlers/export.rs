use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use chrono::Utc;
use uuid::Uuid;

use crate::dto::ExportDocument;
use crate::error::{AppError, AppResult};
use crate::models::user::Session;
use crate::store::JournalBackend;
use crate::AppState;

/// Everything stored for the account.
pub async fn build_export(backend: &dyn JournalBackend, user_id: Uuid) -> AppResult<ExportDocument> {
    Ok(ExportDocument {
        profile: backend.get_profile(user_id).await?,
        entries: backend.list_entries(user_id).await?,
        moods: backend.list_moods(user_id).await?,
        export_date: Utc::now(),
    })
}

/// Pretty-printed JSON served as a download named after the export date.
pub fn attachment(doc: &ExportDocument) -> AppResult<Response> {
    let body = serde_json::to_string_pretty(doc)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Export serialization failed: {}", e)))?;
    let filename = format!(
        "daily-journal-export-{}.json",
        doc.export_date.format("%Y-%m-%d")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response())
}

pub async fn export_data(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> AppResult<Response> {
    let doc = build_export(state.backend.as_ref(), session.user_id).await?;
    tracing::info!(
        user_id = %session.user_id,
        entries = doc.entries.len(),
        moods = doc.moods.len(),
        "Data exported"
    );
    attachment(&doc)
}
