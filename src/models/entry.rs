use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Entry as submitted for saving. With an `id` the save updates that entry,
/// without one it creates a new entry.
#[derive(Debug, Clone, Deserialize)]
pub struct EntryDraft {
    pub id: Option<Uuid>,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredEntry {
    pub id: Uuid,
    pub title: String,
    /// Sanitized rich-text HTML.
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
