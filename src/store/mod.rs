//! Data-access boundary. Page controllers and API handlers talk to a
//! `JournalBackend` and only ever see the plain shapes from `crate::models`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::entry::{EntryDraft, StoredEntry};
use crate::models::mood::{DayKey, MoodDraft, StoredMood};
use crate::models::user::{Profile, ProfileFields, Session};

pub mod notify;
pub mod sqlite;

pub use notify::{LogNotifier, ResetNotifier};
pub use sqlite::SqliteBackend;

#[async_trait]
pub trait JournalBackend: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session>;

    /// Creates the account and writes its initial profile.
    async fn sign_up(&self, email: &str, password: &str, profile: &ProfileFields)
        -> AppResult<Session>;

    /// Succeeds for unknown emails too, so the response does not reveal
    /// which addresses have accounts.
    async fn send_password_reset(&self, email: &str) -> AppResult<()>;

    async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()>;

    async fn sign_out(&self, session: &Session) -> AppResult<()>;

    async fn current_session(&self, token: &str) -> AppResult<Option<Session>>;

    /// Merge write: `None` fields keep their stored value.
    async fn save_profile(&self, user_id: Uuid, fields: &ProfileFields) -> AppResult<()>;

    async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<Profile>>;

    /// Updates in place when the draft carries an id, creates otherwise.
    async fn save_entry(&self, user_id: Uuid, entry: &EntryDraft) -> AppResult<StoredEntry>;

    /// Newest update first.
    async fn list_entries(&self, user_id: Uuid) -> AppResult<Vec<StoredEntry>>;

    async fn delete_entry(&self, user_id: Uuid, entry_id: Uuid) -> AppResult<()>;

    /// At most one mood per user and day: a second save on the same day
    /// replaces the first.
    async fn save_mood(&self, user_id: Uuid, mood: &MoodDraft, day: DayKey)
        -> AppResult<StoredMood>;

    /// Most recent first.
    async fn list_moods(&self, user_id: Uuid) -> AppResult<Vec<StoredMood>>;

    async fn ping(&self) -> bool;
}
