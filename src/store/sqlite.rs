use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::auth::jwt::{create_session_token, generate_reset_token, hash_token, verify_token};
use crate::auth::password::{hash_password_blocking, verify_password_blocking, MIN_PASSWORD_LEN};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::entry::{EntryDraft, StoredEntry};
use crate::models::mood::{DayKey, MoodDraft, StoredMood};
use crate::models::user::{Profile, ProfileFields, Session};
use crate::view::render::sanitize_rich_text;

use super::{JournalBackend, ResetNotifier};

pub struct SqliteBackend {
    db: SqlitePool,
    config: Arc<Config>,
    notifier: Arc<dyn ResetNotifier>,
}

#[derive(FromRow)]
struct UserRow {
    id: String,
    email: String,
    password_hash: String,
}

#[derive(FromRow)]
struct ProfileRow {
    user_id: String,
    full_name: Option<String>,
    gender: Option<String>,
    email: Option<String>,
}

#[derive(FromRow)]
struct EntryRow {
    id: String,
    title: String,
    content: String,
    created_at: i64,
    updated_at: i64,
}

#[derive(FromRow)]
struct MoodRow {
    id: String,
    mood: String,
    emoji: String,
    note: Option<String>,
    day_key: String,
    recorded_at: i64,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = AppError;

    fn try_from(row: ProfileRow) -> AppResult<Self> {
        Ok(Profile {
            user_id: parse_id(&row.user_id)?,
            full_name: row.full_name,
            gender: row.gender,
            email: row.email,
        })
    }
}

impl TryFrom<EntryRow> for StoredEntry {
    type Error = AppError;

    fn try_from(row: EntryRow) -> AppResult<Self> {
        Ok(StoredEntry {
            id: parse_id(&row.id)?,
            title: row.title,
            content: row.content,
            created_at: from_micros(row.created_at)?,
            updated_at: from_micros(row.updated_at)?,
        })
    }
}

impl TryFrom<MoodRow> for StoredMood {
    type Error = AppError;

    fn try_from(row: MoodRow) -> AppResult<Self> {
        let day_key = DayKey::parse(&row.day_key).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Malformed day key in store: {}", row.day_key))
        })?;
        Ok(StoredMood {
            id: parse_id(&row.id)?,
            mood: row.mood,
            emoji: row.emoji,
            note: row.note,
            day_key,
            recorded_at: from_micros(row.recorded_at)?,
        })
    }
}

const ENTRY_COLUMNS: &str = "id, title, content, created_at, updated_at";
const MOOD_COLUMNS: &str = "id, mood, emoji, note, day_key, recorded_at";

impl SqliteBackend {
    pub fn new(db: SqlitePool, config: Arc<Config>, notifier: Arc<dyn ResetNotifier>) -> Self {
        Self {
            db,
            config,
            notifier,
        }
    }

    async fn insert_session(
        &self,
        conn: &mut SqliteConnection,
        user_id: Uuid,
        email: &str,
    ) -> AppResult<Session> {
        let issued = create_session_token(user_id, email, &self.config)?;

        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, token_hash, expires_at, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(issued.session_id.to_string())
        .bind(user_id.to_string())
        .bind(hash_token(&issued.token))
        .bind(micros(issued.expires_at))
        .bind(micros(Utc::now()))
        .execute(&mut *conn)
        .await?;

        Ok(Session {
            user_id,
            email: email.to_string(),
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }
}

async fn upsert_profile(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    fields: &ProfileFields,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO profiles (user_id, full_name, gender, email, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (user_id) DO UPDATE SET
            full_name = COALESCE(excluded.full_name, profiles.full_name),
            gender = COALESCE(excluded.gender, profiles.gender),
            email = COALESCE(excluded.email, profiles.email),
            updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id.to_string())
    .bind(&fields.full_name)
    .bind(&fields.gender)
    .bind(&fields.email)
    .bind(micros(Utc::now()))
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[async_trait]
impl JournalBackend for SqliteBackend {
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        let email = normalize_email(email);
        let user = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash FROM users WHERE email = ?",
        )
        .bind(&email)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !verify_password_blocking(password.to_string(), user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        let user_id = parse_id(&user.id)?;
        let mut conn = self.db.acquire().await?;
        let session = self.insert_session(&mut conn, user_id, &user.email).await?;

        tracing::info!(user_id = %user_id, "User signed in");
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: &ProfileFields,
    ) -> AppResult<Session> {
        let email = normalize_email(email);

        let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(&email)
            .fetch_one(&self.db)
            .await?;
        if existing > 0 {
            return Err(AppError::Conflict("Email already registered".into()));
        }

        let pwd_hash = hash_password_blocking(password.to_string()).await?;
        let user_id = Uuid::new_v4();
        let now = micros(Utc::now());

        let mut tx = self.db.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id.to_string())
        .bind(&email)
        .bind(&pwd_hash)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return AppError::Conflict("Email already registered".into());
                }
            }
            AppError::Database(e)
        })?;

        let initial = ProfileFields {
            email: profile.email.clone().or_else(|| Some(email.clone())),
            ..profile.clone()
        };
        upsert_profile(&mut tx, user_id, &initial).await?;
        let session = self.insert_session(&mut tx, user_id, &email).await?;
        tx.commit().await?;

        tracing::info!(user_id = %user_id, "User signed up");
        Ok(session)
    }

    async fn send_password_reset(&self, email: &str) -> AppResult<()> {
        let email = normalize_email(email);
        let user_id = sqlx::query_scalar::<_, String>("SELECT id FROM users WHERE email = ?")
            .bind(&email)
            .fetch_optional(&self.db)
            .await?;

        let Some(user_id) = user_id else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let token = generate_reset_token();
        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.config.password_reset_ttl_secs);

        sqlx::query(
            r#"
            INSERT INTO password_resets (token_hash, user_id, expires_at, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(hash_token(&token))
        .bind(&user_id)
        .bind(micros(expires_at))
        .bind(micros(now))
        .execute(&self.db)
        .await?;

        let link = format!(
            "{}/reset-password?token={}",
            self.config.public_url.trim_end_matches('/'),
            token
        );
        self.notifier.deliver(&email, &link);
        Ok(())
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let token_hash = hash_token(token);
        let stored = sqlx::query_as::<_, (String, i64, Option<i64>)>(
            "SELECT user_id, expires_at, used_at FROM password_resets WHERE token_hash = ?",
        )
        .bind(&token_hash)
        .fetch_optional(&self.db)
        .await?;

        let now = micros(Utc::now());
        let user_id = match stored {
            Some((user_id, expires_at, None)) if expires_at > now => user_id,
            _ => {
                return Err(AppError::Validation(
                    "Reset link is invalid or has expired".into(),
                ))
            }
        };

        let pwd_hash = hash_password_blocking(new_password.to_string()).await?;

        let mut tx = self.db.begin().await?;
        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(&pwd_hash)
            .bind(now)
            .bind(&user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE password_resets SET used_at = ? WHERE token_hash = ?")
            .bind(now)
            .bind(&token_hash)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "UPDATE sessions SET revoked = 1, revoked_at = ? WHERE user_id = ? AND revoked = 0",
        )
        .bind(now)
        .bind(&user_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(user_id = %user_id, "Password reset completed, sessions revoked");
        Ok(())
    }

    async fn sign_out(&self, session: &Session) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE sessions
            SET revoked = 1, revoked_at = ?
            WHERE token_hash = ? AND revoked = 0
            "#,
        )
        .bind(micros(Utc::now()))
        .bind(hash_token(&session.token))
        .execute(&self.db)
        .await?;

        tracing::info!(user_id = %session.user_id, "User signed out");
        Ok(())
    }

    async fn current_session(&self, token: &str) -> AppResult<Option<Session>> {
        let claims = match verify_token(token, &self.config) {
            Ok(data) => data.claims,
            Err(_) => return Ok(None),
        };

        let stored = sqlx::query_as::<_, (i64, i64)>(
            "SELECT expires_at, revoked FROM sessions WHERE id = ? AND token_hash = ?",
        )
        .bind(claims.jti.to_string())
        .bind(hash_token(token))
        .fetch_optional(&self.db)
        .await?;

        match stored {
            Some((expires_at, 0)) if expires_at > micros(Utc::now()) => Ok(Some(Session {
                user_id: claims.sub,
                email: claims.email,
                token: token.to_string(),
                expires_at: from_micros(expires_at)?,
            })),
            _ => Ok(None),
        }
    }

    async fn save_profile(&self, user_id: Uuid, fields: &ProfileFields) -> AppResult<()> {
        let mut conn = self.db.acquire().await?;
        upsert_profile(&mut conn, user_id, fields).await
    }

    async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        sqlx::query_as::<_, ProfileRow>(
            "SELECT user_id, full_name, gender, email FROM profiles WHERE user_id = ?",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.db)
        .await?
        .map(Profile::try_from)
        .transpose()
    }

    async fn save_entry(&self, user_id: Uuid, entry: &EntryDraft) -> AppResult<StoredEntry> {
        let title = entry.title.trim();
        let content = sanitize_rich_text(&entry.content);
        let now = micros(Utc::now());

        let row = match entry.id {
            Some(id) => sqlx::query_as::<_, EntryRow>(&format!(
                r#"
                UPDATE entries
                SET title = ?, content = ?, updated_at = MAX(updated_at, ?)
                WHERE id = ? AND user_id = ?
                RETURNING {ENTRY_COLUMNS}
                "#
            ))
            .bind(title)
            .bind(&content)
            .bind(now)
            .bind(id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(&self.db)
            .await?
            .ok_or(AppError::NotFound("Entry not found".into()))?,
            None => sqlx::query_as::<_, EntryRow>(&format!(
                r#"
                INSERT INTO entries (id, user_id, title, content, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                RETURNING {ENTRY_COLUMNS}
                "#
            ))
            .bind(Uuid::new_v4().to_string())
            .bind(user_id.to_string())
            .bind(title)
            .bind(&content)
            .bind(now)
            .bind(now)
            .fetch_one(&self.db)
            .await?,
        };

        StoredEntry::try_from(row)
    }

    async fn list_entries(&self, user_id: Uuid) -> AppResult<Vec<StoredEntry>> {
        sqlx::query_as::<_, EntryRow>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS} FROM entries
            WHERE user_id = ?
            ORDER BY updated_at DESC, rowid DESC
            "#
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(StoredEntry::try_from)
        .collect()
    }

    async fn delete_entry(&self, user_id: Uuid, entry_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM entries WHERE id = ? AND user_id = ?")
            .bind(entry_id.to_string())
            .bind(user_id.to_string())
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Entry not found".into()));
        }
        Ok(())
    }

    async fn save_mood(
        &self,
        user_id: Uuid,
        mood: &MoodDraft,
        day: DayKey,
    ) -> AppResult<StoredMood> {
        let note = mood
            .note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        // Conditional write on the (user_id, day_key) unique index: a second
        // save for the same day updates the existing record in place.
        let row = sqlx::query_as::<_, MoodRow>(&format!(
            r#"
            INSERT INTO moods (id, user_id, mood, emoji, note, day_key, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id, day_key) DO UPDATE SET
                mood = excluded.mood,
                emoji = excluded.emoji,
                note = excluded.note,
                recorded_at = excluded.recorded_at
            RETURNING {MOOD_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(user_id.to_string())
        .bind(mood.mood.trim())
        .bind(mood.emoji.trim())
        .bind(note)
        .bind(day.to_string())
        .bind(micros(Utc::now()))
        .fetch_one(&self.db)
        .await?;

        StoredMood::try_from(row)
    }

    async fn list_moods(&self, user_id: Uuid) -> AppResult<Vec<StoredMood>> {
        sqlx::query_as::<_, MoodRow>(&format!(
            r#"
            SELECT {MOOD_COLUMNS} FROM moods
            WHERE user_id = ?
            ORDER BY recorded_at DESC, rowid DESC
            "#
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(StoredMood::try_from)
        .collect()
    }

    async fn ping(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.db)
            .await
            .is_ok()
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn micros(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

fn from_micros(value: i64) -> AppResult<DateTime<Utc>> {
    DateTime::from_timestamp_micros(value).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("Timestamp out of range in store: {}", value))
    })
}

fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Malformed id {:?} in store: {}", raw, e)))
}
