//! # Daily Journal: Request/Response DTOs
//!
//! JSON API and page-form contract types in one module.
//!
//! Conventions:
//! - `*Request`  → deserialized from a JSON body or an urlencoded form
//! - `*Response` → serialized to client JSON
//! - Field rules are `validator` derives; `check()` runs them after the
//!   password-confirmation comparison, so a mismatch is reported first

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::error::{AppError, AppResult};
use crate::models::entry::{EntryDraft, StoredEntry};
use crate::models::mood::{MoodDraft, StoredMood};
use crate::models::user::{Profile, ProfileFields, Session};
use crate::view::render::{html_to_text, sanitize_rich_text};

// ============================================================================
// Common
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub id: Uuid,
}

/// First failing rule as a user-facing message. Fields listed in `priority`
/// are reported before the rest, which follow in name order.
pub fn first_validation_message(errors: &ValidationErrors, priority: &[&str]) -> String {
    let fields = errors.field_errors();
    let mut names: Vec<&str> = fields.keys().copied().collect();
    names.sort_by_key(|name| {
        (
            priority.iter().position(|p| p == name).unwrap_or(priority.len()),
            *name,
        )
    });

    names
        .first()
        .and_then(|name| fields.get(name).and_then(|errs| errs.first()).map(|e| (name, e)))
        .map(|(name, e)| match &e.message {
            Some(msg) => msg.to_string(),
            None => format!("Invalid {}", name.replace('_', " ")),
        })
        .unwrap_or_else(|| "Invalid input".to_string())
}

fn validate_with(value: &impl Validate, priority: &[&str]) -> AppResult<()> {
    value
        .validate()
        .map_err(|e| AppError::Validation(first_validation_message(&e, priority)))
}

fn passwords_match(password: &str, confirm: &str) -> AppResult<()> {
    if password != confirm {
        return Err(AppError::Validation("Passwords do not match".into()));
    }
    Ok(())
}

/// Blank form fields arrive as `Some("")`.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Judged on what will be stored, not on what was sent.
fn has_visible_text(content: &str) -> bool {
    !html_to_text(&sanitize_rich_text(content)).trim().is_empty()
}

// ============================================================================
// Auth
// ============================================================================

/// POST /api/auth/signup, POST /signup
#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(length(min = 1, max = 100, message = "Full name is required"))]
    pub full_name: String,

    #[validate(length(min = 1, message = "Email is required"))]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(max = 40, message = "Gender is too long"))]
    pub gender: Option<String>,

    #[validate(length(min = 6, max = 128, message = "Password must be at least 6 characters"))]
    pub password: String,

    pub confirm_password: String,
}

impl SignUpRequest {
    pub fn check(&self) -> AppResult<()> {
        passwords_match(&self.password, &self.confirm_password)?;
        validate_with(self, &["password", "full_name", "email"])
    }

    pub fn profile_fields(&self) -> ProfileFields {
        ProfileFields {
            full_name: Some(self.full_name.trim().to_string()),
            gender: non_blank(self.gender.clone()),
            email: None,
        }
    }
}

/// POST /api/auth/login, POST /login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl LoginRequest {
    pub fn check(&self) -> AppResult<()> {
        validate_with(self, &["email", "password"])
    }
}

/// POST /api/auth/forgot-password, POST /forgot-password
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(length(min = 1, message = "Please enter your email address"))]
    pub email: String,
}

impl ForgotPasswordRequest {
    pub fn check(&self) -> AppResult<()> {
        validate_with(self, &[])
    }
}

/// POST /api/auth/reset-password, POST /reset-password
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Reset link is missing its token"))]
    pub token: String,

    #[validate(length(min = 6, max = 128, message = "Password must be at least 6 characters"))]
    pub password: String,

    pub confirm_password: String,
}

impl ResetPasswordRequest {
    pub fn check(&self) -> AppResult<()> {
        passwords_match(&self.password, &self.confirm_password)?;
        validate_with(self, &["password", "token"])
    }
}

/// POST /api/auth/change-password, POST /settings/password
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(min = 6, max = 128, message = "Password must be at least 6 characters"))]
    pub new_password: String,

    pub confirm_new_password: String,
}

impl ChangePasswordRequest {
    pub fn check(&self) -> AppResult<()> {
        if self.new_password != self.confirm_new_password {
            return Err(AppError::Validation("New passwords do not match".into()));
        }
        validate_with(self, &["new_password", "current_password"])
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: UserSummary,
}

impl From<Session> for AuthResponse {
    fn from(session: Session) -> Self {
        Self {
            expires_in: session.remaining_secs(),
            user: UserSummary {
                id: session.user_id,
                email: session.email,
            },
            token: session.token,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
}

/// GET /api/me
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub session_expires_at: DateTime<Utc>,
    pub profile: Option<Profile>,
}

// ============================================================================
// Profile
// ============================================================================

/// PUT /api/profile, POST /settings/profile. Absent fields keep their value.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProfileRequest {
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub full_name: Option<String>,

    #[validate(length(max = 40, message = "Gender is too long"))]
    pub gender: Option<String>,
}

impl ProfileRequest {
    pub fn check(&self) -> AppResult<()> {
        validate_with(self, &[])
    }

    pub fn into_fields(self) -> ProfileFields {
        ProfileFields {
            full_name: self.full_name.map(|n| n.trim().to_string()),
            gender: self.gender.map(|g| g.trim().to_string()),
            email: None,
        }
    }
}

// ============================================================================
// Entries
// ============================================================================

/// POST /api/entries, PUT /api/entries/{id}
#[derive(Debug, Deserialize, Validate)]
pub struct EntryRequest {
    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: String,

    #[validate(length(max = 100000, message = "Entry is too long"))]
    pub content: String,
}

impl EntryRequest {
    /// Title and content are both required; content counts as empty when
    /// nothing visible is left after sanitizing.
    pub fn check(&self) -> AppResult<()> {
        if self.title.trim().is_empty() || !has_visible_text(&self.content) {
            return Err(AppError::Validation(
                "Please fill in both title and content".into(),
            ));
        }
        validate_with(self, &["title", "content"])
    }

    pub fn into_draft(self, id: Option<Uuid>) -> EntryDraft {
        EntryDraft {
            id,
            title: self.title,
            content: self.content,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EntryListResponse {
    pub entries: Vec<StoredEntry>,
    pub total: usize,
}

// ============================================================================
// Moods
// ============================================================================

/// POST /api/moods. The emoji defaults to the preset one for known labels.
#[derive(Debug, Deserialize, Validate)]
pub struct MoodRequest {
    #[validate(length(min = 1, max = 40, message = "Please select a mood"))]
    pub mood: String,

    #[validate(length(max = 16, message = "Emoji is too long"))]
    pub emoji: Option<String>,

    #[validate(length(max = 2000, message = "Note must be at most 2000 characters"))]
    pub note: Option<String>,
}

impl MoodRequest {
    pub fn check(&self) -> AppResult<()> {
        validate_with(self, &["mood"])
    }

    pub fn into_draft(self) -> AppResult<MoodDraft> {
        let emoji = match non_blank(self.emoji) {
            Some(emoji) => emoji,
            None => crate::models::mood::emoji_for(&self.mood)
                .map(str::to_string)
                .ok_or_else(|| AppError::Validation("Unknown mood; send an emoji".into()))?,
        };
        Ok(MoodDraft {
            mood: self.mood,
            emoji,
            note: self.note,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct MoodListResponse {
    pub moods: Vec<StoredMood>,
    pub total: usize,
}

// ============================================================================
// Export
// ============================================================================

/// Account data download.
#[derive(Debug, Serialize)]
pub struct ExportDocument {
    pub profile: Option<Profile>,
    pub entries: Vec<StoredEntry>,
    pub moods: Vec<StoredMood>,
    pub export_date: DateTime<Utc>,
}
