use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated account context. Owned by the backend: callers only read it
/// and hand it back for sign-out.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Seconds until the session expires, never negative.
    pub fn remaining_secs(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub email: Option<String>,
}

impl Profile {
    /// Name shown in page headers: full name, else the local part of the
    /// account email, else "User".
    pub fn display_name(profile: Option<&Profile>, account_email: &str) -> String {
        if let Some(name) = profile
            .and_then(|p| p.full_name.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
        {
            return name.to_string();
        }
        match account_email.split('@').next() {
            Some(local) if !local.is_empty() => local.to_string(),
            _ => "User".to_string(),
        }
    }
}

/// Partial profile write. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileFields {
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub email: Option<String>,
}
