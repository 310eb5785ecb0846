use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Moods offered on the tracker page, as (label, emoji).
pub const MOOD_CHOICES: &[(&str, &str)] = &[
    ("Happy", "😊"),
    ("Excited", "🤩"),
    ("Calm", "😌"),
    ("Neutral", "😐"),
    ("Tired", "😴"),
    ("Anxious", "😰"),
    ("Sad", "😢"),
    ("Angry", "😠"),
];

/// Emoji for one of the tracker's preset moods.
pub fn emoji_for(label: &str) -> Option<&'static str> {
    MOOD_CHOICES
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, emoji)| *emoji)
}

/// Calendar day a mood record belongs to. A user has at most one mood record
/// per day key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn today() -> Self {
        Self(Utc::now().date_naive())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().map(Self)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoodDraft {
    pub mood: String,
    pub emoji: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredMood {
    pub id: Uuid,
    pub mood: String,
    pub emoji: String,
    pub note: Option<String>,
    pub day_key: DayKey,
    pub recorded_at: DateTime<Utc>,
}
