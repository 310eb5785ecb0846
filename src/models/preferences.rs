use serde::{Deserialize, Serialize};

pub const THEME_KEY: &str = "dailyJournal_theme";
pub const FONT_SIZE_KEY: &str = "dailyJournal_fontSize";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    /// Follow the browser's `prefers-color-scheme`.
    Auto,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Auto => "auto",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            "auto" => Some(Theme::Auto),
            _ => None,
        }
    }

    pub const ALL: [Theme; 3] = [Theme::Light, Theme::Dark, Theme::Auto];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            FontSize::Small => "small",
            FontSize::Medium => "medium",
            FontSize::Large => "large",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "small" => Some(FontSize::Small),
            "medium" => Some(FontSize::Medium),
            "large" => Some(FontSize::Large),
            _ => None,
        }
    }

    /// Class applied to `<body>`.
    pub fn body_class(&self) -> String {
        format!("font-{}", self.as_str())
    }

    pub const ALL: [FontSize; 3] = [FontSize::Small, FontSize::Medium, FontSize::Large];
}

/// Per-browser display settings, independent of the signed-in account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayPreferences {
    pub theme: Theme,
    pub font_size: FontSize,
}

impl DisplayPreferences {
    /// Build from raw stored values; missing or unknown values use the defaults.
    pub fn from_stored(theme: Option<&str>, font_size: Option<&str>) -> Self {
        Self {
            theme: theme.and_then(Theme::parse).unwrap_or_default(),
            font_size: font_size.and_then(FontSize::parse).unwrap_or_default(),
        }
    }
}
