use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use super::render::escape_html;

pub const FLASH_COOKIE: &str = "journal_flash";

/// Flash messages are dismissed client-side after this long.
pub const FLASH_DISMISS_MS: u32 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashKind::Success => "success",
            FlashKind::Error => "error",
        }
    }
}

/// One-shot status message carried across a redirect in a cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    /// `kind|urlencoded message`
    pub fn encode(&self) -> String {
        format!("{}|{}", self.kind.as_str(), urlencoding::encode(&self.message))
    }

    pub fn decode(raw: &str) -> Option<Self> {
        let (kind, message) = raw.split_once('|')?;
        let kind = match kind {
            "success" => FlashKind::Success,
            "error" => FlashKind::Error,
            _ => return None,
        };
        let message = urlencoding::decode(message).ok()?.into_owned();
        Some(Self { kind, message })
    }

    pub fn read(jar: &CookieJar) -> Option<Self> {
        jar.get(FLASH_COOKIE).and_then(|c| Self::decode(c.value()))
    }

    pub fn store(self, jar: CookieJar) -> CookieJar {
        jar.add(
            Cookie::build((FLASH_COOKIE, self.encode()))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .max_age(time::Duration::seconds(60)),
        )
    }

    pub fn clear(jar: CookieJar) -> CookieJar {
        jar.remove(Cookie::build(FLASH_COOKIE).path("/"))
    }

    pub fn render(&self) -> String {
        format!(
            r#"<div class="message {}" role="status" data-dismiss-after="{}">{}</div>"#,
            self.kind.as_str(),
            FLASH_DISMISS_MS,
            escape_html(&self.message)
        )
    }
}
