use std::env;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Base URL used when building links that leave the app (password reset mail).
    pub public_url: String,

    pub jwt_secret: String,
    pub session_ttl_secs: i64,
    pub password_reset_ttl_secs: i64,

    pub cookie_secure: bool,
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://daily-journal.db".into()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .context("PORT must be a number")?,
            public_url: env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),

            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            session_ttl_secs: env::var("SESSION_TTL_SECS")
                .unwrap_or_else(|_| "604800".into()) // 7 days
                .parse()
                .context("SESSION_TTL_SECS must be a number")?,
            password_reset_ttl_secs: env::var("PASSWORD_RESET_TTL_SECS")
                .unwrap_or_else(|_| "3600".into())
                .parse()
                .context("PASSWORD_RESET_TTL_SECS must be a number")?,

            cookie_secure: env::var("COOKIE_SECURE")
                .unwrap_or_else(|_| "false".into())
                .parse()
                .unwrap_or(false),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or_default(),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Settings for tests and local tooling: in-memory database, throwaway secret.
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".into(),
            host: "127.0.0.1".into(),
            port: 0,
            public_url: "http://localhost:8080".into(),
            jwt_secret: "test-secret-do-not-use".into(),
            session_ttl_secs: 3600,
            password_reset_ttl_secs: 3600,
            cookie_secure: false,
            cors_allowed_origins: Vec::new(),
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}
