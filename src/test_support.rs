//! Shared fixtures for unit and router tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{header, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use crate::auth::rate_limit::RateLimitState;
use crate::config::Config;
use crate::db;
use crate::error::AppResult;
use crate::models::entry::{EntryDraft, StoredEntry};
use crate::models::mood::{DayKey, MoodDraft, StoredMood};
use crate::models::user::{Profile, ProfileFields, Session};
use crate::store::{JournalBackend, ResetNotifier, SqliteBackend};
use crate::AppState;

/// Keeps every reset link instead of sending it.
#[derive(Default)]
pub struct CapturingNotifier {
    links: Mutex<Vec<String>>,
}

impl CapturingNotifier {
    /// Token from the most recent link.
    pub fn last_token(&self) -> Option<String> {
        let links = self.links.lock().unwrap();
        let link = links.last()?;
        link.split_once("token=").map(|(_, token)| token.to_string())
    }
}

impl ResetNotifier for CapturingNotifier {
    fn deliver(&self, _email: &str, link: &str) {
        self.links.lock().unwrap().push(link.to_string());
    }
}

pub async fn test_backend() -> (SqliteBackend, Arc<CapturingNotifier>) {
    let config = Arc::new(Config::for_tests());
    let pool = db::create_pool(&config.database_url).await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    let notifier = Arc::new(CapturingNotifier::default());
    let backend = SqliteBackend::new(pool, config, notifier.clone());
    (backend, notifier)
}

pub async fn test_state() -> (AppState, Arc<CapturingNotifier>) {
    let (backend, notifier) = test_backend().await;
    let state = AppState {
        backend: Arc::new(backend),
        config: Arc::new(Config::for_tests()),
        rate_limiter: RateLimitState::new(),
    };
    (state, notifier)
}

/// Delegates to a real backend and records which operations were called.
pub struct RecordingBackend {
    inner: SqliteBackend,
    calls: Mutex<Vec<&'static str>>,
}

impl RecordingBackend {
    pub fn calls_to(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == operation)
            .count()
    }

    fn record(&self, operation: &'static str) {
        self.calls.lock().unwrap().push(operation);
    }
}

#[async_trait::async_trait]
impl JournalBackend for RecordingBackend {
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        self.record("sign_in");
        self.inner.sign_in(email, password).await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: &ProfileFields,
    ) -> AppResult<Session> {
        self.record("sign_up");
        self.inner.sign_up(email, password, profile).await
    }

    async fn send_password_reset(&self, email: &str) -> AppResult<()> {
        self.record("send_password_reset");
        self.inner.send_password_reset(email).await
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        self.record("reset_password");
        self.inner.reset_password(token, new_password).await
    }

    async fn sign_out(&self, session: &Session) -> AppResult<()> {
        self.record("sign_out");
        self.inner.sign_out(session).await
    }

    async fn current_session(&self, token: &str) -> AppResult<Option<Session>> {
        self.inner.current_session(token).await
    }

    async fn save_profile(&self, user_id: Uuid, fields: &ProfileFields) -> AppResult<()> {
        self.record("save_profile");
        self.inner.save_profile(user_id, fields).await
    }

    async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        self.inner.get_profile(user_id).await
    }

    async fn save_entry(&self, user_id: Uuid, entry: &EntryDraft) -> AppResult<StoredEntry> {
        self.record("save_entry");
        self.inner.save_entry(user_id, entry).await
    }

    async fn list_entries(&self, user_id: Uuid) -> AppResult<Vec<StoredEntry>> {
        self.inner.list_entries(user_id).await
    }

    async fn delete_entry(&self, user_id: Uuid, entry_id: Uuid) -> AppResult<()> {
        self.record("delete_entry");
        self.inner.delete_entry(user_id, entry_id).await
    }

    async fn save_mood(
        &self,
        user_id: Uuid,
        mood: &MoodDraft,
        day: DayKey,
    ) -> AppResult<StoredMood> {
        self.record("save_mood");
        self.inner.save_mood(user_id, mood, day).await
    }

    async fn list_moods(&self, user_id: Uuid) -> AppResult<Vec<StoredMood>> {
        self.inner.list_moods(user_id).await
    }

    async fn ping(&self) -> bool {
        self.inner.ping().await
    }
}

/// App state over a [`RecordingBackend`], for asserting which backend
/// operations a request reached.
pub async fn recording_state() -> (AppState, Arc<RecordingBackend>) {
    let (inner, _) = test_backend().await;
    let backend = Arc::new(RecordingBackend {
        inner,
        calls: Mutex::new(Vec::new()),
    });
    let state = AppState {
        backend: backend.clone(),
        config: Arc::new(Config::for_tests()),
        rate_limiter: RateLimitState::new(),
    };
    (state, backend)
}

/// The full application with a fixed client address for the rate limiter.
pub fn test_app(state: AppState) -> Router {
    crate::build_router(state).layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))))
}

pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.unwrap()
}

pub async fn body_string(res: Response<Body>) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(res: Response<Body>) -> serde_json::Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Browser-style form post. `cookies` is a ready `Cookie` header value.
pub fn form_post(uri: &str, cookies: Option<&str>, fields: &[(&str, &str)]) -> Request<Body> {
    let body: String = fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookies) = cookies {
        builder = builder.header(header::COOKIE, cookies);
    }
    builder.body(Body::from(body)).unwrap()
}

pub fn page_get(uri: &str, cookies: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookies) = cookies {
        builder = builder.header(header::COOKIE, cookies);
    }
    builder.body(Body::empty()).unwrap()
}

/// `name=value` pairs from every `Set-Cookie` header, joined for a `Cookie`
/// header. Removal cookies (empty value) are skipped.
pub fn cookies_from(res: &Response<Body>) -> String {
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .filter(|pair| !pair.ends_with('='))
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn location(res: &Response<Body>) -> String {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Signs up through the API and returns the bearer token.
pub async fn api_sign_up(app: &Router, email: &str) -> String {
    let res = send(
        app,
        json_request(
            "POST",
            "/api/auth/signup",
            None,
            serde_json::json!({
                "full_name": "Ada Lovelace",
                "email": email,
                "password": "secret1",
                "confirm_password": "secret1",
            }),
        ),
    )
    .await;
    assert_eq!(res.status(), 201);
    body_json(res).await["token"].as_str().unwrap().to_string()
}
