use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    extract::cookie::CookieJar,
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::error::AppError;
use crate::AppState;

pub const SESSION_COOKIE: &str = "journal_session";

/// Session token from the `Authorization: Bearer` header, else the session cookie.
pub fn session_token(
    bearer: Option<&TypedHeader<Authorization<Bearer>>>,
    jar: &CookieJar,
) -> Option<String> {
    bearer
        .map(|TypedHeader(Authorization(b))| b.token().to_string())
        .or_else(|| jar.get(SESSION_COOKIE).map(|c| c.value().to_string()))
        .filter(|t| !t.is_empty())
}

/// Rejects requests without a live session and injects the `Session` into
/// request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(bearer.as_ref(), &jar).ok_or(AppError::Unauthorized)?;

    let session = state
        .backend
        .current_session(&token)
        .await?
        .ok_or(AppError::Unauthorized)?;

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}
