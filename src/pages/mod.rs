//! Server-rendered pages. Each controller builds a [`PageContext`] from the
//! request, talks to the backend, and either renders HTML or redirects with a
//! flash message (post/redirect/get).

use axum::{
    extract::{FromRequestParts, State},
    http::request::Parts,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::auth::middleware::SESSION_COOKIE;
use crate::config::Config;
use crate::error::AppError;
use crate::models::preferences::{DisplayPreferences, FONT_SIZE_KEY, THEME_KEY};
use crate::models::user::Session;
use crate::view::flash::Flash;
use crate::view::layout::{self, NavPage, Shell};
use crate::AppState;

pub mod assets;
pub mod home;
pub mod login;
pub mod mood;
pub mod reset;
pub mod settings;
pub mod signup;

/// Per-request page state: who is signed in, how the page should look and
/// the pending flash message. Lives for one request only.
pub struct PageContext {
    pub session: Option<Session>,
    pub prefs: DisplayPreferences,
    pub flash: Option<Flash>,
    jar: CookieJar,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for PageContext {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let mut jar = CookieJar::from_headers(&parts.headers);

        let session = match jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) {
            Some(token) => {
                let session = state
                    .backend
                    .current_session(&token)
                    .await
                    .map_err(IntoResponse::into_response)?;
                if session.is_none() {
                    jar = clear_session(jar);
                }
                session
            }
            None => None,
        };

        let prefs = DisplayPreferences::from_stored(
            jar.get(THEME_KEY).map(|c| c.value()),
            jar.get(FONT_SIZE_KEY).map(|c| c.value()),
        );
        let flash = Flash::read(&jar);

        Ok(Self {
            session,
            prefs,
            flash,
            jar,
        })
    }
}

impl PageContext {
    /// Full HTML page. A shown flash message is consumed.
    pub fn render(self, title: &str, nav: Option<NavPage>, main: &str) -> Response {
        let html = layout::page(
            &Shell {
                title,
                prefs: self.prefs,
                flash: self.flash.as_ref(),
                nav,
            },
            main,
        );
        let jar = match self.flash {
            Some(_) => Flash::clear(self.jar),
            None => self.jar,
        };
        (jar, Html(html)).into_response()
    }

    pub fn redirect(self, to: &str) -> Response {
        (self.jar, Redirect::to(to)).into_response()
    }

    pub fn redirect_with(self, to: &str, flash: Flash) -> Response {
        (flash.store(self.jar), Redirect::to(to)).into_response()
    }

    /// Report `err` on the next page. See [`failure`].
    pub fn fail(self, to: &str, action: &str, err: AppError) -> Response {
        self.redirect_with(to, failure(action, &err))
    }

    pub fn update_jar(mut self, f: impl FnOnce(CookieJar) -> CookieJar) -> Self {
        self.jar = f(self.jar);
        self
    }
}

/// A [`PageContext`] with a live session. Rejects with a redirect to the
/// login page.
pub struct SignedIn {
    pub ctx: PageContext,
    pub session: Session,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for SignedIn {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let ctx = PageContext::from_request_parts(parts, state).await?;
        match ctx.session.clone() {
            Some(session) => Ok(Self { ctx, session }),
            None => Err(ctx.redirect("/login")),
        }
    }
}

/// Error flash for a failed action. Validation and not-implemented messages
/// are shown as they are; anything else is prefixed with the action.
pub fn failure(action: &str, err: &AppError) -> Flash {
    match err {
        AppError::Validation(msg) | AppError::NotImplemented(msg) => Flash::error(msg.clone()),
        AppError::Database(e) => {
            tracing::error!(error = %e, action = %action, "Database error");
            Flash::error(format!("{}: {}", action, err.public_message()))
        }
        AppError::Internal(e) => {
            tracing::error!(error = %e, action = %action, "Internal error");
            Flash::error(format!("{}: {}", action, err.public_message()))
        }
        _ => Flash::error(format!("{}: {}", action, err.public_message())),
    }
}

pub fn store_session(jar: CookieJar, session: &Session, config: &Config) -> CookieJar {
    jar.add(
        Cookie::build((SESSION_COOKIE, session.token.clone()))
            .path("/")
            .http_only(true)
            .secure(config.cookie_secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(session.remaining_secs())),
    )
}

pub fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// POST /logout
pub async fn logout(State(state): State<AppState>, page: SignedIn) -> Response {
    let SignedIn { ctx, session } = page;
    if let Err(err) = state.backend.sign_out(&session).await {
        return ctx.fail("/home", "Error logging out", err);
    }
    tracing::info!(user_id = %session.user_id, "Signed out");
    ctx.update_jar(clear_session).redirect("/login")
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::test_support::{
        body_string, cookies_from, form_post, location, page_get, send, test_app, test_state,
    };

    #[test]
    fn test_failure_prefixes_backend_errors_only() {
        let flash = failure("Login failed", &AppError::InvalidCredentials);
        assert_eq!(flash, Flash::error("Login failed: Invalid email or password"));

        let flash = failure("Signup failed", &AppError::Validation("Passwords do not match".into()));
        assert_eq!(flash, Flash::error("Passwords do not match"));

        let flash = failure(
            "Error saving entry",
            &AppError::Internal(anyhow::anyhow!("disk full")),
        );
        assert_eq!(flash, Flash::error("Error saving entry: Internal server error"));
    }

    #[tokio::test]
    async fn test_protected_page_redirects_to_login() {
        let (state, _) = test_state().await;
        let app = test_app(state);

        for uri in ["/home", "/mood", "/settings"] {
            let res = send(&app, page_get(uri, None)).await;
            assert_eq!(res.status(), StatusCode::SEE_OTHER);
            assert_eq!(location(&res), "/login");
        }
    }

    #[tokio::test]
    async fn test_stale_session_cookie_is_cleared() {
        let (state, _) = test_state().await;
        let app = test_app(state);

        let res = send(&app, page_get("/home", Some("journal_session=bogus"))).await;
        assert_eq!(location(&res), "/login");
        let cleared = res
            .headers()
            .get_all(axum::http::header::SET_COOKIE)
            .iter()
            .any(|v| v.to_str().unwrap_or_default().starts_with("journal_session="));
        assert!(cleared);
    }

    #[tokio::test]
    async fn test_logout_ends_session() {
        let (state, _) = test_state().await;
        let app = test_app(state);

        let res = send(
            &app,
            form_post(
                "/signup",
                None,
                &[
                    ("full_name", "Ada Lovelace"),
                    ("email", "ada@example.com"),
                    ("gender", ""),
                    ("password", "secret1"),
                    ("confirm_password", "secret1"),
                ],
            ),
        )
        .await;
        let cookies = cookies_from(&res);

        let res = send(&app, form_post("/logout", Some(&cookies), &[])).await;
        assert_eq!(location(&res), "/login");

        // The old cookie no longer opens the home page.
        let res = send(&app, page_get("/home", Some(&cookies))).await;
        assert_eq!(location(&res), "/login");

        let res = send(&app, page_get("/login", None)).await;
        assert!(body_string(res).await.contains("Log In"));
    }
}
