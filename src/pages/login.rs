use axum::{
    extract::{Query, State},
    response::Response,
    Form,
};

use crate::dto::{ForgotPasswordRequest, LoginRequest};
use crate::view::flash::Flash;
use crate::view::modal::{open_href, render_modal, Modal, ModalQuery, ModalState};
use crate::AppState;

use super::{store_session, PageContext};

/// GET / and GET /login
pub async fn show(ctx: PageContext, query: Option<Query<ModalQuery>>) -> Response {
    if ctx.session.is_some() {
        return ctx.redirect("/home");
    }
    let modals = ModalState::from_query(&query.map(|Query(q)| q).unwrap_or_default());

    let main = format!(
        r#"<section class="auth-card login-form">
  <h1>Daily Journal</h1>
  <p class="subtitle">Welcome back. Log in to continue writing.</p>
  <form method="post" action="/login">
    <label for="email">Email</label>
    <input type="email" id="email" name="email" required>
    <label for="password">Password</label>
    <input type="password" id="password" name="password" required>
    <button type="submit" class="btn btn-primary">Log In</button>
  </form>
  <p><a href="{forgot}">Forgot password?</a></p>
  <p>Don't have an account? <a href="/signup">Sign up</a></p>
</section>
{modal}"#,
        forgot = open_href("/login", Modal::ForgotPassword, None),
        modal = render_modal(
            "forgotPasswordModal",
            "Reset Password",
            modals.is_open(Modal::ForgotPassword),
            &modals.close_href("/login", Modal::ForgotPassword),
            r#"<form method="post" action="/forgot-password">
      <p>Enter your email and we'll send you a link to reset your password.</p>
      <label for="resetEmail">Email</label>
      <input type="email" id="resetEmail" name="email" required>
      <button type="submit" class="btn btn-primary">Send Reset Link</button>
    </form>"#,
        ),
    );

    ctx.render("Log In", None, &main)
}

/// POST /login
pub async fn submit(
    State(state): State<AppState>,
    ctx: PageContext,
    Form(form): Form<LoginRequest>,
) -> Response {
    if let Err(err) = form.check() {
        return ctx.fail("/login", "Login failed", err);
    }

    match state.backend.sign_in(&form.email, &form.password).await {
        Ok(session) => {
            tracing::info!(user_id = %session.user_id, "Signed in");
            ctx.update_jar(|jar| store_session(jar, &session, &state.config))
                .redirect("/home")
        }
        Err(err) => ctx.fail("/login", "Login failed", err),
    }
}

/// POST /forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    ctx: PageContext,
    Form(form): Form<ForgotPasswordRequest>,
) -> Response {
    let back = open_href("/login", Modal::ForgotPassword, None);
    if let Err(err) = form.check() {
        return ctx.fail(&back, "Error", err);
    }

    match state.backend.send_password_reset(&form.email).await {
        Ok(()) => ctx.redirect_with("/login", Flash::success("Password reset email sent!")),
        Err(err) => ctx.fail(&back, "Error", err),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::test_support::{
        body_string, cookies_from, form_post, location, page_get, send, test_app, test_state,
    };

    async fn sign_up(app: &axum::Router) {
        let res = send(
            app,
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
        assert_eq!(location(&res), "/home");
    }

    #[tokio::test]
    async fn test_login_page_renders_forgot_modal_on_request() {
        let (state, _) = test_state().await;
        let app = test_app(state);

        let html = body_string(send(&app, page_get("/", None)).await).await;
        assert!(html.contains(r#"action="/login""#));
        assert!(html.contains(r#"<div class="modal" id="forgotPasswordModal""#));

        let html = body_string(send(&app, page_get("/login?modal=forgot-password", None)).await).await;
        assert!(html.contains(r#"<div class="modal active" id="forgotPasswordModal""#));

        // An unknown modal name is ignored rather than rejected.
        let res = send(&app, page_get("/login?modal=bogus", None)).await;
        assert_eq!(res.status(), axum::http::StatusCode::OK);
        assert!(body_string(res).await.contains(r#"<div class="modal" id="forgotPasswordModal""#));
    }

    #[tokio::test]
    async fn test_wrong_password_flashes_error() {
        let (state, _) = test_state().await;
        let app = test_app(state);
        sign_up(&app).await;

        let res = send(
            &app,
            form_post("/login", None, &[("email", "ada@example.com"), ("password", "nope-nope")]),
        )
        .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/login");
        let cookies = cookies_from(&res);

        let html = body_string(send(&app, page_get("/login", Some(&cookies))).await).await;
        assert!(html.contains("Login failed: Invalid email or password"));
    }

    #[tokio::test]
    async fn test_login_sets_session_and_skips_login_page() {
        let (state, _) = test_state().await;
        let app = test_app(state);
        sign_up(&app).await;

        let res = send(
            &app,
            form_post("/login", None, &[("email", "ada@example.com"), ("password", "secret1")]),
        )
        .await;
        assert_eq!(location(&res), "/home");
        let cookies = cookies_from(&res);
        assert!(cookies.contains("journal_session="));

        let res = send(&app, page_get("/login", Some(&cookies))).await;
        assert_eq!(location(&res), "/home");
    }

    #[tokio::test]
    async fn test_forgot_password_requires_email() {
        let (state, notifier) = test_state().await;
        let app = test_app(state);

        let res = send(&app, form_post("/forgot-password", None, &[("email", "")])).await;
        assert_eq!(location(&res), "/login?modal=forgot-password");
        assert!(notifier.last_token().is_none());

        let res = send(&app, form_post("/forgot-password", None, &[("email", "who@example.com")])).await;
        assert_eq!(location(&res), "/login");
        let html = body_string(send(&app, page_get("/login", Some(&cookies_from(&res)))).await).await;
        assert!(html.contains("Password reset email sent!"));
    }
}
