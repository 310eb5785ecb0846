use axum::{
    extract::{Query, State},
    response::Response,
    Form,
};
use serde::Deserialize;

use crate::dto::ResetPasswordRequest;
use crate::view::flash::Flash;
use crate::view::render::escape_html;
use crate::AppState;

use super::PageContext;

#[derive(Debug, Deserialize)]
pub struct ResetQuery {
    pub token: Option<String>,
}

/// GET /reset-password?token=
pub async fn show(ctx: PageContext, Query(query): Query<ResetQuery>) -> Response {
    let Some(token) = query.token.filter(|t| !t.is_empty()) else {
        return ctx.redirect_with("/login", Flash::error("Reset link is invalid or has expired"));
    };

    let main = format!(
        r#"<section class="auth-card login-form">
  <h1>Choose a New Password</h1>
  <form method="post" action="/reset-password">
    <input type="hidden" name="token" value="{token}">
    <label for="password">New Password</label>
    <input type="password" id="password" name="password" minlength="6" required>
    <label for="confirmPassword">Confirm New Password</label>
    <input type="password" id="confirmPassword" name="confirm_password" minlength="6" required>
    <button type="submit" class="btn btn-primary">Update Password</button>
  </form>
  <p><a href="/login">Back to log in</a></p>
</section>"#,
        token = escape_html(&token),
    );

    ctx.render("Reset Password", None, &main)
}

/// POST /reset-password
pub async fn submit(
    State(state): State<AppState>,
    ctx: PageContext,
    Form(form): Form<ResetPasswordRequest>,
) -> Response {
    let back = format!("/reset-password?token={}", urlencoding::encode(&form.token));
    if let Err(err) = form.check() {
        return ctx.fail(&back, "Error", err);
    }

    match state.backend.reset_password(&form.token, &form.password).await {
        Ok(()) => ctx.redirect_with(
            "/login",
            Flash::success("Password updated. Please log in with your new password."),
        ),
        Err(err) => ctx.fail("/login", "Error", err),
    }
}
