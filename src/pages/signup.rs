use axum::{extract::State, response::Response, Form};

use crate::dto::SignUpRequest;
use crate::view::flash::Flash;
use crate::AppState;

use super::{store_session, PageContext};

pub const GENDER_OPTIONS: &[(&str, &str)] = &[
    ("", "Prefer not to say"),
    ("female", "Female"),
    ("male", "Male"),
    ("other", "Other"),
];

/// `<option>` list for the gender select, with `selected` marked.
pub fn gender_options(selected: Option<&str>) -> String {
    let selected = selected.unwrap_or_default();
    GENDER_OPTIONS
        .iter()
        .map(|(value, label)| {
            let mark = if *value == selected { " selected" } else { "" };
            format!(r#"<option value="{}"{}>{}</option>"#, value, mark, label)
        })
        .collect()
}

/// GET /signup
pub async fn show(ctx: PageContext) -> Response {
    if ctx.session.is_some() {
        return ctx.redirect("/home");
    }

    let main = format!(
        r#"<section class="auth-card signup-form">
  <h1>Create Account</h1>
  <p class="subtitle">Start your daily journaling habit.</p>
  <form method="post" action="/signup">
    <label for="fullName">Full Name</label>
    <input type="text" id="fullName" name="full_name" required>
    <label for="email">Email</label>
    <input type="email" id="email" name="email" required>
    <label for="gender">Gender</label>
    <select id="gender" name="gender">{genders}</select>
    <label for="password">Password</label>
    <input type="password" id="password" name="password" minlength="6" required>
    <label for="confirmPassword">Confirm Password</label>
    <input type="password" id="confirmPassword" name="confirm_password" minlength="6" required>
    <button type="submit" class="btn btn-primary">Sign Up</button>
  </form>
  <p>Already have an account? <a href="/login">Log in</a></p>
</section>"#,
        genders = gender_options(None),
    );

    ctx.render("Sign Up", None, &main)
}

/// POST /signup
pub async fn submit(
    State(state): State<AppState>,
    ctx: PageContext,
    Form(form): Form<SignUpRequest>,
) -> Response {
    // Nothing reaches the backend until the form passes.
    if let Err(err) = form.check() {
        return ctx.fail("/signup", "Signup failed", err);
    }

    match state
        .backend
        .sign_up(&form.email, &form.password, &form.profile_fields())
        .await
    {
        Ok(session) => {
            tracing::info!(user_id = %session.user_id, "Account created");
            ctx.update_jar(|jar| store_session(jar, &session, &state.config))
                .redirect_with("/home", Flash::success("Account created successfully!"))
        }
        Err(err) => ctx.fail("/signup", "Signup failed", err),
    }
}
