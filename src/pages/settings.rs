use axum::{
    extract::{Query, State},
    response::Response,
    Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use crate::dto::{ChangePasswordRequest, ProfileRequest};
use crate::error::AppError;
use crate::handlers::auth::{ACCOUNT_DELETION_UNAVAILABLE, PASSWORD_CHANGE_UNAVAILABLE};
use crate::handlers::export::{attachment, build_export};
use crate::models::preferences::{
    DisplayPreferences, FontSize, Theme, FONT_SIZE_KEY, THEME_KEY,
};
use crate::models::user::Profile;
use crate::view::flash::Flash;
use crate::view::layout::NavPage;
use crate::view::modal::{open_href, render_modal, Modal, ModalQuery, ModalState};
use crate::view::render::escape_html;
use crate::AppState;

use super::signup::gender_options;
use super::SignedIn;

const PREFERENCE_MAX_AGE_DAYS: i64 = 365;

#[derive(Debug, Deserialize)]
pub struct PreferencesForm {
    pub theme: String,
    pub font_size: String,
}

impl PreferencesForm {
    fn parse(&self) -> Result<DisplayPreferences, AppError> {
        Ok(DisplayPreferences {
            theme: Theme::parse(&self.theme)
                .ok_or_else(|| AppError::Validation("Unknown theme".into()))?,
            font_size: FontSize::parse(&self.font_size)
                .ok_or_else(|| AppError::Validation("Unknown font size".into()))?,
        })
    }
}

fn store_preferences(jar: CookieJar, prefs: DisplayPreferences) -> CookieJar {
    let cookie = |name: &'static str, value: &'static str| {
        Cookie::build((name, value))
            .path("/")
            .same_site(SameSite::Lax)
            .max_age(time::Duration::days(PREFERENCE_MAX_AGE_DAYS))
    };
    jar.add(cookie(THEME_KEY, prefs.theme.as_str()))
        .add(cookie(FONT_SIZE_KEY, prefs.font_size.as_str()))
}

fn select_options<T: Copy + PartialEq>(
    all: &[T],
    current: T,
    value: impl Fn(T) -> &'static str,
    label: impl Fn(T) -> &'static str,
) -> String {
    all.iter()
        .map(|&item| {
            let mark = if item == current { " selected" } else { "" };
            format!(r#"<option value="{}"{}>{}</option>"#, value(item), mark, label(item))
        })
        .collect()
}

fn theme_label(theme: Theme) -> &'static str {
    match theme {
        Theme::Light => "Light",
        Theme::Dark => "Dark",
        Theme::Auto => "Auto (system)",
    }
}

fn font_size_label(size: FontSize) -> &'static str {
    match size {
        FontSize::Small => "Small",
        FontSize::Medium => "Medium",
        FontSize::Large => "Large",
    }
}

/// GET /settings
pub async fn show(
    State(state): State<AppState>,
    page: SignedIn,
    query: Option<Query<ModalQuery>>,
) -> Response {
    let SignedIn { ctx, session } = page;
    let modals = ModalState::from_query(&query.map(|Query(q)| q).unwrap_or_default());

    let profile = match state.backend.get_profile(session.user_id).await {
        Ok(profile) => profile,
        Err(err) => {
            let flash = super::failure("Error loading profile", &err);
            return ctx.render("Settings", Some(NavPage::Settings), &flash.render());
        }
    };
    let full_name = profile
        .as_ref()
        .and_then(|p| p.full_name.as_deref())
        .unwrap_or_default();
    let email = profile
        .as_ref()
        .and_then(|p| p.email.as_deref())
        .unwrap_or(session.email.as_str());
    let gender = profile.as_ref().and_then(|p| p.gender.as_deref());
    let prefs = ctx.prefs;

    let main = format!(
        r#"<section class="main-content settings">
  <h1>Settings</h1>
  <p class="subtitle">Signed in as {display_name}</p>

  <div class="settings-section">
    <h2>Profile</h2>
    <form method="post" action="/settings/profile">
      <label for="displayName">Display Name</label>
      <input type="text" id="displayName" name="full_name" value="{full_name}" maxlength="100">
      <label for="profileEmail">Email</label>
      <input type="email" id="profileEmail" value="{email}" readonly>
      <label for="profileGender">Gender</label>
      <select id="profileGender" name="gender">{genders}</select>
      <button type="submit" class="btn btn-primary">Save Profile</button>
    </form>
  </div>

  <div class="settings-section">
    <h2>Appearance</h2>
    <form method="post" action="/settings/preferences" data-autosubmit>
      <label for="themeSelect">Theme</label>
      <select id="themeSelect" name="theme">{themes}</select>
      <label for="fontSize">Font Size</label>
      <select id="fontSize" name="font_size">{sizes}</select>
      <button type="submit" class="btn btn-secondary">Apply</button>
    </form>
  </div>

  <div class="settings-section">
    <h2>Account</h2>
    <a class="btn btn-secondary" href="{change_href}">Change Password</a>
    <a class="btn btn-secondary" href="/settings/export" download>Export Data</a>
    <form method="post" action="/settings/delete-account" data-confirm="Are you sure you want to delete your account? This action cannot be undone.">
      <button type="submit" class="btn btn-danger">Delete Account</button>
    </form>
  </div>
</section>
{change_modal}"#,
        display_name = escape_html(&Profile::display_name(profile.as_ref(), &session.email)),
        full_name = escape_html(full_name),
        email = escape_html(email),
        genders = gender_options(gender),
        themes = select_options(&Theme::ALL, prefs.theme, |t| t.as_str(), theme_label),
        sizes = select_options(&FontSize::ALL, prefs.font_size, |s| s.as_str(), font_size_label),
        change_href = open_href("/settings", Modal::ChangePassword, None),
        change_modal = render_modal(
            "changePasswordModal",
            "Change Password",
            modals.is_open(Modal::ChangePassword),
            &modals.close_href("/settings", Modal::ChangePassword),
            r#"<form method="post" action="/settings/password" id="changePasswordForm">
      <label for="currentPassword">Current Password</label>
      <input type="password" id="currentPassword" name="current_password" required>
      <label for="newPassword">New Password</label>
      <input type="password" id="newPassword" name="new_password" minlength="6" required>
      <label for="confirmNewPassword">Confirm New Password</label>
      <input type="password" id="confirmNewPassword" name="confirm_new_password" minlength="6" required>
      <button type="submit" class="btn btn-primary">Update Password</button>
    </form>"#,
        ),
    );

    ctx.render("Settings", Some(NavPage::Settings), &main)
}

/// POST /settings/profile
pub async fn save_profile(
    State(state): State<AppState>,
    page: SignedIn,
    Form(form): Form<ProfileRequest>,
) -> Response {
    let SignedIn { ctx, session } = page;
    if let Err(err) = form.check() {
        return ctx.fail("/settings", "Error updating profile", err);
    }

    match state
        .backend
        .save_profile(session.user_id, &form.into_fields())
        .await
    {
        Ok(()) => ctx.redirect_with("/settings", Flash::success("Profile updated successfully!")),
        Err(err) => ctx.fail("/settings", "Error updating profile", err),
    }
}

/// POST /settings/preferences. Stored per browser, not per account.
pub async fn save_preferences(page: SignedIn, Form(form): Form<PreferencesForm>) -> Response {
    let SignedIn { ctx, .. } = page;
    match form.parse() {
        Ok(prefs) => ctx
            .update_jar(|jar| store_preferences(jar, prefs))
            .redirect_with("/settings", Flash::success("Display settings saved")),
        Err(err) => ctx.fail("/settings", "Error saving settings", err),
    }
}

/// POST /settings/password. The form is checked, then the user is told the
/// feature is not available.
pub async fn change_password(page: SignedIn, Form(form): Form<ChangePasswordRequest>) -> Response {
    let SignedIn { ctx, session } = page;
    let back = open_href("/settings", Modal::ChangePassword, None);
    if let Err(err) = form.check() {
        return ctx.fail(&back, "Error changing password", err);
    }

    tracing::debug!(user_id = %session.user_id, "Password change requested");
    ctx.fail(
        "/settings",
        "Error changing password",
        AppError::NotImplemented(PASSWORD_CHANGE_UNAVAILABLE.into()),
    )
}

/// GET /settings/export
pub async fn export(State(state): State<AppState>, page: SignedIn) -> Response {
    let SignedIn { ctx, session } = page;
    let result = match build_export(state.backend.as_ref(), session.user_id).await {
        Ok(doc) => attachment(&doc),
        Err(err) => Err(err),
    };
    match result {
        Ok(response) => {
            tracing::info!(user_id = %session.user_id, "Data exported");
            response
        }
        Err(err) => ctx.fail("/settings", "Error exporting data", err),
    }
}

/// POST /settings/delete-account
pub async fn delete_account(page: SignedIn) -> Response {
    let SignedIn { ctx, session } = page;
    tracing::debug!(user_id = %session.user_id, "Account deletion requested");
    ctx.fail(
        "/settings",
        "Error deleting account",
        AppError::NotImplemented(ACCOUNT_DELETION_UNAVAILABLE.into()),
    )
}

#[cfg(test)]
mod tests {
    use axum::http::header;

    use super::*;
    use crate::test_support::{
        body_json, body_string, cookies_from, form_post, location, page_get, send, test_app,
        test_state,
    };

    async fn signed_in(app: &axum::Router) -> String {
        let res = send(
            app,
            form_post(
                "/signup",
                None,
                &[
                    ("full_name", "Ada Lovelace"),
                    ("email", "ada@example.com"),
                    ("gender", "female"),
                    ("password", "secret1"),
                    ("confirm_password", "secret1"),
                ],
            ),
        )
        .await;
        cookies_from(&res)
            .split("; ")
            .filter(|c| c.starts_with("journal_session="))
            .collect()
    }

    async fn flash_after(app: &axum::Router, cookies: &str, res: axum::http::Response<axum::body::Body>) -> String {
        let jar = format!("{}; {}", cookies, cookies_from(&res));
        body_string(send(app, page_get("/settings", Some(&jar))).await).await
    }

    #[test]
    fn test_preferences_form_rejects_unknown_values() {
        let form = PreferencesForm {
            theme: "neon".into(),
            font_size: "large".into(),
        };
        assert!(form.parse().is_err());

        let form = PreferencesForm {
            theme: "dark".into(),
            font_size: "small".into(),
        };
        let prefs = form.parse().unwrap();
        assert_eq!(prefs.theme, Theme::Dark);
        assert_eq!(prefs.font_size, FontSize::Small);
    }

    #[test]
    fn test_select_options_marks_current() {
        let html = select_options(&Theme::ALL, Theme::Auto, |t| t.as_str(), theme_label);
        assert!(html.contains(r#"<option value="auto" selected>Auto (system)</option>"#));
        assert_eq!(html.matches("selected").count(), 1);
    }

    #[tokio::test]
    async fn test_settings_shows_profile() {
        let (state, _) = test_state().await;
        let app = test_app(state);
        let cookies = signed_in(&app).await;

        let html = body_string(send(&app, page_get("/settings", Some(&cookies))).await).await;
        assert!(html.contains(r#"name="full_name" value="Ada Lovelace""#));
        assert!(html.contains(r#"value="ada@example.com" readonly"#));
        assert!(html.contains(r#"<option value="female" selected>Female</option>"#));
    }

    #[tokio::test]
    async fn test_profile_update_merges() {
        let (state, _) = test_state().await;
        let app = test_app(state);
        let cookies = signed_in(&app).await;

        let res = send(
            &app,
            form_post(
                "/settings/profile",
                Some(&cookies),
                &[("full_name", "Ada King"), ("gender", "other")],
            ),
        )
        .await;
        assert_eq!(location(&res), "/settings");
        let html = flash_after(&app, &cookies, res).await;
        assert!(html.contains("Profile updated successfully!"));
        assert!(html.contains(r#"name="full_name" value="Ada King""#));
        assert!(html.contains(r#"<option value="other" selected>Other</option>"#));
        assert!(html.contains(r#"value="ada@example.com" readonly"#));
    }

    #[tokio::test]
    async fn test_preferences_set_cookies_and_apply() {
        let (state, _) = test_state().await;
        let app = test_app(state);
        let cookies = signed_in(&app).await;

        let res = send(
            &app,
            form_post(
                "/settings/preferences",
                Some(&cookies),
                &[("theme", "dark"), ("font_size", "large")],
            ),
        )
        .await;
        let set = cookies_from(&res);
        assert!(set.contains("dailyJournal_theme=dark"));
        assert!(set.contains("dailyJournal_fontSize=large"));

        let html = flash_after(&app, &cookies, res).await;
        assert!(html.contains(r#"data-theme="dark""#));
        assert!(html.contains(r#"<body class="font-large">"#));
    }

    #[tokio::test]
    async fn test_change_password_validates_then_reports_unavailable() {
        let (state, _) = test_state().await;
        let app = test_app(state);
        let cookies = signed_in(&app).await;

        let res = send(
            &app,
            form_post(
                "/settings/password",
                Some(&cookies),
                &[
                    ("current_password", "secret1"),
                    ("new_password", "secret2"),
                    ("confirm_new_password", "secret3"),
                ],
            ),
        )
        .await;
        assert_eq!(location(&res), "/settings?modal=change-password");
        let html = flash_after(&app, &cookies, res).await;
        assert!(html.contains("New passwords do not match"));

        let res = send(
            &app,
            form_post(
                "/settings/password",
                Some(&cookies),
                &[
                    ("current_password", "secret1"),
                    ("new_password", "secret2"),
                    ("confirm_new_password", "secret2"),
                ],
            ),
        )
        .await;
        assert_eq!(location(&res), "/settings");
        let html = flash_after(&app, &cookies, res).await;
        assert!(html.contains(PASSWORD_CHANGE_UNAVAILABLE));

        // The old password still works.
        let res = send(
            &app,
            form_post("/login", None, &[("email", "ada@example.com"), ("password", "secret1")]),
        )
        .await;
        assert_eq!(location(&res), "/home");
    }

    #[tokio::test]
    async fn test_delete_account_is_not_performed() {
        let (state, _) = test_state().await;
        let app = test_app(state);
        let cookies = signed_in(&app).await;

        let res = send(&app, form_post("/settings/delete-account", Some(&cookies), &[])).await;
        let html = flash_after(&app, &cookies, res).await;
        assert!(html.contains("Account deletion is not available yet"));

        let res = send(&app, page_get("/home", Some(&cookies))).await;
        assert_eq!(res.status(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_export_download() {
        let (state, _) = test_state().await;
        let app = test_app(state);
        let cookies = signed_in(&app).await;

        let res = send(&app, page_get("/settings/export", Some(&cookies))).await;
        let disposition = res
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"daily-journal-export-"));

        let body = body_json(res).await;
        assert_eq!(body["profile"]["full_name"], "Ada Lovelace");
        assert!(body["entries"].as_array().unwrap().is_empty());
    }
}
