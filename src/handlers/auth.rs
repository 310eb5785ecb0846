use axum::{extract::State, http::StatusCode, Extension, Json};

use crate::dto::{
    AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, MeResponse,
    MessageResponse, ResetPasswordRequest, SignUpRequest,
};
use crate::error::{AppError, AppResult};
use crate::models::user::{Profile, Session};
use crate::AppState;

pub const PASSWORD_CHANGE_UNAVAILABLE: &str = "Password change is not available yet";
pub const ACCOUNT_DELETION_UNAVAILABLE: &str =
    "Account deletion is not available yet. Please contact support.";

pub async fn sign_up(
    State(state): State<AppState>,
    Json(body): Json<SignUpRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    body.check()?;

    let session = state
        .backend
        .sign_up(&body.email, &body.password, &body.profile_fields())
        .await?;

    tracing::info!(user_id = %session.user_id, "Account created");
    Ok((StatusCode::CREATED, Json(session.into())))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    body.check()?;
    let session = state.backend.sign_in(&body.email, &body.password).await?;
    Ok(Json(session.into()))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    body.check()?;
    state.backend.send_password_reset(&body.email).await?;
    Ok(Json(MessageResponse::new("Password reset email sent!")))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    body.check()?;
    state.backend.reset_password(&body.token, &body.password).await?;
    Ok(Json(MessageResponse::new(
        "Password updated. Please log in with your new password.",
    )))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> AppResult<Json<MessageResponse>> {
    state.backend.sign_out(&session).await?;
    Ok(Json(MessageResponse::new("Logged out successfully")))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> AppResult<Json<MeResponse>> {
    let profile = state.backend.get_profile(session.user_id).await?;
    Ok(Json(MeResponse {
        id: session.user_id,
        display_name: Profile::display_name(profile.as_ref(), &session.email),
        email: session.email,
        session_expires_at: session.expires_at,
        profile,
    }))
}

/// Validates the request, then reports the feature as unavailable.
pub async fn change_password(
    Extension(session): Extension<Session>,
    Json(body): Json<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    body.check()?;
    tracing::debug!(user_id = %session.user_id, "Password change requested");
    Err(AppError::NotImplemented(PASSWORD_CHANGE_UNAVAILABLE.into()))
}

pub async fn delete_account(
    Extension(session): Extension<Session>,
) -> AppResult<Json<MessageResponse>> {
    tracing::debug!(user_id = %session.user_id, "Account deletion requested");
    Err(AppError::NotImplemented(ACCOUNT_DELETION_UNAVAILABLE.into()))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::{
        api_sign_up, body_json, get, json_request, recording_state, send, test_app, test_state,
    };

    #[tokio::test]
    async fn test_sign_up_then_me() {
        let (state, _) = test_state().await;
        let app = test_app(state);
        let token = api_sign_up(&app, "ada@example.com").await;

        let res = send(&app, get("/api/me", Some(&token))).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert_eq!(body["email"], "ada@example.com");
        assert_eq!(body["display_name"], "Ada Lovelace");
        assert_eq!(body["profile"]["email"], "ada@example.com");
    }

    #[tokio::test]
    async fn test_invalid_sign_up_creates_no_account() {
        let (state, backend) = recording_state().await;
        let app = test_app(state);

        for (password, confirm) in [("secret1", "secret2"), ("abc", "abc")] {
            let res = send(
                &app,
                json_request(
                    "POST",
                    "/api/auth/signup",
                    None,
                    json!({
                        "full_name": "Ada",
                        "email": "ada@example.com",
                        "password": password,
                        "confirm_password": confirm,
                    }),
                ),
            )
            .await;
            assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
        assert_eq!(backend.calls_to("sign_up"), 0);

        // Nobody was created, so the address can't sign in.
        let res = send(
            &app,
            json_request(
                "POST",
                "/api/auth/login",
                None,
                json!({ "email": "ada@example.com", "password": "secret1" }),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_conflicts() {
        let (state, _) = test_state().await;
        let app = test_app(state);
        api_sign_up(&app, "ada@example.com").await;

        let res = send(
            &app,
            json_request(
                "POST",
                "/api/auth/signup",
                None,
                json!({
                    "full_name": "Ada Again",
                    "email": "ADA@example.com",
                    "password": "secret1",
                    "confirm_password": "secret1",
                }),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_logout_revokes_token() {
        let (state, _) = test_state().await;
        let app = test_app(state);
        let token = api_sign_up(&app, "ada@example.com").await;

        let res = send(&app, json_request("POST", "/api/auth/logout", Some(&token), json!({}))).await;
        assert_eq!(res.status(), StatusCode::OK);

        let res = send(&app, get("/api/me", Some(&token))).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let (state, _) = test_state().await;
        let app = test_app(state);

        let res = send(&app, get("/api/entries", None)).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = send(&app, get("/api/entries", Some("not-a-jwt"))).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let (state, notifier) = test_state().await;
        let app = test_app(state);
        api_sign_up(&app, "ada@example.com").await;

        let res = send(
            &app,
            json_request(
                "POST",
                "/api/auth/forgot-password",
                None,
                json!({ "email": "ada@example.com" }),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let token = notifier.last_token().expect("reset link delivered");

        let res = send(
            &app,
            json_request(
                "POST",
                "/api/auth/reset-password",
                None,
                json!({ "token": token, "password": "brand-new", "confirm_password": "brand-new" }),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);

        let res = send(
            &app,
            json_request(
                "POST",
                "/api/auth/login",
                None,
                json!({ "email": "ada@example.com", "password": "brand-new" }),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_change_password_and_delete_account_are_unimplemented() {
        let (state, _) = test_state().await;
        let app = test_app(state);
        let token = api_sign_up(&app, "ada@example.com").await;

        let res = send(
            &app,
            json_request(
                "POST",
                "/api/auth/change-password",
                Some(&token),
                json!({
                    "current_password": "secret1",
                    "new_password": "secret2",
                    "confirm_new_password": "secret3",
                }),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let res = send(
            &app,
            json_request(
                "POST",
                "/api/auth/change-password",
                Some(&token),
                json!({
                    "current_password": "secret1",
                    "new_password": "secret2",
                    "confirm_new_password": "secret2",
                }),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_IMPLEMENTED);

        let res = send(&app, json_request("DELETE", "/api/account", Some(&token), json!({}))).await;
        assert_eq!(res.status(), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(body_json(res).await["error"]["code"], 501);
    }

    #[tokio::test]
    async fn test_login_is_rate_limited() {
        let (state, _) = test_state().await;
        let app = test_app(state);

        let mut last = StatusCode::OK;
        for _ in 0..6 {
            let res = send(
                &app,
                json_request(
                    "POST",
                    "/api/auth/login",
                    None,
                    json!({ "email": "nobody@example.com", "password": "wrong-pass" }),
                ),
            )
            .await;
            last = res.status();
        }
        assert_eq!(last, StatusCode::TOO_MANY_REQUESTS);
    }
}
