use axum::{extract::State, Extension, Json};

use crate::dto::{MoodListResponse, MoodRequest};
use crate::error::AppResult;
use crate::models::mood::{DayKey, StoredMood};
use crate::models::user::Session;
use crate::AppState;

pub async fn list_moods(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> AppResult<Json<MoodListResponse>> {
    let moods = state.backend.list_moods(session.user_id).await?;
    Ok(Json(MoodListResponse {
        total: moods.len(),
        moods,
    }))
}

/// Records today's mood, replacing an earlier one from the same day.
pub async fn save_mood(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(body): Json<MoodRequest>,
) -> AppResult<Json<StoredMood>> {
    body.check()?;
    let day = DayKey::today();
    let mood = state
        .backend
        .save_mood(session.user_id, &body.into_draft()?, day)
        .await?;

    tracing::info!(user_id = %session.user_id, day = %day, mood = %mood.mood, "Mood saved");
    Ok(Json(mood))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::models::mood::DayKey;
    use crate::test_support::{api_sign_up, body_json, get, json_request, send, test_app, test_state};

    #[tokio::test]
    async fn test_happy_then_sad_leaves_one_record() {
        let (state, _) = test_state().await;
        let app = test_app(state);
        let token = api_sign_up(&app, "ada@example.com").await;

        for mood in ["Happy", "Sad"] {
            let res = send(
                &app,
                json_request("POST", "/api/moods", Some(&token), json!({ "mood": mood })),
            )
            .await;
            assert_eq!(res.status(), StatusCode::OK);
        }

        let body = body_json(send(&app, get("/api/moods", Some(&token))).await).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["moods"][0]["mood"], "Sad");
        assert_eq!(body["moods"][0]["emoji"], "😢");
        assert_eq!(body["moods"][0]["day_key"], DayKey::today().to_string());
    }

    #[tokio::test]
    async fn test_custom_mood_needs_emoji() {
        let (state, _) = test_state().await;
        let app = test_app(state);
        let token = api_sign_up(&app, "ada@example.com").await;

        let res = send(
            &app,
            json_request("POST", "/api/moods", Some(&token), json!({ "mood": "Bored" })),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let res = send(
            &app,
            json_request(
                "POST",
                "/api/moods",
                Some(&token),
                json!({ "mood": "Bored", "emoji": "🥱", "note": "slow day" }),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["note"], "slow day");
    }
}
