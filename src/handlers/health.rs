use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "daily-journal",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    if state.backend.ping().await {
        (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "checks": { "database": "ok" },
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "checks": { "database": "failed" },
            })),
        )
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::test_support::{body_json, get, send, test_app, test_state};

    #[tokio::test]
    async fn test_health_and_ready() {
        let (state, _) = test_state().await;
        let app = test_app(state);

        let res = send(&app, get("/health", None)).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["service"], "daily-journal");

        let res = send(&app, get("/readyz", None)).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["checks"]["database"], "ok");
    }
}
