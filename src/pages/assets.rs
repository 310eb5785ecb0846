use axum::{http::header, response::IntoResponse};

const STYLE_CSS: &str = include_str!("../../assets/style.css");
const JOURNAL_JS: &str = include_str!("../../assets/journal.js");

/// GET /static/style.css
pub async fn stylesheet() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/css; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        STYLE_CSS,
    )
}

/// GET /static/journal.js
pub async fn script() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        JOURNAL_JS,
    )
}
