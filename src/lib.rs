use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod db;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod models;
pub mod pages;
pub mod store;
pub mod view;

#[cfg(test)]
mod test_support;

use auth::rate_limit::{rate_limit_auth, RateLimitState};
use config::Config;
use store::JournalBackend;

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn JournalBackend>,
    pub config: Arc<Config>,
    pub rate_limiter: RateLimitState,
}

pub fn build_router(state: AppState) -> Router {
    let limited = || middleware::from_fn_with_state(state.clone(), rate_limit_auth);

    // Sign-in, sign-up and reset endpoints are rate limited per IP and path.
    let auth_routes = Router::new()
        .route("/api/auth/signup", post(handlers::auth::sign_up))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/forgot-password", post(handlers::auth::forgot_password))
        .route("/api/auth/reset-password", post(handlers::auth::reset_password))
        .layer(limited());

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .merge(auth_routes);

    let protected_routes = Router::new()
        .route("/api/me", get(handlers::auth::me))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/change-password", post(handlers::auth::change_password))
        .route("/api/account", delete(handlers::auth::delete_account))
        // Profile
        .route("/api/profile", get(handlers::profile::get_profile))
        .route("/api/profile", put(handlers::profile::update_profile))
        // Entries
        .route("/api/entries", get(handlers::entries::list_entries))
        .route("/api/entries", post(handlers::entries::create_entry))
        .route("/api/entries/:id", put(handlers::entries::update_entry))
        .route("/api/entries/:id", delete(handlers::entries::delete_entry))
        // Moods
        .route("/api/moods", get(handlers::moods::list_moods))
        .route("/api/moods", post(handlers::moods::save_mood))
        .route("/api/export", get(handlers::export::export_data))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    // Server-rendered pages. Only the form posts that take credentials are
    // rate limited, so reloading a page never counts against the limit.
    let page_routes = Router::new()
        .route("/", get(pages::login::show))
        .route(
            "/login",
            get(pages::login::show).merge(post(pages::login::submit).route_layer(limited())),
        )
        .route(
            "/forgot-password",
            post(pages::login::forgot_password).route_layer(limited()),
        )
        .route(
            "/signup",
            get(pages::signup::show).merge(post(pages::signup::submit).route_layer(limited())),
        )
        .route(
            "/reset-password",
            get(pages::reset::show).merge(post(pages::reset::submit).route_layer(limited())),
        )
        .route("/home", get(pages::home::show))
        .route("/home/entries", post(pages::home::save_entry))
        .route("/home/entries/:id/delete", post(pages::home::delete_entry))
        .route("/mood", get(pages::mood::show).post(pages::mood::save))
        .route("/settings", get(pages::settings::show))
        .route("/settings/profile", post(pages::settings::save_profile))
        .route("/settings/preferences", post(pages::settings::save_preferences))
        .route("/settings/password", post(pages::settings::change_password))
        .route("/settings/delete-account", post(pages::settings::delete_account))
        .route("/settings/export", get(pages::settings::export))
        .route("/logout", post(pages::logout))
        .route("/static/style.css", get(pages::assets::stylesheet))
        .route("/static/journal.js", get(pages::assets::script));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(page_routes)
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let mut origins = Vec::with_capacity(config.cors_allowed_origins.len() + 1);
    for origin in std::iter::once(&config.public_url).chain(&config.cors_allowed_origins) {
        match origin.parse::<HeaderValue>() {
            Ok(value) => origins.push(value),
            Err(_) => tracing::warn!(origin = %origin, "Ignoring invalid CORS origin"),
        }
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}
