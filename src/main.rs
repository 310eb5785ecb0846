use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;

use daily_journal::auth::rate_limit::{spawn_cleanup_worker, RateLimitState};
use daily_journal::config::Config;
use daily_journal::store::{LogNotifier, SqliteBackend};
use daily_journal::{build_router, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "daily_journal=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env()?);

    let pool = db::create_pool(&config.database_url)
        .await
        .context("Failed to open database")?;
    db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    let backend = SqliteBackend::new(pool, config.clone(), Arc::new(LogNotifier));
    let rate_limiter = RateLimitState::new();
    spawn_cleanup_worker(rate_limiter.clone());

    let state = AppState {
        backend: Arc::new(backend),
        config: config.clone(),
        rate_limiter,
    };
    let app = build_router(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    // Client address is needed by the auth rate limiter.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
