//! Course marketplace API - Main Application Entry Point
//!
//! # Startup Flow
//!
//! 1. Load process settings from the environment
//! 2. Read the JSON configuration file (fatal if missing or malformed)
//! 3. Create database connection pool
//! 4. Run database migrations
//! 5. Build HTTP router
//! 6. Start server on configured port

use anyhow::Context;
use course_marketplace_api::{
    build_app,
    config::{AppConfig, Settings},
    db,
    state::AppState,
    store::postgres::PgStore,
};
use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = Settings::from_env().context("invalid environment settings")?;
    let config = AppConfig::load(&settings.config_path)
        .with_context(|| format!("cannot load {:?}", settings.config_path))?;
    tracing::info!(base_path = %config.base_path, "Configuration loaded");

    let pool = db::create_pool(config.connect_options(), config.max_conexiones).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let state = AppState::new(Arc::new(PgStore::new(pool)), &config);
    let app = build_app(state);

    let addr = format!("0.0.0.0:{}", settings.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Connect info feeds the caller IP into the photo access log
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
