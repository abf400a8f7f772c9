//! Smart Task Backend Server
//!
//! Serves the user API and the realtime notification socket, both behind
//! the cookie-session gate.

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use smart_task_server::app_state::AppState;
use smart_task_server::auth::PgRefreshTokenStore;
use smart_task_server::config::AppConfig;
use smart_task_server::routes::create_router;
use smart_task_server::services::{PgUserStore, UserService};
use smart_task_server::websocket::ConnectionDirectory;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env().context("invalid configuration")?;
    info!(environment = ?config.auth.environment, "configuration loaded");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("cannot connect to the database")?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("database migration failed")?;

    let users = UserService::new(Arc::new(PgUserStore::new(pool.clone())));
    let refresh_tokens = Arc::new(PgRefreshTokenStore::new(pool));
    let state = AppState::build(
        &config.auth,
        users,
        refresh_tokens,
        ConnectionDirectory::new(),
    )
    .context("cannot load the encryption key pair")?;

    let app = create_router(state)
        .layer(build_cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allowed_origins = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    // Credentialed requests need explicit origins, methods and headers.
    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::COOKIE])
        .allow_credentials(true)
}
