// src/main.rs

use std::{net::SocketAddr, sync::Arc};

use cbt_backend::config::{Config, DEFAULT_ADMIN_PASSWORD};
use cbt_backend::error::AppError;
use cbt_backend::routes;
use cbt_backend::state::AppState;
use cbt_backend::store::SqliteStore;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load configuration from environment (.env included)
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    if let Err(e) = run(config).await {
        tracing::error!("Server stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), AppError> {
    if config.uses_dev_secret() {
        tracing::warn!("JWT_SECRET not set, signing tokens with the development key");
    }

    // Connect and migrate before anything touches the store
    let store = SqliteStore::connect(&config.database_url).await?;

    let state = AppState::new(Arc::new(store), config.clone());

    // Admin bootstrap completes before the listener accepts traffic
    state
        .credentials
        .bootstrap_admin(
            &config.admin_name,
            &config.admin_email,
            config.admin_password.as_deref(),
            DEFAULT_ADMIN_PASSWORD,
        )
        .await?;

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::InternalServerError(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!("CBT backend listening on {}", addr);

    // Start the server
    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))
}
