//! Weather HTTP server binary.
//!
//! # Environment Variables
//!
//! - `WEATHERSTACK_KEY`: provider API key (overrides the config file)
//! - `WEATHER_DB`: SQLite history path
//! - `HOST` / `PORT`: bind address (default 0.0.0.0:8000)
//! - `RUST_LOG`: log filter (default: info)

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use weather_core::{Config, WeatherService};
use weather_server::{AppState, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = Config::load()?.with_env_overrides();
    let service = WeatherService::from_config(&config)?;
    let app = create_router(AppState::new(Arc::new(service)));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
    }
}
