//! Booking Engine Binary
//!
//! Starts the FX trade booking engine.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin booking-engine [config.yaml]
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: log filter (default: info)

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;

use booking_engine::config::load_config;
use booking_engine::infrastructure::http::{create_router, AppState};
use booking_engine::telemetry::init_telemetry;
use booking_engine::{SqliteStore, TradeService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_telemetry();

    let config_path = std::env::args().nth(1);
    let config = load_config(config_path.as_deref()).context("loading configuration")?;

    tracing::info!(
        db_path = %config.storage.db_path,
        http_port = config.server.http_port,
        "starting booking engine"
    );

    if let Some(parent) = std::path::Path::new(&config.storage.db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating data directory {}", parent.display()))?;
        }
    }

    let store = Arc::new(
        SqliteStore::open(&config.storage.db_path, config.storage.busy_timeout())
            .context("opening trade database")?,
    );
    let service = Arc::new(TradeService::new(
        Arc::clone(&store),
        Arc::clone(&store),
        Arc::clone(&store),
        config.limits.clone(),
    ));

    let state = AppState {
        service,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    let router = create_router(state);

    let addr = format!("{}:{}", config.server.bind_address, config.server.http_port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(addr = %addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server")?;

    tracing::info!("booking engine stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}
