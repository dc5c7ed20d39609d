// =============================================================================
// Meridian — Main Entry Point
// =============================================================================
//
// Boots the prediction engine: loads configuration, wires the five source
// fetchers and the aggregator into shared state, then serves the REST API
// until Ctrl+C.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod analysis;
mod api;
mod app_state;
mod cache;
mod config;
mod indicators;
mod monitor;
mod prediction;
mod sentiment;
mod service;
mod sources;
mod types;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::config::EngineConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & logging ─────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║       Meridian Prediction Engine - Starting Up           ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    // ── 2. Configuration ─────────────────────────────────────────────────
    let config_path =
        std::env::var("MERIDIAN_CONFIG").unwrap_or_else(|_| "meridian.json".into());
    let mut config = EngineConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, path = %config_path, "Failed to load config, using defaults");
        let defaults = EngineConfig::default();
        // Write the defaults out so operators have a file to edit.
        if let Err(e) = defaults.save(&config_path) {
            warn!(error = %e, "Failed to write default config");
        }
        defaults
    });

    // Override bind address from env if available.
    if let Ok(addr) = std::env::var("MERIDIAN_BIND_ADDR") {
        config.bind_addr = addr;
    }

    let news_api_key = std::env::var("CRYPTOPANIC_API_KEY")
        .ok()
        .filter(|key| !key.is_empty());
    if news_api_key.is_some() {
        info!("News sentiment source enabled");
    } else {
        warn!("CRYPTOPANIC_API_KEY not set, news sentiment will report neutral");
    }

    info!(
        bind_addr = %config.bind_addr,
        default_days = config.default_days,
        history_days = config.history_days,
        "Engine configured"
    );

    // ── 3. Shared state ──────────────────────────────────────────────────
    let state = Arc::new(AppState::new(config, news_api_key));

    // ── 4. REST API server ───────────────────────────────────────────────
    let bind_addr = state.config.bind_addr.clone();
    let app = api::rest::router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Meridian shut down complete.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    } else {
        warn!("Shutdown signal received, stopping gracefully");
    }
}
