//! Watchdeck - monitoring dashboard backend
//!
//! Polls host resources, GPU devices, and cluster pods, evaluates
//! tiered alerts with cross-poll state tracking, and serves the
//! results as JSON for the dashboard front end.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use monitor_lib::{
    health::components, AlertEngine, HealthRegistry, HistoryClient, ServerMetrics, SystemSource,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!(version = SERVER_VERSION, "Starting watchdeck");

    // Load configuration
    let config = config::ServerConfig::load()?;
    info!(
        port = config.listen_port,
        prometheus = %config.prometheus_url,
        "Server configured"
    );

    // Initialize health registry
    let health = HealthRegistry::new();
    health.register(components::HOST).await;
    health.register(components::GPU).await;
    health.register(components::WORKLOADS).await;
    health.register(components::HISTORY).await;

    // Initialize metrics
    let metrics = ServerMetrics::new();

    // Wire up the collectors, engine, and history client
    let source = Arc::new(SystemSource::new(health.clone(), metrics.clone()));
    let history = HistoryClient::new(&config.prometheus_url)
        .with_window(config.history_window_secs, config.history_step_secs);

    let state = Arc::new(api::AppState {
        source,
        engine: AlertEngine::new(),
        history,
        health: health.clone(),
        metrics,
        dashboard_path: PathBuf::from(&config.dashboard_path),
    });

    // Mark server as ready once wiring is complete
    health.set_ready(true).await;

    // Start the API server
    let api_handle = tokio::spawn(api::serve(config.listen_port, state));

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("SIGINT received, shutting down");
        }
        result = api_handle => {
            result??;
        }
    }

    Ok(())
}
