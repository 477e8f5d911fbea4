//! Server configuration

use anyhow::Result;
use serde::Deserialize;

/// Server configuration, read from `WATCHDECK_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Listen port for the dashboard API
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Base URL of the Prometheus instance backing the history charts
    #[serde(default = "default_prometheus_url")]
    pub prometheus_url: String,

    /// Path to the dashboard HTML served at /
    #[serde(default = "default_dashboard_path")]
    pub dashboard_path: String,

    /// History chart window in seconds
    #[serde(default = "default_history_window")]
    pub history_window_secs: u64,

    /// History chart resolution in seconds
    #[serde(default = "default_history_step")]
    pub history_step_secs: u64,
}

fn default_listen_port() -> u16 {
    8888
}

fn default_prometheus_url() -> String {
    "http://localhost:9090".to_string()
}

fn default_dashboard_path() -> String {
    "monitor.html".to_string()
}

fn default_history_window() -> u64 {
    30 * 60
}

fn default_history_step() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_port: default_listen_port(),
            prometheus_url: default_prometheus_url(),
            dashboard_path: default_dashboard_path(),
            history_window_secs: default_history_window(),
            history_step_secs: default_history_step(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the environment, falling back to
    /// defaults when nothing is set.
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("WATCHDECK"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }
}
