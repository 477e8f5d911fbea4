//! Monitoring backend library for the watchdeck dashboard
//!
//! This crate provides the core functionality for:
//! - Snapshot collection (host resources, GPU devices, cluster pods)
//! - Tiered alert evaluation with cross-poll pod state tracking
//! - Chart history from the Prometheus HTTP API
//! - Health checks and self-metrics

pub mod alerts;
pub mod collector;
pub mod health;
pub mod history;
pub mod models;
pub mod observability;

pub use alerts::{classify_percent, AlertEngine};
pub use collector::{SnapshotSource, SystemSource};
pub use health::{ComponentHealth, ComponentStatus, HealthRegistry, HealthReport, Readiness};
pub use history::{HistoryCharts, HistoryClient, SeriesData};
pub use models::*;
pub use observability::ServerMetrics;
