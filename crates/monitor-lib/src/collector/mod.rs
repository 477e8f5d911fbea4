//! Snapshot collection from the host, the GPU driver, and the cluster
//!
//! Collectors are deliberately forgiving: a missing binary, an
//! unreadable proc file, or malformed output degrades the snapshot
//! (empty list, `None` readings) and marks the component degraded in
//! the health registry. No collector failure ever reaches the alert
//! engine as an error.

mod gpu;
mod host;
mod pods;

pub use gpu::GpuCollector;
pub use host::HostCollector;
pub use pods::PodCollector;

use crate::health::{components, HealthRegistry};
use crate::models::{GpuDevice, HostSnapshot, PodInstance};
use crate::observability::ServerMetrics;

use thiserror::Error;
use tracing::warn;

pub use async_trait::async_trait;

/// Failure inside a subprocess-backed collector. Recovered before the
/// snapshot leaves the collector layer.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{command} exited with {status}")]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
    },
    #[error("invalid json from {command}: {source}")]
    Json {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Source of the three point-in-time snapshots the dispatcher feeds
/// into the alert engine. Implementations never fail the caller.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn host(&self) -> HostSnapshot;
    async fn gpus(&self) -> Vec<GpuDevice>;
    async fn pods(&self) -> Vec<PodInstance>;
}

/// Production source backed by `/proc`, `nvidia-smi`, and `kubectl`.
pub struct SystemSource {
    host: HostCollector,
    gpu: GpuCollector,
    pods: PodCollector,
    health: HealthRegistry,
    metrics: ServerMetrics,
}

impl SystemSource {
    pub fn new(health: HealthRegistry, metrics: ServerMetrics) -> Self {
        Self {
            host: HostCollector::new(),
            gpu: GpuCollector::new(),
            pods: PodCollector::new(),
            health,
            metrics,
        }
    }
}

#[async_trait]
impl SnapshotSource for SystemSource {
    async fn host(&self) -> HostSnapshot {
        let started = std::time::Instant::now();
        let snapshot = self.host.collect().await;
        self.metrics
            .observe_poll_latency(components::HOST, started.elapsed().as_secs_f64());

        if snapshot.cpu.is_none() || snapshot.memory.is_none() || snapshot.disk.is_none() {
            self.metrics.inc_collect_errors(components::HOST);
            self.health
                .set_degraded(components::HOST, "one or more host probes failed")
                .await;
        } else {
            self.health.set_healthy(components::HOST).await;
        }
        snapshot
    }

    async fn gpus(&self) -> Vec<GpuDevice> {
        let started = std::time::Instant::now();
        let result = self.gpu.collect().await;
        self.metrics
            .observe_poll_latency(components::GPU, started.elapsed().as_secs_f64());

        match result {
            Ok(devices) => {
                self.health.set_healthy(components::GPU).await;
                devices
            }
            Err(err) => {
                warn!(error = %err, "GPU snapshot unavailable");
                self.metrics.inc_collect_errors(components::GPU);
                self.health
                    .set_degraded(components::GPU, err.to_string())
                    .await;
                Vec::new()
            }
        }
    }

    async fn pods(&self) -> Vec<PodInstance> {
        let started = std::time::Instant::now();
        let result = self.pods.collect().await;
        self.metrics
            .observe_poll_latency(components::WORKLOADS, started.elapsed().as_secs_f64());

        match result {
            Ok(pods) => {
                self.health.set_healthy(components::WORKLOADS).await;
                pods
            }
            Err(err) => {
                warn!(error = %err, "Pod snapshot unavailable");
                self.metrics.inc_collect_errors(components::WORKLOADS);
                self.health
                    .set_degraded(components::WORKLOADS, err.to_string())
                    .await;
                Vec::new()
            }
        }
    }
}
