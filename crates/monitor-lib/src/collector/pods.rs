//! Workload instance collection via kubectl
//!
//! Lists pods across all namespaces and reduces each to the identity,
//! phase, summed restart count, and a human-readable age label the
//! dashboard shows.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::process::Command;

use super::CollectError;
use crate::models::{PodInstance, PodPhase};

pub struct PodCollector {
    binary: String,
}

impl PodCollector {
    pub fn new() -> Self {
        Self {
            binary: "kubectl".to_string(),
        }
    }

    pub async fn collect(&self) -> Result<Vec<PodInstance>, CollectError> {
        let output = Command::new(&self.binary)
            .args(["get", "pods", "-A", "-o", "json"])
            .output()
            .await
            .map_err(|source| CollectError::Spawn {
                command: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CollectError::CommandFailed {
                command: self.binary.clone(),
                status: output.status,
            });
        }

        let list: PodList =
            serde_json::from_slice(&output.stdout).map_err(|source| CollectError::Json {
                command: self.binary.clone(),
                source,
            })?;

        let now = Utc::now();
        Ok(list.items.into_iter().map(|item| to_instance(item, now)).collect())
    }
}

impl Default for PodCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct PodList {
    #[serde(default)]
    items: Vec<PodItem>,
}

#[derive(Debug, Deserialize)]
struct PodItem {
    metadata: PodMetadata,
    #[serde(default)]
    status: PodItemStatus,
}

#[derive(Debug, Deserialize)]
struct PodMetadata {
    #[serde(default)]
    namespace: String,
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PodItemStatus {
    phase: Option<String>,
    container_statuses: Option<Vec<ContainerStatus>>,
    start_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContainerStatus {
    #[serde(default)]
    restart_count: u32,
}

fn to_instance(item: PodItem, now: DateTime<Utc>) -> PodInstance {
    let restarts = item
        .status
        .container_statuses
        .unwrap_or_default()
        .iter()
        .map(|c| c.restart_count)
        .sum();

    let phase = item
        .status
        .phase
        .as_deref()
        .map(PodPhase::from)
        .unwrap_or(PodPhase::Unknown);

    let age = item
        .status
        .start_time
        .map(|started| age_label(now - started))
        .unwrap_or_else(|| "0m".to_string());

    PodInstance {
        namespace: item.metadata.namespace,
        name: item.metadata.name,
        phase,
        restarts,
        age,
    }
}

/// Format an elapsed duration the way the dashboard shows pod age:
/// `3d 4h`, `4h 21m`, or `21m`.
pub fn age_label(elapsed: Duration) -> String {
    let secs = elapsed.num_seconds().max(0);
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;

    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}
