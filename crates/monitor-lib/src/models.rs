//! Core data models for the monitoring backend
//!
//! Snapshot types mirror the JSON the dashboard consumes; alert types
//! carry the fixed `title`/`desc`/`fix` field names the front end
//! expects.

use serde::{Deserialize, Serialize};

/// Point-in-time host resource readings.
///
/// Each section is `None` when the underlying probe failed, so a
/// degraded collector yields fewer alerts rather than an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostSnapshot {
    pub cpu: Option<CpuReading>,
    pub memory: Option<MemoryReading>,
    pub disk: Option<DiskReading>,
}

impl HostSnapshot {
    /// CPU usage percent, if the probe succeeded and produced a finite value.
    pub fn cpu_percent(&self) -> Option<f64> {
        self.cpu.as_ref().map(|c| c.percent).filter(|p| p.is_finite())
    }

    /// Memory usage percent, if the probe succeeded and produced a finite value.
    pub fn memory_percent(&self) -> Option<f64> {
        self.memory
            .as_ref()
            .map(|m| m.percent)
            .filter(|p| p.is_finite())
    }

    /// Disk usage percent, if the probe succeeded and produced a finite value.
    pub fn disk_percent(&self) -> Option<f64> {
        self.disk
            .as_ref()
            .map(|d| d.percent)
            .filter(|p| p.is_finite())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuReading {
    pub load_1min: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryReading {
    #[serde(rename = "total")]
    pub total_bytes: u64,
    #[serde(rename = "used")]
    pub used_bytes: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskReading {
    #[serde(rename = "total")]
    pub total_bytes: u64,
    #[serde(rename = "used")]
    pub used_bytes: u64,
    pub percent: f64,
}

/// One accelerator device as reported by the driver, in device-index order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuDevice {
    pub name: String,
    #[serde(rename = "utilization")]
    pub utilization_percent: u32,
    #[serde(rename = "memoryUsed")]
    pub memory_used_mb: u64,
    #[serde(rename = "memoryTotal")]
    pub memory_total_mb: u64,
    #[serde(rename = "temperature")]
    pub temperature_c: i64,
}

/// Pod lifecycle phase as reported by the cluster.
///
/// Unrecognized phase strings map to `Unknown` rather than failing the
/// snapshot parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PodPhase {
    Running,
    Pending,
    Succeeded,
    Failed,
    Error,
    Unknown,
}

impl PodPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PodPhase::Running => "Running",
            PodPhase::Pending => "Pending",
            PodPhase::Succeeded => "Succeeded",
            PodPhase::Failed => "Failed",
            PodPhase::Error => "Error",
            PodPhase::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for PodPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for PodPhase {
    fn from(value: &str) -> Self {
        match value {
            "Running" => PodPhase::Running,
            "Pending" => PodPhase::Pending,
            "Succeeded" => PodPhase::Succeeded,
            "Failed" => PodPhase::Failed,
            "Error" => PodPhase::Error,
            _ => PodPhase::Unknown,
        }
    }
}

impl From<String> for PodPhase {
    fn from(value: String) -> Self {
        PodPhase::from(value.as_str())
    }
}

impl From<PodPhase> for String {
    fn from(value: PodPhase) -> Self {
        value.as_str().to_string()
    }
}

/// One workload instance observed in the current poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodInstance {
    pub namespace: String,
    pub name: String,
    #[serde(rename = "status")]
    pub phase: PodPhase,
    pub restarts: u32,
    pub age: String,
}

impl PodInstance {
    /// Identity key used for cross-poll state tracking.
    pub fn identity(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

/// Alert severity tier. Tiers are mutually exclusive per metric per
/// evaluation; the highest matching tier wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Minor,
    Serious,
    Critical,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Minor => write!(f, "minor"),
            Tier::Serious => write!(f, "serious"),
            Tier::Critical => write!(f, "critical"),
        }
    }
}

/// A single alert. Field names are fixed for dashboard compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub title: String,
    pub desc: String,
    pub fix: String,
}

impl Alert {
    pub fn new(
        title: impl Into<String>,
        desc: impl Into<String>,
        fix: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            desc: desc.into(),
            fix: fix.into(),
        }
    }
}

/// Tiered alert list, rebuilt fully on every evaluation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertBundle {
    pub minor: Vec<Alert>,
    pub serious: Vec<Alert>,
    pub critical: Vec<Alert>,
}

impl AlertBundle {
    pub fn push(&mut self, tier: Tier, alert: Alert) {
        match tier {
            Tier::Minor => self.minor.push(alert),
            Tier::Serious => self.serious.push(alert),
            Tier::Critical => self.critical.push(alert),
        }
    }

    /// Total alert count across all tiers.
    pub fn total(&self) -> usize {
        self.minor.len() + self.serious.len() + self.critical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
