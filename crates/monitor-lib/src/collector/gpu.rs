//! GPU device collection via nvidia-smi
//!
//! Queries the driver in CSV mode and parses one device per line,
//! preserving device-index order. A host without the binary (or with
//! no devices) yields an empty snapshot, not an error to the caller.

use tokio::process::Command;
use tracing::warn;

use super::CollectError;
use crate::models::GpuDevice;

const QUERY_FIELDS: &str = "index,name,utilization.gpu,memory.used,memory.total,temperature.gpu";

pub struct GpuCollector {
    binary: String,
}

impl GpuCollector {
    pub fn new() -> Self {
        Self {
            binary: "nvidia-smi".to_string(),
        }
    }

    pub async fn collect(&self) -> Result<Vec<GpuDevice>, CollectError> {
        let query_arg = format!("--query-gpu={QUERY_FIELDS}");
        let output = Command::new(&self.binary)
            .args([query_arg.as_str(), "--format=csv,noheader,nounits"])
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

        Ok(parse_gpu_csv(&String::from_utf8_lossy(&output.stdout)))
    }
}

impl Default for GpuCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse nvidia-smi CSV output (noheader, nounits), one device per line.
/// Malformed lines are skipped.
pub fn parse_gpu_csv(output: &str) -> Vec<GpuDevice> {
    let mut devices = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        // index, name, utilization, memory.used, memory.total, temperature
        if fields.len() < 6 {
            warn!(line, "Skipping malformed nvidia-smi line");
            continue;
        }

        let parsed = (
            fields[2].parse::<u32>(),
            fields[3].parse::<u64>(),
            fields[4].parse::<u64>(),
            fields[5].parse::<i64>(),
        );
        match parsed {
            (Ok(utilization), Ok(used), Ok(total), Ok(temperature)) => {
                devices.push(GpuDevice {
                    name: fields[1].to_string(),
                    utilization_percent: utilization,
                    memory_used_mb: used,
                    memory_total_mb: total,
                    temperature_c: temperature,
                });
            }
            _ => warn!(line, "Skipping malformed nvidia-smi line"),
        }
    }

    devices
}
