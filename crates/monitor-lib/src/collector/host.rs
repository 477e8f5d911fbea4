//! Host resource collection
//!
//! Reads load and memory figures from procfs and sizes the root
//! volume with `df -B1`. Each probe degrades independently: a failed
//! read leaves its section of the snapshot `None` and the other
//! sections intact.

use std::path::PathBuf;

use tokio::fs;
use tokio::process::Command;
use tracing::warn;

use crate::models::{CpuReading, DiskReading, HostSnapshot, MemoryReading};

pub struct HostCollector {
    proc_path: PathBuf,
    root_mount: String,
}

impl HostCollector {
    pub fn new() -> Self {
        Self {
            proc_path: PathBuf::from("/proc"),
            root_mount: "/".to_string(),
        }
    }

    /// Create a collector with a custom proc path (for testing).
    pub fn with_proc_path(proc_path: impl Into<PathBuf>) -> Self {
        Self {
            proc_path: proc_path.into(),
            root_mount: "/".to_string(),
        }
    }

    pub async fn collect(&self) -> HostSnapshot {
        HostSnapshot {
            cpu: self.cpu_reading().await,
            memory: self.memory_reading().await,
            disk: self.disk_reading().await,
        }
    }

    async fn cpu_reading(&self) -> Option<CpuReading> {
        let loadavg = match fs::read_to_string(self.proc_path.join("loadavg")).await {
            Ok(content) => content,
            Err(err) => {
                warn!(error = %err, "Failed to read loadavg");
                return None;
            }
        };
        let cpuinfo = match fs::read_to_string(self.proc_path.join("cpuinfo")).await {
            Ok(content) => content,
            Err(err) => {
                warn!(error = %err, "Failed to read cpuinfo");
                return None;
            }
        };

        let load_1min = parse_loadavg(&loadavg)?;
        let cpus = count_cpus(&cpuinfo);
        if cpus == 0 {
            return None;
        }

        Some(CpuReading {
            load_1min,
            percent: load_1min / cpus as f64 * 100.0,
        })
    }

    async fn memory_reading(&self) -> Option<MemoryReading> {
        let meminfo = match fs::read_to_string(self.proc_path.join("meminfo")).await {
            Ok(content) => content,
            Err(err) => {
                warn!(error = %err, "Failed to read meminfo");
                return None;
            }
        };

        let (total, available) = parse_meminfo(&meminfo)?;
        if total == 0 {
            return None;
        }
        let used = total.saturating_sub(available);

        Some(MemoryReading {
            total_bytes: total,
            used_bytes: used,
            percent: used as f64 / total as f64 * 100.0,
        })
    }

    async fn disk_reading(&self) -> Option<DiskReading> {
        let output = match Command::new("df")
            .args(["-B1", &self.root_mount])
            .output()
            .await
        {
            Ok(output) if output.status.success() => output,
            Ok(output) => {
                warn!(status = %output.status, "df exited with failure");
                return None;
            }
            Err(err) => {
                warn!(error = %err, "Failed to run df");
                return None;
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let (total, used) = parse_df_output(&stdout)?;
        if total == 0 {
            return None;
        }

        Some(DiskReading {
            total_bytes: total,
            used_bytes: used,
            percent: used as f64 / total as f64 * 100.0,
        })
    }
}

impl Default for HostCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the 1-minute load average from /proc/loadavg.
pub fn parse_loadavg(content: &str) -> Option<f64> {
    content
        .split_whitespace()
        .next()
        .and_then(|v| v.parse().ok())
}

/// Count logical CPUs by counting processor lines in /proc/cpuinfo.
pub fn count_cpus(cpuinfo: &str) -> usize {
    cpuinfo
        .lines()
        .filter(|line| line.starts_with("processor"))
        .count()
}

/// Extract (MemTotal, MemAvailable) in bytes from /proc/meminfo.
pub fn parse_meminfo(content: &str) -> Option<(u64, u64)> {
    let mut total = None;
    let mut available = None;

    for line in content.lines() {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("MemTotal:") => total = parts.next().and_then(|v| v.parse::<u64>().ok()),
            Some("MemAvailable:") => {
                available = parts.next().and_then(|v| v.parse::<u64>().ok())
            }
            _ => {}
        }
    }

    // meminfo reports kB
    Some((total? * 1024, available? * 1024))
}

/// Extract (total, used) bytes for the first filesystem row of `df -B1`.
pub fn parse_df_output(output: &str) -> Option<(u64, u64)> {
    let row = output.lines().nth(1)?;
    let mut parts = row.split_whitespace();
    let _filesystem = parts.next()?;
    let total = parts.next()?.parse().ok()?;
    let used = parts.next()?.parse().ok()?;
    Some((total, used))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMINFO: &str = "MemTotal:       16384000 kB\n\
                           MemFree:         1024000 kB\n\
                           MemAvailable:    8192000 kB\n\
                           Buffers:          512000 kB\n";

    const CPUINFO: &str = "processor\t: 0\nmodel name\t: test cpu\n\
                           processor\t: 1\nmodel name\t: test cpu\n\
                           processor\t: 2\nmodel name\t: test cpu\n\
                           processor\t: 3\nmodel name\t: test cpu\n";

    const DF_OUTPUT: &str = "Filesystem        1B-blocks        Used   Available Use% Mounted on\n\
                             /dev/sda1      500000000000 100000000000 400000000000  20% /\n";

    #[test]
    fn test_parse_loadavg() {
        assert_eq!(parse_loadavg("2.45 1.87 1.52 3/1234 5678\n"), Some(2.45));
        assert_eq!(parse_loadavg(""), None);
        assert_eq!(parse_loadavg("garbage"), None);
    }

    #[test]
    fn test_count_cpus() {
        assert_eq!(count_cpus(CPUINFO), 4);
        assert_eq!(count_cpus(""), 0);
    }

    #[test]
    fn test_parse_meminfo() {
        let (total, available) = parse_meminfo(MEMINFO).unwrap();
        assert_eq!(total, 16_384_000 * 1024);
        assert_eq!(available, 8_192_000 * 1024);
    }

    #[test]
    fn test_parse_meminfo_missing_fields() {
        assert_eq!(parse_meminfo("MemTotal:       16384000 kB\n"), None);
        assert_eq!(parse_meminfo(""), None);
    }

    #[test]
    fn test_parse_df_output() {
        let (total, used) = parse_df_output(DF_OUTPUT).unwrap();
        assert_eq!(total, 500_000_000_000);
        assert_eq!(used, 100_000_000_000);
    }

    #[test]
    fn test_parse_df_output_header_only() {
        assert_eq!(parse_df_output("Filesystem 1B-blocks Used Available\n"), None);
    }

    #[tokio::test]
    async fn test_collect_from_fixture_proc() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("loadavg"), "2.0 1.0 0.5 1/100 200\n").unwrap();
        std::fs::write(dir.path().join("cpuinfo"), CPUINFO).unwrap();
        std::fs::write(dir.path().join("meminfo"), MEMINFO).unwrap();

        let collector = HostCollector::with_proc_path(dir.path());
        let snapshot = collector.collect().await;

        let cpu = snapshot.cpu.unwrap();
        assert_eq!(cpu.load_1min, 2.0);
        // 2.0 load across 4 cpus
        assert_eq!(cpu.percent, 50.0);

        let memory = snapshot.memory.unwrap();
        assert_eq!(memory.total_bytes, 16_384_000 * 1024);
        assert!((memory.percent - 50.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_collect_degrades_per_probe() {
        let dir = tempfile::tempdir().unwrap();
        // only meminfo present; cpu probe must fail without taking memory down
        std::fs::write(dir.path().join("meminfo"), MEMINFO).unwrap();

        let collector = HostCollector::with_proc_path(dir.path());
        let snapshot = collector.collect().await;

        assert!(snapshot.cpu.is_none());
        assert!(snapshot.memory.is_some());
    }
}
