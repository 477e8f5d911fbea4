//! Alert rule engine
//!
//! Consumes the three current snapshots plus the pod state retained
//! from the previous poll and produces a tiered alert list. Tier
//! assignment depends only on the current snapshots and the
//! immediately preceding poll's retained state.

mod gpu;
mod threshold;
mod workload;

pub use threshold::classify_percent;
pub use workload::PodState;

use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::{AlertBundle, GpuDevice, HostSnapshot, PodInstance};

/// Evaluates alert rules over fresh snapshots, retaining pod state
/// between evaluations.
///
/// The retained map is owned here and never exposed mutably; it is
/// keyed by `namespace/name` and replaced wholesale on every
/// evaluation, so it never outgrows the live fleet.
pub struct AlertEngine {
    retained: Mutex<HashMap<String, PodState>>,
}

impl AlertEngine {
    pub fn new() -> Self {
        Self {
            retained: Mutex::new(HashMap::new()),
        }
    }

    /// Run one full evaluation and return the rebuilt bundle.
    ///
    /// The host and GPU passes are pure functions of their snapshots.
    /// The workload pass holds the store lock for its whole
    /// read-then-write span, so overlapping evaluations cannot tear a
    /// restart-count delta.
    pub fn evaluate(
        &self,
        host: &HostSnapshot,
        gpus: &[GpuDevice],
        pods: &[PodInstance],
    ) -> AlertBundle {
        let mut bundle = AlertBundle::default();

        threshold::host_alerts(&mut bundle, host);
        gpu::gpu_alerts(&mut bundle, gpus);

        {
            let mut retained = self.retained.lock().unwrap();
            workload::workload_alerts(&mut bundle, &mut retained, pods);
        }

        bundle
    }

    /// Number of pod identities currently retained.
    pub fn tracked_pods(&self) -> usize {
        self.retained.lock().unwrap().len()
    }
}

impl Default for AlertEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CpuReading, DiskReading, MemoryReading, PodPhase};

    fn host(cpu: f64, mem: f64, disk: f64) -> HostSnapshot {
        HostSnapshot {
            cpu: Some(CpuReading {
                load_1min: 0.0,
                percent: cpu,
            }),
            memory: Some(MemoryReading {
                total_bytes: 100,
                used_bytes: mem as u64,
                percent: mem,
            }),
            disk: Some(DiskReading {
                total_bytes: 100,
                used_bytes: disk as u64,
                percent: disk,
            }),
        }
    }

    #[test]
    fn test_end_to_end_scenario() {
        let engine = AlertEngine::new();

        let gpus = vec![GpuDevice {
            name: "A100".to_string(),
            utilization_percent: 50,
            memory_used_mb: 90,
            memory_total_mb: 100,
            temperature_c: 90,
        }];
        let pods = vec![PodInstance {
            namespace: "default".to_string(),
            name: "job-1".to_string(),
            phase: PodPhase::Failed,
            restarts: 0,
            age: "1m".to_string(),
        }];

        let bundle = engine.evaluate(&host(97.0, 60.0, 40.0), &gpus, &pods);

        // cpu critical, gpu memory serious (90%), gpu temp critical,
        // failed pod critical; no transition alerts on first sighting
        assert_eq!(bundle.critical.len(), 3);
        assert_eq!(bundle.serious.len(), 1);
        assert!(bundle.minor.is_empty());

        assert!(bundle.critical[0].title.contains("CPU"));
        assert!(bundle.serious[0].title.contains("GPU memory"));
        assert!(bundle.critical[1].title.contains("GPU temperature"));
        assert_eq!(bundle.critical[2].title, "Pod unhealthy: job-1");
    }

    #[test]
    fn test_second_identical_evaluation_repeats_only_stateless_alerts() {
        let engine = AlertEngine::new();
        let pods = vec![PodInstance {
            namespace: "default".to_string(),
            name: "job-1".to_string(),
            phase: PodPhase::Running,
            restarts: 2,
            age: "1m".to_string(),
        }];

        let first = engine.evaluate(&host(97.0, 60.0, 40.0), &[], &pods);
        // threshold alert, plus seed recovery and seed restart
        assert_eq!(first.critical.len(), 1);
        assert_eq!(first.serious.len(), 2);

        let second = engine.evaluate(&host(97.0, 60.0, 40.0), &[], &pods);
        // threshold alert repeats; the transition alerts do not
        assert_eq!(second.critical.len(), 1);
        assert!(second.serious.is_empty());
    }

    #[test]
    fn test_empty_snapshots_yield_empty_bundle() {
        let engine = AlertEngine::new();
        let bundle = engine.evaluate(&HostSnapshot::default(), &[], &[]);
        assert!(bundle.is_empty());
        assert_eq!(engine.tracked_pods(), 0);
    }

    #[test]
    fn test_tracked_pods_follows_the_fleet() {
        let engine = AlertEngine::new();
        let pods: Vec<PodInstance> = (0..3)
            .map(|i| PodInstance {
                namespace: "default".to_string(),
                name: format!("job-{i}"),
                phase: PodPhase::Running,
                restarts: 0,
                age: "1m".to_string(),
            })
            .collect();

        engine.evaluate(&HostSnapshot::default(), &[], &pods);
        assert_eq!(engine.tracked_pods(), 3);

        engine.evaluate(&HostSnapshot::default(), &[], &pods[..1]);
        assert_eq!(engine.tracked_pods(), 1);
    }
}
