//! Fixed-breakpoint classification for percent-valued host metrics
//!
//! Breakpoints are shared by CPU, memory, disk, and GPU memory
//! pressure; comparisons are strict, so a reading of exactly 85.0
//! classifies into the lower tier.

use crate::models::{Alert, AlertBundle, HostSnapshot, Tier};

pub(crate) const MINOR_PCT: f64 = 70.0;
pub(crate) const SERIOUS_PCT: f64 = 85.0;
pub(crate) const CRITICAL_PCT: f64 = 95.0;

/// Map a percent value to at most one severity tier.
///
/// `None` or non-finite input yields no tier; a failed collector must
/// not produce an alert or an error.
pub fn classify_percent(percent: Option<f64>) -> Option<Tier> {
    let p = percent.filter(|p| p.is_finite())?;
    if p > CRITICAL_PCT {
        Some(Tier::Critical)
    } else if p > SERIOUS_PCT {
        Some(Tier::Serious)
    } else if p > MINOR_PCT {
        Some(Tier::Minor)
    } else {
        None
    }
}

/// Evaluate the three host metrics against the shared breakpoints.
pub(crate) fn host_alerts(bundle: &mut AlertBundle, host: &HostSnapshot) {
    classify_metric(bundle, host.cpu_percent(), cpu_alert);
    classify_metric(bundle, host.memory_percent(), memory_alert);
    classify_metric(bundle, host.disk_percent(), disk_alert);
}

fn classify_metric(
    bundle: &mut AlertBundle,
    percent: Option<f64>,
    copy: fn(Tier, f64) -> Alert,
) {
    if let Some(p) = percent {
        if let Some(tier) = classify_percent(Some(p)) {
            bundle.push(tier, copy(tier, p));
        }
    }
}

fn cpu_alert(tier: Tier, percent: f64) -> Alert {
    let desc = format!("Current CPU usage {percent:.1}%");
    match tier {
        Tier::Critical => Alert::new(
            "CPU usage critically high",
            desc,
            "1. Check for runaway processes 2. Add CPU cores 3. Profile the heaviest services",
        ),
        Tier::Serious => Alert::new(
            "CPU usage high",
            desc,
            "1. Inspect the top CPU consumers 2. Consider scaling out 3. Rule out abusive traffic",
        ),
        Tier::Minor => Alert::new(
            "CPU usage elevated",
            desc,
            "Keep watching; scale up if the trend continues",
        ),
    }
}

fn memory_alert(tier: Tier, percent: f64) -> Alert {
    let desc = format!("Current memory usage {percent:.1}%");
    match tier {
        Tier::Critical => Alert::new(
            "Memory usage critically high",
            desc,
            "1. Drop page cache (echo 3 > /proc/sys/vm/drop_caches) 2. Restart the largest consumers 3. Add memory",
        ),
        Tier::Serious => Alert::new(
            "Memory usage high",
            desc,
            "1. Check for memory leaks 2. Add swap 3. Plan a memory upgrade",
        ),
        Tier::Minor => Alert::new(
            "Memory usage elevated",
            desc,
            "Watch the memory trend; expand if it keeps climbing",
        ),
    }
}

fn disk_alert(tier: Tier, percent: f64) -> Alert {
    let desc = format!("Disk usage {percent:.1}%");
    match tier {
        Tier::Critical => Alert::new(
            "Disk space critically low",
            desc,
            "1. Purge old logs now 2. Remove unused images and containers 3. Grow the volume",
        ),
        Tier::Serious => Alert::new(
            "Disk space running low",
            desc,
            "1. Clean up old logs 2. Delete temporary files 3. Plan a volume expansion",
        ),
        Tier::Minor => Alert::new(
            "Disk usage elevated",
            desc,
            "Watch disk growth and clean up periodically",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CpuReading, DiskReading, MemoryReading};

    #[test]
    fn test_classify_tiers() {
        assert_eq!(classify_percent(Some(96.0)), Some(Tier::Critical));
        assert_eq!(classify_percent(Some(90.0)), Some(Tier::Serious));
        assert_eq!(classify_percent(Some(75.0)), Some(Tier::Minor));
        assert_eq!(classify_percent(Some(50.0)), None);
        assert_eq!(classify_percent(Some(0.0)), None);
    }

    #[test]
    fn test_boundary_values_classify_into_lower_tier() {
        // Strict > comparisons: the breakpoint itself stays below
        assert_eq!(classify_percent(Some(70.0)), None);
        assert_eq!(classify_percent(Some(85.0)), Some(Tier::Minor));
        assert_eq!(classify_percent(Some(95.0)), Some(Tier::Serious));
    }

    #[test]
    fn test_absent_and_nan_produce_no_tier() {
        assert_eq!(classify_percent(None), None);
        assert_eq!(classify_percent(Some(f64::NAN)), None);
        assert_eq!(classify_percent(Some(f64::INFINITY)), None);
    }

    #[test]
    fn test_one_alert_per_metric() {
        let host = HostSnapshot {
            cpu: Some(CpuReading {
                load_1min: 7.8,
                percent: 97.0,
            }),
            memory: Some(MemoryReading {
                total_bytes: 100,
                used_bytes: 88,
                percent: 88.0,
            }),
            disk: Some(DiskReading {
                total_bytes: 100,
                used_bytes: 72,
                percent: 72.0,
            }),
        };

        let mut bundle = AlertBundle::default();
        host_alerts(&mut bundle, &host);

        // One alert each, in its own tier, never duplicated across tiers
        assert_eq!(bundle.critical.len(), 1);
        assert_eq!(bundle.serious.len(), 1);
        assert_eq!(bundle.minor.len(), 1);
        assert!(bundle.critical[0].title.contains("CPU"));
        assert!(bundle.serious[0].title.contains("Memory"));
        assert!(bundle.minor[0].title.contains("Disk"));
    }

    #[test]
    fn test_degraded_snapshot_yields_no_alerts() {
        let mut bundle = AlertBundle::default();
        host_alerts(&mut bundle, &HostSnapshot::default());
        assert!(bundle.is_empty());
    }

    #[test]
    fn test_desc_carries_the_observed_value() {
        let host = HostSnapshot {
            cpu: Some(CpuReading {
                load_1min: 7.8,
                percent: 97.25,
            }),
            memory: None,
            disk: None,
        };

        let mut bundle = AlertBundle::default();
        host_alerts(&mut bundle, &host);
        assert_eq!(bundle.critical[0].desc, "Current CPU usage 97.2%");
    }
}
