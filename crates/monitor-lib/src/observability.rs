//! Prometheus self-metrics for the monitoring backend
//!
//! Registered once into the default registry and exposed at /metrics.

use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec,
    register_int_gauge, register_int_gauge_vec, HistogramVec, IntCounter, IntCounterVec,
    IntGauge, IntGaugeVec,
};
use std::sync::OnceLock;

use crate::models::AlertBundle;

/// Histogram buckets for snapshot fetch latency (seconds); the pod
/// fetch shells out to kubectl, so the tail is long.
const POLL_LATENCY_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

static GLOBAL_METRICS: OnceLock<MetricsInner> = OnceLock::new();

struct MetricsInner {
    poll_latency_seconds: HistogramVec,
    evaluations_total: IntCounter,
    collect_errors_total: IntCounterVec,
    alerts_active: IntGaugeVec,
    pods_tracked: IntGauge,
}

impl MetricsInner {
    fn new() -> Self {
        Self {
            poll_latency_seconds: register_histogram_vec!(
                "watchdeck_poll_latency_seconds",
                "Time spent fetching one snapshot category",
                &["source"],
                POLL_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register poll_latency_seconds"),

            evaluations_total: register_int_counter!(
                "watchdeck_evaluations_total",
                "Total number of alert evaluations"
            )
            .expect("Failed to register evaluations_total"),

            collect_errors_total: register_int_counter_vec!(
                "watchdeck_collect_errors_total",
                "Snapshot fetches that degraded",
                &["source"]
            )
            .expect("Failed to register collect_errors_total"),

            alerts_active: register_int_gauge_vec!(
                "watchdeck_alerts_active",
                "Alerts in the most recent evaluation, by tier",
                &["tier"]
            )
            .expect("Failed to register alerts_active"),

            pods_tracked: register_int_gauge!(
                "watchdeck_pods_tracked",
                "Pod identities retained for transition detection"
            )
            .expect("Failed to register pods_tracked"),
        }
    }
}

/// Lightweight handle to the global metrics instance; clones share the
/// underlying metrics.
#[derive(Clone)]
pub struct ServerMetrics {
    _private: (),
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(MetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &MetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_poll_latency(&self, source: &str, duration_secs: f64) {
        self.inner()
            .poll_latency_seconds
            .with_label_values(&[source])
            .observe(duration_secs);
    }

    pub fn inc_evaluations(&self) {
        self.inner().evaluations_total.inc();
    }

    pub fn inc_collect_errors(&self, source: &str) {
        self.inner()
            .collect_errors_total
            .with_label_values(&[source])
            .inc();
    }

    /// Publish per-tier counts from the latest evaluation.
    pub fn set_alerts(&self, bundle: &AlertBundle) {
        let gauges = self.inner();
        gauges
            .alerts_active
            .with_label_values(&["minor"])
            .set(bundle.minor.len() as i64);
        gauges
            .alerts_active
            .with_label_values(&["serious"])
            .set(bundle.serious.len() as i64);
        gauges
            .alerts_active
            .with_label_values(&["critical"])
            .set(bundle.critical.len() as i64);
    }

    pub fn set_pods_tracked(&self, count: i64) {
        self.inner().pods_tracked.set(count);
    }
}
