//! Chart history series from the Prometheus HTTP API
//!
//! Runs a fixed set of range queries over a configurable window and
//! reshapes the first matching series into the label/value arrays the
//! dashboard charts consume. A failed query degrades to an empty
//! series for that chart only.

use chrono::{Local, TimeZone, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

const CPU_QUERY: &str = r#"100 - (avg(rate(node_cpu_seconds_total{mode="idle"}[1m])) * 100)"#;
const MEMORY_QUERY: &str =
    "100 - (node_memory_MemAvailable_bytes / node_memory_MemTotal_bytes * 100)";
const DISK_QUERY: &str = r#"100 - (node_filesystem_avail_bytes{mountpoint="/"} / node_filesystem_size_bytes{mountpoint="/"} * 100)"#;
const GPU_UTIL_QUERY: &str = "avg(DCGM_FI_DEV_GPU_UTIL)";
const GPU_MEM_QUERY: &str = "avg(DCGM_FI_DEV_FB_USED)";
const GPU_TEMP_QUERY: &str = "avg(DCGM_FI_DEV_GPU_TEMP)";

const DEFAULT_WINDOW_SECS: u64 = 30 * 60;
const DEFAULT_STEP_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("prometheus returned non-success status: {0}")]
    Status(String),
}

/// One chart's worth of points: formatted time labels plus values
/// rendered to one decimal, index-aligned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesData {
    pub labels: Vec<String>,
    pub data: Vec<String>,
}

/// The `/api/history` payload, one series per dashboard chart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryCharts {
    pub cpu: SeriesData,
    pub memory: SeriesData,
    pub disk: SeriesData,
    #[serde(rename = "gpuUtil")]
    pub gpu_util: SeriesData,
    #[serde(rename = "gpuMem")]
    pub gpu_mem: SeriesData,
    #[serde(rename = "gpuTemp")]
    pub gpu_temp: SeriesData,
}

impl HistoryCharts {
    /// True when every query came back empty or failed.
    pub fn is_empty(&self) -> bool {
        [
            &self.cpu,
            &self.memory,
            &self.disk,
            &self.gpu_util,
            &self.gpu_mem,
            &self.gpu_temp,
        ]
        .iter()
        .all(|s| s.labels.is_empty())
    }
}

pub struct HistoryClient {
    client: Client,
    base_url: String,
    window_secs: u64,
    step_secs: u64,
}

impl HistoryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            window_secs: DEFAULT_WINDOW_SECS,
            step_secs: DEFAULT_STEP_SECS,
        }
    }

    /// Override the query window and step.
    pub fn with_window(mut self, window_secs: u64, step_secs: u64) -> Self {
        self.window_secs = window_secs;
        self.step_secs = step_secs.max(1);
        self
    }

    /// Fetch all six chart series. Never fails the caller; each series
    /// degrades independently.
    pub async fn fetch(&self) -> HistoryCharts {
        HistoryCharts {
            cpu: self.series_or_empty("cpu", CPU_QUERY).await,
            memory: self.series_or_empty("memory", MEMORY_QUERY).await,
            disk: self.series_or_empty("disk", DISK_QUERY).await,
            gpu_util: self.series_or_empty("gpu_util", GPU_UTIL_QUERY).await,
            gpu_mem: self.series_or_empty("gpu_mem", GPU_MEM_QUERY).await,
            gpu_temp: self.series_or_empty("gpu_temp", GPU_TEMP_QUERY).await,
        }
    }

    async fn series_or_empty(&self, name: &str, query: &str) -> SeriesData {
        match self.query_range(query).await {
            Ok(series) => series,
            Err(err) => {
                warn!(series = name, error = %err, "History query failed");
                SeriesData::default()
            }
        }
    }

    async fn query_range(&self, query: &str) -> Result<SeriesData, HistoryError> {
        let end = Utc::now().timestamp();
        let start = end - self.window_secs as i64;
        let url = format!(
            "{}/api/v1/query_range",
            self.base_url.trim_end_matches('/')
        );

        let start = start.to_string();
        let end = end.to_string();
        let step = format!("{}s", self.step_secs);
        let response = self
            .client
            .get(url)
            .query(&[
                ("query", query),
                ("start", start.as_str()),
                ("end", end.as_str()),
                ("step", step.as_str()),
            ])
            .send()
            .await?
            .json::<RangeResponse>()
            .await?;

        if response.status != "success" {
            return Err(HistoryError::Status(response.status));
        }

        Ok(format_series(
            response
                .data
                .result
                .first()
                .map(|r| r.values.as_slice())
                .unwrap_or_default(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct RangeResponse {
    status: String,
    #[serde(default)]
    data: RangeData,
}

#[derive(Debug, Default, Deserialize)]
struct RangeData {
    #[serde(default)]
    result: Vec<RangeSeries>,
}

#[derive(Debug, Deserialize)]
struct RangeSeries {
    #[serde(default)]
    values: Vec<(f64, String)>,
}

/// Reshape Prometheus `[timestamp, "value"]` pairs into index-aligned
/// label/value arrays. Points with unparseable values are dropped.
fn format_series(values: &[(f64, String)]) -> SeriesData {
    let mut series = SeriesData::default();

    for (timestamp, raw) in values {
        let Ok(value) = raw.parse::<f64>() else {
            continue;
        };
        let Some(at) = Local.timestamp_opt(*timestamp as i64, 0).single() else {
            continue;
        };
        series.labels.push(at.format("%H:%M").to_string());
        series.data.push(format!("{value:.1}"));
    }

    series
}
