//! Component health tracking for the liveness and readiness endpoints
//!
//! Collectors report themselves healthy or degraded after each fetch;
//! a degraded collector means fewer alerts for its category, never an
//! error page, so the service stays live either way.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub checked_at: i64,
}

impl ComponentHealth {
    fn healthy() -> Self {
        Self {
            status: ComponentStatus::Healthy,
            detail: None,
            checked_at: chrono::Utc::now().timestamp(),
        }
    }

    fn degraded(detail: impl Into<String>) -> Self {
        Self {
            status: ComponentStatus::Degraded,
            detail: Some(detail.into()),
            checked_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Component names tracked by the registry.
pub mod components {
    pub const HOST: &str = "host";
    pub const GPU: &str = "gpu";
    pub const WORKLOADS: &str = "workloads";
    pub const HISTORY: &str = "history";
}

/// Aggregate health report served at /healthz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
}

/// Readiness report served at /readyz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Readiness {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    components: Arc<RwLock<HashMap<String, ComponentHealth>>>,
    ready: Arc<RwLock<bool>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, name: &str) {
        let mut components = self.components.write().await;
        components.insert(name.to_string(), ComponentHealth::healthy());
    }

    pub async fn set_healthy(&self, name: &str) {
        let mut components = self.components.write().await;
        components.insert(name.to_string(), ComponentHealth::healthy());
    }

    pub async fn set_degraded(&self, name: &str, detail: impl Into<String>) {
        let mut components = self.components.write().await;
        components.insert(name.to_string(), ComponentHealth::degraded(detail));
    }

    pub async fn set_ready(&self, ready: bool) {
        *self.ready.write().await = ready;
    }

    /// Aggregate report: degraded if any component is degraded.
    pub async fn report(&self) -> HealthReport {
        let components = self.components.read().await.clone();
        let status = if components
            .values()
            .any(|c| c.status == ComponentStatus::Degraded)
        {
            ComponentStatus::Degraded
        } else {
            ComponentStatus::Healthy
        };
        HealthReport { status, components }
    }

    pub async fn readiness(&self) -> Readiness {
        if *self.ready.read().await {
            Readiness {
                ready: true,
                reason: None,
            }
        } else {
            Readiness {
                ready: false,
                reason: Some("Server not yet initialized".to_string()),
            }
        }
    }
}
