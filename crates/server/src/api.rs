//! HTTP dispatcher for the dashboard
//!
//! Routes snapshot, history, and alert requests to the collectors and
//! the rule engine, and serializes the results as JSON. Snapshot
//! endpoints never fail; a 500 can only come from a defect in the
//! evaluation logic itself.

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use monitor_lib::{
    health::components, AlertEngine, HealthRegistry, HistoryClient, ServerMetrics,
    SnapshotSource,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use tracing::{error, info};

/// Shared application state
pub struct AppState {
    pub source: Arc<dyn SnapshotSource>,
    pub engine: AlertEngine,
    pub history: HistoryClient,
    pub health: HealthRegistry,
    pub metrics: ServerMetrics,
    pub dashboard_path: PathBuf,
}

/// Dashboard page; the HTML lives next to the binary and is re-read
/// per request so it can be edited without a restart.
async fn dashboard(State(state): State<Arc<AppState>>) -> Response {
    match tokio::fs::read_to_string(&state.dashboard_path).await {
        Ok(content) => Html(content).into_response(),
        Err(err) => {
            error!(path = %state.dashboard_path.display(), error = %err, "Dashboard page unavailable");
            (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "dashboard page not found"})),
            )
                .into_response()
        }
    }
}

async fn host_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.source.host().await)
}

async fn gpu_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.source.gpus().await)
}

async fn pods(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.source.pods().await)
}

async fn history(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let charts = state.history.fetch().await;

    if charts.is_empty() {
        state
            .health
            .set_degraded(components::HISTORY, "no data from prometheus")
            .await;
    } else {
        state.health.set_healthy(components::HISTORY).await;
    }

    Json(charts)
}

/// One full fetch-then-evaluate cycle.
///
/// Snapshot fetches run concurrently and degrade individually; the
/// evaluation itself must not raise, but a defect in it is caught here
/// and reported as a 500 rather than tearing down the connection.
async fn alerts(State(state): State<Arc<AppState>>) -> Response {
    let (host, gpus, pods) = tokio::join!(
        state.source.host(),
        state.source.gpus(),
        state.source.pods()
    );

    let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
        state.engine.evaluate(&host, &gpus, &pods)
    }));

    match result {
        Ok(bundle) => {
            state.metrics.inc_evaluations();
            state.metrics.set_alerts(&bundle);
            state.metrics.set_pods_tracked(state.engine.tracked_pods() as i64);
            Json(bundle).into_response()
        }
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "alert evaluation failed".to_string());
            error!(reason = %message, "Alert evaluation panicked");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": message})),
            )
                .into_response()
        }
    }
}

async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // Degraded collectors still serve traffic, so this stays 200
    Json(state.health.report().await)
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health.readiness().await;
    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder.encode(&metric_families, &mut buffer).unwrap();

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// The dashboard may be served from another origin.
async fn cors(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        header::HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        header::HeaderValue::from_static("GET, OPTIONS"),
    );
    response
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/monitor.html", get(dashboard))
        .route("/api/host/metrics", get(host_metrics))
        .route("/api/gpu/metrics", get(gpu_metrics))
        .route("/api/k8s/pods", get(pods))
        .route("/api/history", get(history))
        .route("/api/alerts", get(alerts))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
