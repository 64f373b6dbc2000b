//! HTTP API: classification, baseline, health checks and Prometheus metrics

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use txmon_lib::{
    health::{ComponentStatus, HealthRegistry},
    observability::{MonitorMetrics, StructuredLogger},
    MonitorError, MonitorRequest, MonitoringService, Verdict,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MonitoringService>,
    pub health_registry: HealthRegistry,
    pub metrics: MonitorMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        service: Arc<MonitoringService>,
        health_registry: HealthRegistry,
        metrics: MonitorMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            service,
            health_registry,
            metrics,
            logger,
        }
    }
}

async fn index() -> &'static str {
    "Transaction monitor is running. POST status counts to /monitor.\n"
}

/// Classify one live sample against the baseline
async fn monitor(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MonitorRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            let err = MonitorError::InvalidRequest(rejection.body_text());
            state.metrics.inc_rejected_requests();
            state.logger.log_rejected_request(&err.to_string());
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response();
        }
    };

    let started = Instant::now();
    let anomalies = state.service.anomalies(&request.counts);
    state
        .metrics
        .observe_classification_latency(started.elapsed().as_secs_f64());

    let verdict = Verdict::from_alerts(anomalies.iter().map(ToString::to_string).collect());
    state.metrics.record_verdict(verdict.recommendation, &anomalies);
    state.logger.log_anomalies(&anomalies);

    (StatusCode::OK, Json(verdict)).into_response()
}

/// Per-status mean and standard deviation
async fn baseline(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service.baseline().clone())
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

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

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    (
        StatusCode::OK,
        [("content-type", encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/monitor", post(monitor))
        .route("/baseline", get(baseline))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Serve the API until `shutdown` resolves
pub async fn serve<F>(port: u16, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
