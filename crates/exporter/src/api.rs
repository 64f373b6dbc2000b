//! Metrics and health endpoints for the exporter

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use tracing::{error, info};
use txmon_lib::health::{ComponentStatus, HealthRegistry};

async fn healthz(State(health): State<HealthRegistry>) -> impl IntoResponse {
    let health = health.health().await;

    let status_code = match health.status {
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };

    (status_code, Json(health))
}

async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
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

pub fn create_router(health: HealthRegistry) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .with_state(health)
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(port: u16, health: HealthRegistry, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting metrics server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, create_router(health))
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;
    use txmon_lib::health::Component;
    use txmon_lib::replay::TransactionGauges;

    #[tokio::test]
    async fn test_metrics_expose_transaction_gauges() {
        let gauges = TransactionGauges::register(prometheus::default_registry()).unwrap();
        gauges.apply("denied", 4.0);

        let response = create_router(HealthRegistry::new())
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("transactions_denied_total 4"));
        assert!(text.contains("transactions_reversed_total 0"));
    }

    #[tokio::test]
    async fn test_healthz_reports_replay_failure() {
        let health = HealthRegistry::new();
        health
            .set_unhealthy(Component::Replay, "cannot open transaction log")
            .await;

        let response = create_router(health)
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
