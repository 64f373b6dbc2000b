//! Transaction monitor - flags status counts above their historical norm
//!
//! Builds a per-minute baseline from the historical transaction log at
//! startup, then classifies live status counts posted to `/monitor`.

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use txmon_lib::{
    health::{Component, HealthRegistry},
    observability::{MonitorMetrics, StructuredLogger},
    MonitoringService,
};
use txmon_monitor::{api, config::MonitorConfig};

const MONITOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting txmon-monitor");

    let config = MonitorConfig::load()?;
    info!(
        instance = %config.instance_name,
        history_path = %config.history_path,
        std_multiplier = config.std_multiplier,
        "Monitor configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(Component::Baseline).await;
    health_registry.register(Component::Classifier).await;

    let service = MonitoringService::builder()
        .policy(config.policy.clone())
        .std_multiplier(config.std_multiplier)
        .min_alert_count(config.min_alert_count)
        .build_from_path(&config.history_path)
        .map_err(|e| {
            error!(
                error = %e,
                history_path = %config.history_path,
                "Failed to build baseline"
            );
            e
        })?;

    let metrics = MonitorMetrics::new();
    metrics.record_baseline(
        service.baseline(),
        service.ingest_report(),
        service.build_duration(),
    );

    let logger = StructuredLogger::new(&config.instance_name);
    logger.log_startup(
        MONITOR_VERSION,
        service.baseline().policy_version(),
        service.baseline().minutes_observed(),
    );

    let app_state = Arc::new(api::AppState::new(
        Arc::new(service),
        health_registry.clone(),
        metrics,
        logger.clone(),
    ));

    // Baseline is built; the classifier can take traffic
    health_registry.set_ready(true).await;

    api::serve(config.api_port, app_state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
    })
    .await?;

    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}
