//! Transaction exporter - replays the transaction log as Prometheus gauges
//!
//! Steps through the log one row per interval so dashboards see a live-looking
//! feed, and loops back to the top at end of file.

use anyhow::Result;
use std::future::Future;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use txmon_lib::{
    health::{Component, HealthRegistry},
    observability::StructuredLogger,
    replay::{ReplayLoop, TransactionGauges},
};

mod api;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting transaction-exporter");

    let config = config::ExporterConfig::load()?;
    info!(
        history_path = %config.history_path,
        metrics_port = config.metrics_port,
        step_interval_ms = config.step_interval_ms,
        "Exporter configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(Component::Replay).await;
    health_registry.set_ready(true).await;

    let gauges = TransactionGauges::register(prometheus::default_registry())?;
    let logger = StructuredLogger::new("transaction-exporter");

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let replay = ReplayLoop::new(gauges, config.replay())
        .with_health(health_registry.clone())
        .with_logger(logger.clone());
    let replay_handle = tokio::spawn(replay.run(shutdown_rx));

    let mut server_shutdown = shutdown_tx.subscribe();
    let mut server = tokio::spawn(api::serve(
        config.metrics_port,
        health_registry,
        async move {
            let _ = server_shutdown.recv().await;
        },
    ));

    let exit = wait_for_exit(&mut server, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
    })
    .await;

    match &exit {
        Ok(()) => logger.log_shutdown("SIGINT received"),
        Err(e) => {
            error!(error = %e, "Metrics server failed");
            logger.log_shutdown("metrics server failed");
        }
    }
    let _ = shutdown_tx.send(());

    if let Err(e) = replay_handle.await {
        error!(error = %e, "Replay task failed");
    }
    if exit.is_ok() {
        server.await??;
    }

    info!("Shutting down");
    exit
}

/// Wait for `signal`; returns early with an error if the server stops first
async fn wait_for_exit<F>(server: &mut JoinHandle<Result<()>>, signal: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    tokio::select! {
        _ = signal => Ok(()),
        result = server => {
            result??;
            anyhow::bail!("metrics server stopped unexpectedly")
        }
    }
}
