//! Exporter configuration

use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;
use txmon_lib::replay::ReplayConfig;

/// Exporter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExporterConfig {
    /// Transaction log to replay
    #[serde(default = "default_history_path")]
    pub history_path: String,

    /// Port for the metrics and health endpoints
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Delay between replayed rows in milliseconds
    #[serde(default = "default_step_interval")]
    pub step_interval_ms: u64,

    /// Delay before retrying an unreadable log in seconds
    #[serde(default = "default_retry_interval")]
    pub retry_interval_secs: u64,
}

fn default_history_path() -> String {
    "/data/transactions.csv".to_string()
}

fn default_metrics_port() -> u16 {
    8081
}

fn default_step_interval() -> u64 {
    1000
}

fn default_retry_interval() -> u64 {
    10
}

impl ExporterConfig {
    /// Load configuration from `EXPORTER_*` environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("EXPORTER"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn replay(&self) -> ReplayConfig {
        ReplayConfig {
            path: self.history_path.clone().into(),
            step_interval: Duration::from_millis(self.step_interval_ms),
            retry_interval: Duration::from_secs(self.retry_interval_secs),
        }
    }
}
