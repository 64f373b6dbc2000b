//! Monitor configuration

use anyhow::Result;
use serde::Deserialize;
use txmon_lib::anomaly::{StatusPolicy, DEFAULT_MIN_ALERT_COUNT, DEFAULT_STD_MULTIPLIER};

/// Monitor configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Historical transaction log the baseline is built from
    #[serde(default = "default_history_path")]
    pub history_path: String,

    /// Port for the classification, health and metrics endpoints
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Standard deviations above the mean before a count alerts
    #[serde(default = "default_std_multiplier")]
    pub std_multiplier: f64,

    /// Counts at or below this never alert
    #[serde(default = "default_min_alert_count")]
    pub min_alert_count: u64,

    /// Instance name attached to structured log events
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// Logical statuses to baseline
    #[serde(default)]
    pub policy: StatusPolicy,
}

fn default_history_path() -> String {
    "transactions.csv".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_std_multiplier() -> f64 {
    DEFAULT_STD_MULTIPLIER
}

fn default_min_alert_count() -> u64 {
    DEFAULT_MIN_ALERT_COUNT
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "txmon-monitor".to_string())
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            history_path: default_history_path(),
            api_port: default_api_port(),
            std_multiplier: default_std_multiplier(),
            min_alert_count: default_min_alert_count(),
            instance_name: default_instance_name(),
            policy: StatusPolicy::default(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from an optional `monitor.{toml,yaml,json}` file
    /// overlaid with `MONITOR_*` environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("monitor").required(false))
            .add_source(config::Environment::with_prefix("MONITOR"))
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject settings the classifier cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.std_multiplier.is_finite() || self.std_multiplier < 0.0 {
            anyhow::bail!(
                "std_multiplier must be a non-negative number, got {}",
                self.std_multiplier
            );
        }
        self.policy.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.history_path, "transactions.csv");
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.std_multiplier, 3.0);
        assert_eq!(config.min_alert_count, 1);
        assert_eq!(config.policy, StatusPolicy::payments());
    }

    #[test]
    fn test_empty_source_deserializes_to_defaults() {
        let config: MonitorConfig = config::Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.policy.version, "payments-v1");
    }

    #[test]
    fn test_negative_multiplier_rejected() {
        let config = MonitorConfig {
            std_multiplier: -1.0,
            ..MonitorConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
