//! Observability infrastructure for the transaction monitor
//!
//! Provides:
//! - Prometheus metrics (baseline shape, classification latency, verdicts)
//! - Structured JSON logging with tracing

use crate::anomaly::{Baseline, StatusAnomaly};
use crate::ingest::IngestReport;
use crate::models::Recommendation;
use prometheus::{
    register_gauge, register_gauge_vec, register_histogram, register_int_counter,
    register_int_counter_vec, register_int_gauge, Gauge, GaugeVec, Histogram, IntCounter,
    IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{info, warn};

/// Histogram buckets for classification latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.000_01, 0.000_05, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<MonitorMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct MonitorMetricsInner {
    baseline_build_seconds: Gauge,
    minute_buckets_observed: IntGauge,
    history_records_skipped: IntGauge,
    baseline_mean: GaugeVec,
    baseline_std_dev: GaugeVec,
    classification_latency_seconds: Histogram,
    requests_total: IntCounterVec,
    rejected_requests_total: IntCounter,
    alerts_total: IntCounterVec,
}

impl MonitorMetricsInner {
    fn new() -> Self {
        Self {
            baseline_build_seconds: register_gauge!(
                "txmon_baseline_build_seconds",
                "Time spent reading history and computing the baseline"
            )
            .expect("Failed to register baseline_build_seconds"),

            minute_buckets_observed: register_int_gauge!(
                "txmon_minute_buckets_observed",
                "Number of minute buckets the baseline was computed from"
            )
            .expect("Failed to register minute_buckets_observed"),

            history_records_skipped: register_int_gauge!(
                "txmon_history_records_skipped",
                "Historical records skipped because they failed to parse"
            )
            .expect("Failed to register history_records_skipped"),

            baseline_mean: register_gauge_vec!(
                "txmon_baseline_mean",
                "Baseline mean per-minute count by logical status",
                &["status"]
            )
            .expect("Failed to register baseline_mean"),

            baseline_std_dev: register_gauge_vec!(
                "txmon_baseline_std_dev",
                "Baseline population standard deviation by logical status",
                &["status"]
            )
            .expect("Failed to register baseline_std_dev"),

            classification_latency_seconds: register_histogram!(
                "txmon_classification_latency_seconds",
                "Time spent classifying one live sample",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register classification_latency_seconds"),

            requests_total: register_int_counter_vec!(
                "txmon_requests_total",
                "Classification requests by recommendation",
                &["recommendation"]
            )
            .expect("Failed to register requests_total"),

            rejected_requests_total: register_int_counter!(
                "txmon_rejected_requests_total",
                "Classification requests rejected before classification"
            )
            .expect("Failed to register rejected_requests_total"),

            alerts_total: register_int_counter_vec!(
                "txmon_alerts_total",
                "Alerts raised by logical status",
                &["status"]
            )
            .expect("Failed to register alerts_total"),
        }
    }
}

/// Monitor metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct MonitorMetrics {
    _private: (),
}

impl Default for MonitorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &MonitorMetricsInner {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new)
    }

    /// Publish the shape of a freshly built baseline
    pub fn record_baseline(&self, baseline: &Baseline, report: IngestReport, took: Duration) {
        let inner = self.inner();
        inner.baseline_build_seconds.set(took.as_secs_f64());
        inner
            .minute_buckets_observed
            .set(baseline.minutes_observed() as i64);
        inner
            .history_records_skipped
            .set(report.records_skipped as i64);

        for (status, stats) in baseline.iter() {
            inner
                .baseline_mean
                .with_label_values(&[status])
                .set(stats.mean);
            inner
                .baseline_std_dev
                .with_label_values(&[status])
                .set(stats.std_dev);
        }
    }

    /// Record a classification latency observation
    pub fn observe_classification_latency(&self, duration_secs: f64) {
        self.inner()
            .classification_latency_seconds
            .observe(duration_secs);
    }

    /// Count a classified request and the alerts it raised
    pub fn record_verdict(&self, recommendation: Recommendation, anomalies: &[StatusAnomaly]) {
        let inner = self.inner();
        let recommendation = recommendation.to_string();
        inner
            .requests_total
            .with_label_values(&[recommendation.as_str()])
            .inc();
        for anomaly in anomalies {
            inner
                .alerts_total
                .with_label_values(&[anomaly.status.as_str()])
                .inc();
        }
    }

    /// Increment rejected requests counter
    pub fn inc_rejected_requests(&self) {
        self.inner().rejected_requests_total.inc();
    }
}

/// Structured logger for monitor events
///
/// Provides consistent JSON-formatted logging for startup, anomalies
/// and other significant events.
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    /// Log service startup
    pub fn log_startup(&self, version: &str, policy_version: &str, minutes_observed: usize) {
        info!(
            event = "service_started",
            instance = %self.instance,
            version = %version,
            policy_version = %policy_version,
            minutes_observed = minutes_observed,
            "Transaction monitor started"
        );
    }

    /// Log service shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            instance = %self.instance,
            reason = %reason,
            "{} shutting down",
            self.instance
        );
    }

    /// Log each anomaly found in a classified sample
    pub fn log_anomalies(&self, anomalies: &[StatusAnomaly]) {
        for anomaly in anomalies {
            warn!(
                event = "anomaly_detected",
                instance = %self.instance,
                status = %anomaly.status,
                count = anomaly.count,
                threshold = anomaly.threshold,
                mean = anomaly.mean,
                std_dev = anomaly.std_dev,
                "Status above normal"
            );
        }
    }

    /// Log a request rejected before classification
    pub fn log_rejected_request(&self, reason: &str) {
        warn!(
            event = "request_rejected",
            instance = %self.instance,
            reason = %reason,
            "Rejected classification request"
        );
    }

    /// Log the replay loop wrapping back to the top of its source
    pub fn log_replay_restart(&self, path: &str, rows_replayed: u64) {
        info!(
            event = "replay_restarted",
            instance = %self.instance,
            path = %path,
            rows_replayed = rows_replayed,
            "End of transaction log, restarting replay"
        );
    }
}
