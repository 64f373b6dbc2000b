//! Monitoring service
//!
//! Builds the baseline once from the historical source and then answers
//! classification calls read-only. Share it behind an `Arc`; nothing in it is
//! mutated after construction.

use crate::anomaly::{AnomalyClassifier, Baseline, BaselineEstimator, StatusAnomaly, StatusPolicy};
use crate::error::Result;
use crate::ingest::{aggregate_source, HistorySource, IngestReport};
use crate::models::{LiveSample, Verdict};
use std::io::Read;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;

/// Baseline plus classifier, built once at startup
#[derive(Debug)]
pub struct MonitoringService {
    baseline: Baseline,
    classifier: AnomalyClassifier,
    ingest_report: IngestReport,
    build_duration: Duration,
}

impl MonitoringService {
    pub fn builder() -> MonitoringServiceBuilder {
        MonitoringServiceBuilder::new()
    }

    /// Build with the payments policy and default classifier
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder().build_from_path(path)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::builder().build_from_reader(reader)
    }

    /// Classify a live sample
    pub fn check(&self, sample: &LiveSample) -> Verdict {
        self.classifier.verdict(&self.baseline, sample)
    }

    /// Structured anomalies for a live sample
    pub fn anomalies(&self, sample: &LiveSample) -> Vec<StatusAnomaly> {
        self.classifier.classify(&self.baseline, sample)
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    pub fn classifier(&self) -> &AnomalyClassifier {
        &self.classifier
    }

    pub fn ingest_report(&self) -> IngestReport {
        self.ingest_report
    }

    /// Time spent reading history and computing the baseline
    pub fn build_duration(&self) -> Duration {
        self.build_duration
    }
}

/// Builder for [`MonitoringService`]
#[derive(Debug, Clone)]
pub struct MonitoringServiceBuilder {
    policy: StatusPolicy,
    classifier: AnomalyClassifier,
}

impl MonitoringServiceBuilder {
    pub fn new() -> Self {
        Self {
            policy: StatusPolicy::payments(),
            classifier: AnomalyClassifier::default(),
        }
    }

    /// Replace the logical status policy
    pub fn policy(mut self, policy: StatusPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the standard deviation multiplier
    pub fn std_multiplier(mut self, multiplier: f64) -> Self {
        self.classifier.std_multiplier = multiplier;
        self
    }

    /// Set the absolute floor live counts must exceed
    pub fn min_alert_count(mut self, count: u64) -> Self {
        self.classifier.min_alert_count = count;
        self
    }

    /// Build from a history file on disk
    pub fn build_from_path(self, path: impl AsRef<Path>) -> Result<MonitoringService> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading transaction history");
        let mut source = HistorySource::open(path)?;
        self.build_from_source(&mut source)
    }

    /// Build from any reader producing the CSV log
    pub fn build_from_reader<R: Read>(self, reader: R) -> Result<MonitoringService> {
        let mut source = HistorySource::from_reader(reader);
        self.build_from_source(&mut source)
    }

    fn build_from_source<R: Read>(
        self,
        source: &mut HistorySource<R>,
    ) -> Result<MonitoringService> {
        let start = Instant::now();
        let estimator = BaselineEstimator::new(self.policy)?;

        let (buckets, ingest_report) = aggregate_source(source)?;
        let baseline = estimator.estimate(&buckets)?;

        for (status, stats) in baseline.iter() {
            info!(
                event = "baseline_computed",
                status = %status,
                mean = %format!("{:.2}", stats.mean),
                std_dev = %format!("{:.2}", stats.std_dev),
                "Baseline computed"
            );
        }

        info!(
            minutes = baseline.minutes_observed(),
            records = ingest_report.records_accepted,
            skipped = ingest_report.records_skipped,
            policy = %baseline.policy_version(),
            "Baseline ready"
        );

        Ok(MonitoringService {
            baseline,
            classifier: self.classifier,
            ingest_report,
            build_duration: start.elapsed(),
        })
    }
}

impl Default for MonitoringServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
