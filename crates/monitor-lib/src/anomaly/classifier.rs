//! Threshold classification of live samples
//!
//! A logical status is anomalous when its live count exceeds
//! `mean + multiplier * std_dev` and is also above a small absolute floor.
//! The floor stops statuses with an all-zero history from alerting on a
//! single event.

use super::baseline::Baseline;
use crate::models::{LiveSample, Verdict};
use serde::Serialize;

/// Number of standard deviations above the mean that counts as anomalous
pub const DEFAULT_STD_MULTIPLIER: f64 = 3.0;

/// Live counts at or below this value never alert
pub const DEFAULT_MIN_ALERT_COUNT: u64 = 1;

/// One status found above its threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusAnomaly {
    pub status: String,
    pub count: u64,
    pub threshold: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl std::fmt::Display for StatusAnomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Status '{}' above normal. Count: {}, Threshold: {:.2}",
            self.status, self.count, self.threshold
        )
    }
}

/// Classifies live samples against a [`Baseline`]
#[derive(Debug, Clone)]
pub struct AnomalyClassifier {
    /// Number of standard deviations above the mean
    pub std_multiplier: f64,
    /// Live counts must be strictly greater than this to alert
    pub min_alert_count: u64,
}

impl AnomalyClassifier {
    pub fn new(std_multiplier: f64) -> Self {
        Self {
            std_multiplier,
            min_alert_count: DEFAULT_MIN_ALERT_COUNT,
        }
    }

    pub fn with_min_alert_count(mut self, min_alert_count: u64) -> Self {
        self.min_alert_count = min_alert_count;
        self
    }

    /// Anomalies for every baselined status, in status-name order
    ///
    /// Statuses in the sample that the baseline does not track are ignored.
    pub fn classify(&self, baseline: &Baseline, sample: &LiveSample) -> Vec<StatusAnomaly> {
        baseline
            .iter()
            .filter_map(|(status, stats)| {
                let count = sample.count(status);
                let threshold = stats.threshold(self.std_multiplier);

                if count as f64 > threshold && count > self.min_alert_count {
                    Some(StatusAnomaly {
                        status: status.to_string(),
                        count,
                        threshold,
                        mean: stats.mean,
                        std_dev: stats.std_dev,
                    })
                } else {
                    None
                }
            })
            .collect()
    }

    /// Rendered alert lines
    pub fn alerts(&self, baseline: &Baseline, sample: &LiveSample) -> Vec<String> {
        self.classify(baseline, sample)
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Full verdict for a sample
    pub fn verdict(&self, baseline: &Baseline, sample: &LiveSample) -> Verdict {
        Verdict::from_alerts(self.alerts(baseline, sample))
    }
}

impl Default for AnomalyClassifier {
    fn default() -> Self {
        Self {
            std_multiplier: DEFAULT_STD_MULTIPLIER,
            min_alert_count: DEFAULT_MIN_ALERT_COUNT,
        }
    }
}
