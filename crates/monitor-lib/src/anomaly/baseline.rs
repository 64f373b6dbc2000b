//! Per-status baseline estimation
//!
//! Projects every minute bucket onto each logical status (absent labels count
//! as 0) and computes the mean and population standard deviation of each
//! series. The resulting [`Baseline`] is immutable.

use super::policy::StatusPolicy;
use crate::error::{MonitorError, Result};
use crate::ingest::MinuteBuckets;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Expected per-minute count for one logical status
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusBaseline {
    pub mean: f64,
    pub std_dev: f64,
}

impl StatusBaseline {
    /// Mean and population standard deviation, `None` for an empty series
    pub fn from_series(series: &[f64]) -> Option<Self> {
        if series.is_empty() {
            return None;
        }

        let n = series.len() as f64;
        let mean = series.iter().sum::<f64>() / n;
        let variance = series.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

        Some(Self {
            mean,
            std_dev: variance.sqrt(),
        })
    }

    /// `mean + multiplier * std_dev`
    pub fn threshold(&self, multiplier: f64) -> f64 {
        self.mean + multiplier * self.std_dev
    }
}

/// Published baseline over every logical status of a policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Baseline {
    policy_version: String,
    minutes_observed: usize,
    statuses: BTreeMap<String, StatusBaseline>,
}

impl Baseline {
    pub fn get(&self, status: &str) -> Option<&StatusBaseline> {
        self.statuses.get(status)
    }

    /// Statuses in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StatusBaseline)> {
        self.statuses.iter().map(|(name, stats)| (name.as_str(), stats))
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Number of minute buckets the baseline was computed from
    pub fn minutes_observed(&self) -> usize {
        self.minutes_observed
    }

    pub fn policy_version(&self) -> &str {
        &self.policy_version
    }
}

/// Builds a [`Baseline`] from aggregated minute buckets
#[derive(Debug, Clone)]
pub struct BaselineEstimator {
    policy: StatusPolicy,
}

impl BaselineEstimator {
    /// Create an estimator for a validated policy
    pub fn new(policy: StatusPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &StatusPolicy {
        &self.policy
    }

    /// Compute the baseline; fails when there are no minute buckets
    pub fn estimate(&self, buckets: &MinuteBuckets) -> Result<Baseline> {
        if buckets.is_empty() {
            return Err(MonitorError::InsufficientData);
        }

        let mut statuses = BTreeMap::new();
        for status in &self.policy.statuses {
            let series: Vec<f64> = buckets
                .counts()
                .map(|bucket| status.project(bucket) as f64)
                .collect();

            let stats =
                StatusBaseline::from_series(&series).ok_or(MonitorError::InsufficientData)?;
            statuses.insert(status.name.clone(), stats);
        }

        Ok(Baseline {
            policy_version: self.policy.version.clone(),
            minutes_observed: buckets.len(),
            statuses,
        })
    }
}

impl Default for BaselineEstimator {
    fn default() -> Self {
        Self {
            policy: StatusPolicy::payments(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{parse_timestamp, MinuteAggregator};
    use crate::models::HistoricalRecord;

    /// Build buckets from (minute, status, count) triples
    fn buckets(rows: &[(&str, &str, u64)]) -> MinuteBuckets {
        let mut aggregator = MinuteAggregator::new();
        for (ts, status, count) in rows {
            aggregator.add(HistoricalRecord {
                timestamp: parse_timestamp(ts).unwrap(),
                status: status.to_string(),
                count: *count,
            });
        }
        aggregator.finish().0
    }

    #[test]
    fn test_population_std_dev() {
        let stats = StatusBaseline::from_series(&[2.0, 4.0]).unwrap();
        assert!((stats.mean - 3.0).abs() < 1e-12);
        assert!((stats.std_dev - 1.0).abs() < 1e-12);
        assert!((stats.threshold(3.0) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_series_has_no_baseline() {
        assert!(StatusBaseline::from_series(&[]).is_none());
    }

    #[test]
    fn test_std_dev_non_negative_and_mean_is_average() {
        let series_set: Vec<Vec<f64>> = vec![
            vec![0.0],
            vec![5.0, 5.0, 5.0],
            vec![1.0, 100.0, 3.0, 0.0, 42.0],
            vec![1e9, 0.0, 1e9 + 1.0],
        ];

        for series in series_set {
            let stats = StatusBaseline::from_series(&series).unwrap();
            let average = series.iter().sum::<f64>() / series.len() as f64;
            assert!(stats.std_dev >= 0.0);
            assert!((stats.mean - average).abs() <= 1e-9 * average.abs().max(1.0));
        }
    }

    #[test]
    fn test_reference_scenario() {
        let buckets = buckets(&[
            ("2025-07-12 13:00:10", "denied", 2),
            ("2025-07-12 13:00:20", "failed", 0),
            ("2025-07-12 13:00:30", "reversed", 1),
            ("2025-07-12 13:00:40", "backend_reversed", 0),
            ("2025-07-12 13:01:10", "denied", 4),
            ("2025-07-12 13:01:20", "failed", 0),
            ("2025-07-12 13:01:30", "reversed", 1),
            ("2025-07-12 13:01:40", "backend_reversed", 0),
        ]);

        let baseline = BaselineEstimator::default().estimate(&buckets).unwrap();
        assert_eq!(baseline.minutes_observed(), 2);
        assert_eq!(baseline.len(), 3);

        let denied = baseline.get("denied").unwrap();
        assert!((denied.mean - 3.0).abs() < 1e-12);
        assert!((denied.std_dev - 1.0).abs() < 1e-12);

        let failed = baseline.get("failed").unwrap();
        assert_eq!(failed.mean, 0.0);
        assert_eq!(failed.std_dev, 0.0);

        let reversed = baseline.get("reversed_total").unwrap();
        assert!((reversed.mean - 1.0).abs() < 1e-12);
        assert_eq!(reversed.std_dev, 0.0);
    }

    #[test]
    fn test_absent_status_contributes_zero_sample() {
        // denied appears in one of two minutes: series is [6, 0]
        let buckets = buckets(&[
            ("2025-07-12 13:00:10", "denied", 6),
            ("2025-07-12 13:01:10", "approved", 50),
        ]);

        let baseline = BaselineEstimator::default().estimate(&buckets).unwrap();
        let denied = baseline.get("denied").unwrap();
        assert!((denied.mean - 3.0).abs() < 1e-12);
        assert!((denied.std_dev - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_reversed_total_uses_summed_series() {
        // reversed = [4, 0], backend_reversed = [0, 4] -> summed series [4, 4]
        let buckets = buckets(&[
            ("2025-07-12 13:00:10", "reversed", 4),
            ("2025-07-12 13:01:10", "backend_reversed", 4),
        ]);

        let baseline = BaselineEstimator::default().estimate(&buckets).unwrap();
        let reversed = baseline.get("reversed_total").unwrap();
        assert!((reversed.mean - 4.0).abs() < 1e-12);
        assert_eq!(reversed.std_dev, 0.0);

        // Either label alone would give mean 2, std 2
        let alone = StatusBaseline::from_series(&[4.0, 0.0]).unwrap();
        assert_ne!(alone, *reversed);
    }

    #[test]
    fn test_baseline_is_total_over_policy() {
        let buckets = buckets(&[("2025-07-12 13:00:10", "approved", 10)]);

        let baseline = BaselineEstimator::default().estimate(&buckets).unwrap();
        for name in StatusPolicy::payments().names() {
            let stats = baseline.get(name).unwrap();
            assert_eq!(stats.mean, 0.0);
            assert_eq!(stats.std_dev, 0.0);
        }
        assert!(baseline.get("approved").is_none());
    }

    #[test]
    fn test_no_buckets_is_insufficient_data() {
        let result = BaselineEstimator::default().estimate(&MinuteBuckets::default());
        assert!(matches!(result, Err(MonitorError::InsufficientData)));
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let policy = StatusPolicy {
            version: "broken".to_string(),
            statuses: vec![],
        };
        assert!(BaselineEstimator::new(policy).is_err());
    }
}
