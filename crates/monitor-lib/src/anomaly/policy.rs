//! Logical status policy
//!
//! Maps each logical status the baseline tracks to the raw labels that feed
//! it. The default payments policy folds `reversed` and `backend_reversed`
//! into `reversed_total` and leaves `approved` out entirely.

use crate::error::{MonitorError, Result};
use crate::ingest::StatusCounts;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Version tag of the built-in policy
pub const PAYMENTS_POLICY_VERSION: &str = "payments-v1";

/// Logical status names used by the built-in policy
pub mod statuses {
    pub const DENIED: &str = "denied";
    pub const FAILED: &str = "failed";
    pub const REVERSED_TOTAL: &str = "reversed_total";

    pub const REVERSED: &str = "reversed";
    pub const BACKEND_REVERSED: &str = "backend_reversed";
    pub const APPROVED: &str = "approved";
}

/// A logical status and the raw labels summed into it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalStatus {
    pub name: String,
    pub sources: Vec<String>,
}

impl LogicalStatus {
    pub fn new(name: impl Into<String>, sources: &[&str]) -> Self {
        Self {
            name: name.into(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Sum of the contributing raw labels in one minute bucket
    pub fn project(&self, bucket: &StatusCounts) -> u64 {
        self.sources
            .iter()
            .map(|label| bucket.get(label).copied().unwrap_or(0))
            .fold(0u64, |acc, n| acc.saturating_add(n))
    }
}

/// Versioned set of logical statuses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPolicy {
    pub version: String,
    pub statuses: Vec<LogicalStatus>,
}

impl StatusPolicy {
    /// The payments policy: denied, failed and reversed_total
    pub fn payments() -> Self {
        Self {
            version: PAYMENTS_POLICY_VERSION.to_string(),
            statuses: vec![
                LogicalStatus::new(statuses::DENIED, &[statuses::DENIED]),
                LogicalStatus::new(statuses::FAILED, &[statuses::FAILED]),
                LogicalStatus::new(
                    statuses::REVERSED_TOTAL,
                    &[statuses::REVERSED, statuses::BACKEND_REVERSED],
                ),
            ],
        }
    }

    /// Reject empty policies, duplicate names and statuses without sources
    pub fn validate(&self) -> Result<()> {
        if self.statuses.is_empty() {
            return Err(MonitorError::InvalidPolicy(
                "policy defines no logical statuses".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for status in &self.statuses {
            if status.name.trim().is_empty() {
                return Err(MonitorError::InvalidPolicy(
                    "logical status with empty name".to_string(),
                ));
            }
            if !seen.insert(status.name.as_str()) {
                return Err(MonitorError::InvalidPolicy(format!(
                    "duplicate logical status '{}'",
                    status.name
                )));
            }
            if status.sources.is_empty() {
                return Err(MonitorError::InvalidPolicy(format!(
                    "logical status '{}' has no source labels",
                    status.name
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&LogicalStatus> {
        self.statuses.iter().find(|s| s.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.statuses.iter().map(|s| s.name.as_str())
    }
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self::payments()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payments_policy_shape() {
        let policy = StatusPolicy::payments();
        assert!(policy.validate().is_ok());
        assert_eq!(
            policy.names().collect::<Vec<_>>(),
            vec!["denied", "failed", "reversed_total"]
        );
        assert!(policy.get(statuses::APPROVED).is_none());
    }

    #[test]
    fn test_reversed_total_sums_both_labels() {
        let policy = StatusPolicy::payments();
        let reversed = policy.get(statuses::REVERSED_TOTAL).unwrap();

        let mut bucket = StatusCounts::new();
        bucket.insert("reversed".to_string(), 2);
        bucket.insert("backend_reversed".to_string(), 3);
        bucket.insert("approved".to_string(), 100);
        assert_eq!(reversed.project(&bucket), 5);

        bucket.remove("backend_reversed");
        assert_eq!(reversed.project(&bucket), 2);
    }

    #[test]
    fn test_absent_labels_project_to_zero() {
        let policy = StatusPolicy::payments();
        let bucket = StatusCounts::new();
        for status in &policy.statuses {
            assert_eq!(status.project(&bucket), 0);
        }
    }

    #[test]
    fn test_validate_rejects_duplicates_and_empty_sources() {
        let duplicate = StatusPolicy {
            version: "test".to_string(),
            statuses: vec![
                LogicalStatus::new("denied", &["denied"]),
                LogicalStatus::new("denied", &["declined"]),
            ],
        };
        assert!(matches!(
            duplicate.validate(),
            Err(MonitorError::InvalidPolicy(_))
        ));

        let no_sources = StatusPolicy {
            version: "test".to_string(),
            statuses: vec![LogicalStatus::new("failed", &[])],
        };
        assert!(no_sources.validate().is_err());

        let empty = StatusPolicy {
            version: "test".to_string(),
            statuses: vec![],
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_policy_deserializes_from_json() {
        let policy: StatusPolicy = serde_json::from_str(
            r#"{"version": "custom-v2", "statuses": [{"name": "chargeback", "sources": ["chargeback", "dispute"]}]}"#,
        )
        .unwrap();
        assert_eq!(policy.version, "custom-v2");
        assert_eq!(policy.get("chargeback").unwrap().sources.len(), 2);
    }
}
