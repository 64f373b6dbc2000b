//! Core data models for the transaction monitor

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// One parsed line of the historical source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoricalRecord {
    pub timestamp: NaiveDateTime,
    pub status: String,
    pub count: u64,
}

/// Live per-status counts supplied with a single classification call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LiveSample(HashMap<String, u64>);

impl LiveSample {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and the CLI
    pub fn with(mut self, status: impl Into<String>, count: u64) -> Self {
        self.0.insert(status.into(), count);
        self
    }

    /// Count reported for a status, 0 when absent
    pub fn count(&self, status: &str) -> u64 {
        self.0.get(status).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<HashMap<String, u64>> for LiveSample {
    fn from(counts: HashMap<String, u64>) -> Self {
        Self(counts)
    }
}

impl FromIterator<(String, u64)> for LiveSample {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Body of a classification request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorRequest {
    /// Absent or `null` both mean an empty sample
    #[serde(default, deserialize_with = "null_as_empty")]
    pub counts: LiveSample,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<LiveSample, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<LiveSample>::deserialize(deserializer)?.unwrap_or_default())
}

/// Recommended operator action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "alertar")]
    Alert,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recommendation::Ok => write!(f, "ok"),
            Recommendation::Alert => write!(f, "alertar"),
        }
    }
}

/// Classification response returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub recommendation: Recommendation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl Verdict {
    /// Build a verdict from rendered alert lines
    pub fn from_alerts(alerts: Vec<String>) -> Self {
        if alerts.is_empty() {
            Self {
                recommendation: Recommendation::Ok,
                details: None,
            }
        } else {
            Self {
                recommendation: Recommendation::Alert,
                details: Some(alerts),
            }
        }
    }

    pub fn is_alert(&self) -> bool {
        self.recommendation == Recommendation::Alert
    }
}
