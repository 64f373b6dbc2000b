//! Baseline estimation and anomaly classification
//!
//! This module provides:
//! - The logical status policy (which raw labels feed which status)
//! - Mean / population standard deviation baselines per logical status
//! - The 3-sigma classifier for live samples

mod baseline;
mod classifier;
mod policy;


pub use baseline::{Baseline, BaselineEstimator, StatusBaseline};
pub use classifier::{
    AnomalyClassifier, StatusAnomaly, DEFAULT_MIN_ALERT_COUNT, DEFAULT_STD_MULTIPLIER,
};
pub use policy::{statuses, LogicalStatus, StatusPolicy, PAYMENTS_POLICY_VERSION};
