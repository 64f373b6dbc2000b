//! Transaction monitor library
//!
//! This crate provides the core functionality for:
//! - Ingesting the historical transaction log into per-minute status counts
//! - Building per-status mean / standard deviation baselines
//! - Classifying live status counts against the baseline
//! - Replaying the log as live Prometheus gauges
//! - Health checks and observability

pub mod anomaly;
pub mod error;
pub mod health;
pub mod ingest;
pub mod models;
pub mod observability;
pub mod replay;
pub mod service;

pub use anomaly::{
    AnomalyClassifier, Baseline, BaselineEstimator, StatusAnomaly, StatusBaseline, StatusPolicy,
};
pub use error::{MonitorError, Result};
pub use health::{
    Component, ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse,
    ReadinessResponse,
};
pub use models::*;
pub use observability::{MonitorMetrics, StructuredLogger};
pub use service::{MonitoringService, MonitoringServiceBuilder};
