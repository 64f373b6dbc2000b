//! Live replay of the transaction log as Prometheus gauges
//!
//! Dashboards need something that looks like live traffic. This module
//! replays the historical log row by row into four gauges.

mod gauges;
mod r#loop;

pub use gauges::{GaugeSnapshot, TransactionGauges};
pub use r#loop::{ReplayConfig, ReplayLoop};
