//! Historical data ingestion
//!
//! This module turns the transaction log into per-minute status counts:
//! - CSV parsing with per-row error recovery
//! - Minute-bucket aggregation
//! - Hour-of-day summaries for offline inspection

mod aggregator;
mod history;
mod summary;


pub use aggregator::{
    truncate_to_minute, IngestReport, MinuteAggregator, MinuteBuckets, StatusCounts,
};
pub use history::{parse_timestamp, HistorySource, Records, TIMESTAMP_FORMAT};
pub use summary::HourlySummary;

use crate::error::Result;
use std::io::Read;

/// Read a whole source and aggregate it into minute buckets
pub fn aggregate_source<R: Read>(
    source: &mut HistorySource<R>,
) -> Result<(MinuteBuckets, IngestReport)> {
    let mut aggregator = MinuteAggregator::new();
    aggregator.ingest(source.records())?;
    Ok(aggregator.finish())
}
