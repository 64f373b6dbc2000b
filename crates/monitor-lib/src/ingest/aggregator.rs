//! Per-minute aggregation of historical records
//!
//! Records are grouped by their timestamp truncated to the whole minute and
//! summed per raw status label. Malformed records are skipped with a warning;
//! any other error aborts the pass.

use crate::error::{MonitorError, Result};
use crate::models::HistoricalRecord;
use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Raw status label -> summed count within one minute
pub type StatusCounts = HashMap<String, u64>;

/// Drop seconds and sub-second precision
pub fn truncate_to_minute(timestamp: NaiveDateTime) -> NaiveDateTime {
    timestamp
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(timestamp)
}

/// Counts of what happened during one ingestion pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub rows_read: u64,
    pub records_accepted: u64,
    pub records_skipped: u64,
}

/// Aggregated minute buckets, ordered by minute
#[derive(Debug, Clone, Default)]
pub struct MinuteBuckets {
    buckets: BTreeMap<NaiveDateTime, StatusCounts>,
}

impl MinuteBuckets {
    /// Number of distinct minutes observed
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Counts for one minute (the key is truncated first)
    pub fn get(&self, minute: NaiveDateTime) -> Option<&StatusCounts> {
        self.buckets.get(&truncate_to_minute(minute))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDateTime, &StatusCounts)> {
        self.buckets.iter()
    }

    pub fn counts(&self) -> impl Iterator<Item = &StatusCounts> {
        self.buckets.values()
    }
}

/// Folds historical records into minute buckets
#[derive(Debug, Default)]
pub struct MinuteAggregator {
    buckets: BTreeMap<NaiveDateTime, StatusCounts>,
    report: IngestReport,
}

impl MinuteAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one parsed record
    pub fn add(&mut self, record: HistoricalRecord) {
        let minute = truncate_to_minute(record.timestamp);
        let entry = self
            .buckets
            .entry(minute)
            .or_default()
            .entry(record.status)
            .or_insert(0);
        *entry = entry.saturating_add(record.count);

        self.report.rows_read += 1;
        self.report.records_accepted += 1;
    }

    /// Consume a stream of parse results, skipping malformed rows
    pub fn ingest<I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = Result<HistoricalRecord>>,
    {
        for record in records {
            match record {
                Ok(record) => self.add(record),
                Err(MonitorError::MalformedRecord { line, reason }) => {
                    self.report.rows_read += 1;
                    self.report.records_skipped += 1;
                    warn!(
                        event = "record_skipped",
                        line = line,
                        reason = %reason,
                        "Skipping malformed historical record"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        debug!(
            minutes = self.buckets.len(),
            accepted = self.report.records_accepted,
            skipped = self.report.records_skipped,
            "Aggregation pass complete"
        );
        Ok(())
    }

    pub fn report(&self) -> IngestReport {
        self.report
    }

    /// Finish aggregation and hand over the buckets
    pub fn finish(self) -> (MinuteBuckets, IngestReport) {
        (
            MinuteBuckets {
                buckets: self.buckets,
            },
            self.report,
        )
    }
}
