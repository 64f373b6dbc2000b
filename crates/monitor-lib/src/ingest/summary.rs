//! Hour-of-day totals per status
//!
//! Offline view used by operators to spot which hours carry unusual status
//! mixes before looking at the per-minute baseline.

use crate::models::HistoricalRecord;
use chrono::Timelike;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Total counts grouped by hour of day and raw status
#[derive(Debug, Clone, Default, Serialize)]
pub struct HourlySummary {
    hours: BTreeMap<u32, BTreeMap<String, u64>>,
}

impl HourlySummary {
    /// Summarise every record
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = HistoricalRecord>,
    {
        Self::from_records_in_hours(records, &[])
    }

    /// Summarise only records whose hour is in `hours` (empty keeps all)
    pub fn from_records_in_hours<I>(records: I, hours: &[u32]) -> Self
    where
        I: IntoIterator<Item = HistoricalRecord>,
    {
        let mut summary = Self::default();
        for record in records {
            let hour = record.timestamp.hour();
            if !hours.is_empty() && !hours.contains(&hour) {
                continue;
            }
            let total = summary
                .hours
                .entry(hour)
                .or_default()
                .entry(record.status)
                .or_insert(0);
            *total = total.saturating_add(record.count);
        }
        summary
    }

    /// Hours that had at least one record, ascending
    pub fn hours(&self) -> impl Iterator<Item = u32> + '_ {
        self.hours.keys().copied()
    }

    /// Every status seen in any hour, sorted
    pub fn statuses(&self) -> Vec<String> {
        self.hours
            .values()
            .flat_map(|by_status| by_status.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Total for an hour and status, 0 when nothing was recorded
    pub fn count(&self, hour: u32, status: &str) -> u64 {
        self.hours
            .get(&hour)
            .and_then(|by_status| by_status.get(status))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }
}
