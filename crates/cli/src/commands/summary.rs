//! Hour-of-day status totals from a history file

use anyhow::{bail, Context, Result};
use serde_json::json;
use std::path::Path;
use tabled::{builder::Builder, settings::Style};
use txmon_lib::ingest::{HistorySource, HourlySummary};
use txmon_lib::HistoricalRecord;

use crate::output::{print_json, print_warning, OutputFormat};

/// Parse `8,9,15` into hours of day
pub fn parse_hours(raw: &str) -> Result<Vec<u32>> {
    raw.split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(|h| {
            let hour = h
                .parse::<u32>()
                .with_context(|| format!("invalid hour '{}'", h))?;
            if hour > 23 {
                bail!("hour {} out of range 0-23", hour);
            }
            Ok(hour)
        })
        .collect()
}

/// Read every well-formed record; returns the records and how many were skipped
pub fn read_records(path: &Path) -> Result<(Vec<HistoricalRecord>, u64)> {
    let mut source = HistorySource::open(path)?;
    let mut records = Vec::new();
    let mut skipped = 0u64;

    for record in source.records() {
        match record {
            Ok(record) => records.push(record),
            Err(e) if !e.is_fatal() => skipped += 1,
            Err(e) => return Err(e.into()),
        }
    }

    Ok((records, skipped))
}

pub fn show_summary(history: &Path, hours: Option<&str>, format: OutputFormat) -> Result<()> {
    let hours = hours.map(parse_hours).transpose()?.unwrap_or_default();
    let (records, skipped) = read_records(history)?;
    let summary = HourlySummary::from_records_in_hours(records, &hours);

    if skipped > 0 && format == OutputFormat::Table {
        print_warning(&format!("Skipped {} malformed rows", skipped));
    }

    match format {
        OutputFormat::Json => print_json(&summary_json(&summary))?,
        OutputFormat::Table => {
            if summary.is_empty() {
                print_warning("No records in the selected hours");
                return Ok(());
            }

            let statuses = summary.statuses();
            let mut builder = Builder::default();
            builder.push_record(std::iter::once("Hour".to_string()).chain(statuses.iter().cloned()));
            for hour in summary.hours() {
                builder.push_record(
                    std::iter::once(format!("{:02}", hour))
                        .chain(statuses.iter().map(|s| summary.count(hour, s).to_string())),
                );
            }
            println!("{}", builder.build().with(Style::rounded()));
        }
    }

    Ok(())
}

fn summary_json(summary: &HourlySummary) -> serde_json::Value {
    let statuses = summary.statuses();
    let hours: Vec<serde_json::Value> = summary
        .hours()
        .map(|hour| {
            let counts: serde_json::Map<String, serde_json::Value> = statuses
                .iter()
                .map(|s| (s.clone(), json!(summary.count(hour, s))))
                .collect();
            json!({ "hour": hour, "counts": counts })
        })
        .collect();
    json!({ "hours": hours })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_hours() {
        assert_eq!(parse_hours("8, 9,15").unwrap(), vec![8, 9, 15]);
        assert!(parse_hours("24").is_err());
        assert!(parse_hours("eight").is_err());
    }

    #[test]
    fn test_read_records_skips_malformed() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "timestamp,status,count").unwrap();
        writeln!(file, "2025-07-12 08:00:00,denied,2").unwrap();
        writeln!(file, "12/07/2025 08:30,denied,2").unwrap();
        writeln!(file, "2025-07-12 09:00:00,failed,1").unwrap();

        let (records, skipped) = read_records(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(skipped, 1);

        let summary = HourlySummary::from_records_in_hours(records, &[9]);
        let json = summary_json(&summary);
        assert_eq!(json["hours"][0]["hour"], 9);
        assert_eq!(json["hours"][0]["counts"]["failed"], 1);
        assert!(json["hours"][1].is_null());
    }

    #[test]
    fn test_missing_history_is_error() {
        assert!(read_records(Path::new("/no/such/history.csv")).is_err());
    }
}
