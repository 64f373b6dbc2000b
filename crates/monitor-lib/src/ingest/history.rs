//! Historical source reader
//!
//! Reads the delimited transaction log (`timestamp,status,count` with a
//! header line) and yields one [`HistoricalRecord`] per row. Short rows and
//! rows with a bad timestamp come back as [`MonitorError::MalformedRecord`] so
//! callers can skip them. A count that is not a non-negative integer is read
//! as 0 and the row is kept, so its minute still counts toward the baseline.
//! I/O failures come back as [`MonitorError::SourceRead`].

use crate::error::{MonitorError, Result};
use crate::models::HistoricalRecord;
use chrono::NaiveDateTime;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::warn;

/// Fixed-width timestamp layout used by the transaction log
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a historical timestamp
pub fn parse_timestamp(raw: &str) -> std::result::Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
}

/// CSV-backed source of historical records
pub struct HistorySource<R: Read> {
    reader: csv::Reader<R>,
}

impl HistorySource<BufReader<File>> {
    /// Open a history file on disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| MonitorError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: Read> HistorySource<R> {
    /// Wrap any reader; the first line is treated as a header and discarded
    pub fn from_reader(reader: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        Self { reader }
    }

    /// Iterate over the data rows
    pub fn records(&mut self) -> Records<'_, R> {
        Records {
            inner: self.reader.records(),
        }
    }
}

/// Iterator over parsed rows of a [`HistorySource`]
pub struct Records<'a, R: Read> {
    inner: csv::StringRecordsIter<'a, R>,
}

impl<R: Read> Iterator for Records<'_, R> {
    type Item = Result<HistoricalRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.inner.next()?;
        Some(match row {
            Ok(row) => parse_row(&row),
            Err(err) => match err.kind() {
                csv::ErrorKind::Utf8 { pos, .. } => Err(MonitorError::MalformedRecord {
                    line: pos.as_ref().map(|p| p.line()).unwrap_or(0),
                    reason: "row is not valid UTF-8".to_string(),
                }),
                _ => Err(MonitorError::SourceRead(err)),
            },
        })
    }
}

fn parse_row(row: &csv::StringRecord) -> Result<HistoricalRecord> {
    let line = row.position().map(|p| p.line()).unwrap_or(0);
    let malformed = |reason: String| MonitorError::MalformedRecord { line, reason };

    if row.len() < 3 {
        return Err(malformed(format!("expected 3 fields, found {}", row.len())));
    }

    let timestamp = parse_timestamp(&row[0])
        .map_err(|e| malformed(format!("invalid timestamp '{}': {}", &row[0], e)))?;

    let count = row[2].parse::<u64>().unwrap_or_else(|e| {
        warn!(
            event = "count_defaulted",
            line = line,
            raw = %&row[2],
            error = %e,
            "Invalid historical count, counting as 0"
        );
        0
    });

    Ok(HistoricalRecord {
        timestamp,
        status: row[1].to_string(),
        count,
    })
}
