//! Error taxonomy for baseline construction, record ingestion and requests

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading history and building the baseline
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The historical source could not be opened
    #[error("historical source unavailable at {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The historical source failed mid-read
    #[error("failed to read historical source: {0}")]
    SourceRead(#[from] csv::Error),

    /// A single historical line could not be parsed
    #[error("malformed record on line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    /// No minute buckets survived ingestion
    #[error("insufficient historical data: no usable minute buckets")]
    InsufficientData,

    /// The status policy is not usable
    #[error("invalid status policy: {0}")]
    InvalidPolicy(String),

    /// A classification request could not be decoded
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl MonitorError {
    /// Whether this error should abort startup
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            MonitorError::MalformedRecord { .. } | MonitorError::InvalidRequest(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
