//! Classify a live sample against a running monitor

use anyhow::{bail, Context, Result};
use std::path::Path;
use txmon_lib::{LiveSample, MonitorRequest};

use crate::client::ApiClient;
use crate::output::{print_alert, print_json, print_success, OutputFormat};

/// Parse a `status=count` argument
pub fn parse_count(raw: &str) -> Result<(String, u64)> {
    let (status, count) = raw
        .split_once('=')
        .with_context(|| format!("expected status=count, got '{}'", raw))?;
    let status = status.trim();
    if status.is_empty() {
        bail!("empty status in '{}'", raw);
    }
    let count = count
        .trim()
        .parse::<u64>()
        .with_context(|| format!("invalid count in '{}'", raw))?;
    Ok((status.to_string(), count))
}

/// Build the sample from `--count` pairs or a JSON request file
pub fn build_sample(counts: &[String], file: Option<&Path>) -> Result<LiveSample> {
    match file {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let request: MonitorRequest =
                serde_json::from_str(&content).context("Failed to parse sample file")?;
            Ok(request.counts)
        }
        None => counts
            .iter()
            .map(|raw| parse_count(raw))
            .collect::<Result<LiveSample>>(),
    }
}

pub async fn check(
    client: &ApiClient,
    counts: &[String],
    file: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let sample = build_sample(counts, file)?;
    let verdict = client.check(sample).await?;

    match format {
        OutputFormat::Json => print_json(&verdict)?,
        OutputFormat::Table => match &verdict.details {
            Some(details) if verdict.is_alert() => {
                for line in details {
                    print_alert(line);
                }
            }
            _ => print_success("All statuses within normal range"),
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("denied=10").unwrap(), ("denied".to_string(), 10));
        assert_eq!(parse_count(" failed = 3 ").unwrap(), ("failed".to_string(), 3));
        assert!(parse_count("denied").is_err());
        assert!(parse_count("denied=-1").is_err());
        assert!(parse_count("=4").is_err());
    }

    #[test]
    fn test_sample_from_counts() {
        let sample = build_sample(&["denied=10".to_string(), "failed=2".to_string()], None).unwrap();
        assert_eq!(sample.count("denied"), 10);
        assert_eq!(sample.count("failed"), 2);
        assert_eq!(sample.count("reversed_total"), 0);
    }

    #[test]
    fn test_sample_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"counts": {{"reversed_total": 7}}}}"#).unwrap();

        let sample = build_sample(&[], Some(file.path())).unwrap();
        assert_eq!(sample.count("reversed_total"), 7);
        assert_eq!(sample.len(), 1);
    }
}
