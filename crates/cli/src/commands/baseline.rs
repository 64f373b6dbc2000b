//! Show the per-status baseline, computed locally or fetched from the service

use anyhow::{bail, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;
use txmon_lib::{anomaly::DEFAULT_STD_MULTIPLIER, Baseline, MonitoringService};

use crate::client::ApiClient;
use crate::output::{format_stat, print_json, print_table, OutputFormat};

/// Row for the baseline table
#[derive(Tabled, Serialize)]
pub struct BaselineRow {
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Mean", display_with = "display_stat")]
    pub mean: f64,
    #[tabled(rename = "Std Dev", display_with = "display_stat")]
    pub std_dev: f64,
    #[tabled(rename = "Threshold", display_with = "display_stat")]
    pub threshold: f64,
}

fn display_stat(value: &f64) -> String {
    format_stat(*value)
}

/// One row per status, in name order
pub fn baseline_rows(baseline: &Baseline, std_multiplier: f64) -> Vec<BaselineRow> {
    baseline
        .iter()
        .map(|(status, stats)| BaselineRow {
            status: status.to_string(),
            mean: stats.mean,
            std_dev: stats.std_dev,
            threshold: stats.threshold(std_multiplier),
        })
        .collect()
}

pub async fn show_baseline(
    client: &ApiClient,
    history: Option<&Path>,
    remote: bool,
    std_multiplier: Option<f64>,
    format: OutputFormat,
) -> Result<()> {
    let (baseline, multiplier) = match (history, remote) {
        (Some(_), true) => bail!("--history and --remote are mutually exclusive"),
        (Some(path), false) => {
            let mut builder = MonitoringService::builder();
            if let Some(multiplier) = std_multiplier {
                builder = builder.std_multiplier(multiplier);
            }
            let service = builder.build_from_path(path)?;
            let multiplier = service.classifier().std_multiplier;
            (service.baseline().clone(), multiplier)
        }
        (None, true) => (
            client.baseline().await?,
            std_multiplier.unwrap_or(DEFAULT_STD_MULTIPLIER),
        ),
        (None, false) => bail!("pass --history <csv> or --remote"),
    };

    let rows = baseline_rows(&baseline, multiplier);
    match format {
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Table => {
            println!("{}", "Status Baseline".bold());
            println!(
                "Policy: {}  Minutes observed: {}  Multiplier: {}",
                baseline.policy_version().cyan(),
                baseline.minutes_observed(),
                multiplier
            );
            print_table(rows);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "timestamp,status,count
2025-07-12 13:00:10,denied,2
2025-07-12 13:00:30,reversed,1
2025-07-12 13:01:10,denied,4
2025-07-12 13:01:30,backend_reversed,1
";

    #[test]
    fn test_rows_sorted_with_thresholds() {
        let service = MonitoringService::from_reader(LOG.as_bytes()).unwrap();
        let rows = baseline_rows(service.baseline(), 3.0);

        let statuses: Vec<&str> = rows.iter().map(|r| r.status.as_str()).collect();
        assert_eq!(statuses, vec!["denied", "failed", "reversed_total"]);
        assert_eq!(rows[0].threshold, 6.0);
        assert_eq!(rows[1].threshold, 0.0);
        assert_eq!(rows[2].mean, 1.0);
        assert_eq!(rows[2].std_dev, 0.0);
    }
}
