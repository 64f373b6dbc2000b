//! Transaction monitor CLI
//!
//! A command-line tool for checking live samples against a running monitor,
//! inspecting baselines and summarising historical transaction logs.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{baseline, check, health, summary};
use std::path::PathBuf;

const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Transaction monitor CLI
#[derive(Parser)]
#[command(name = "txmon")]
#[command(author, version, about = "CLI for the transaction monitor", long_about = None)]
pub struct Cli {
    /// Monitor API URL (can also be set via TXMON_API_URL env var)
    #[arg(long, env = "TXMON_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify a live sample against the running monitor
    Check {
        /// Status count as status=count; repeatable
        #[arg(long = "count", short, value_name = "STATUS=COUNT", required_unless_present = "file")]
        counts: Vec<String>,

        /// JSON request file ({"counts": {...}})
        #[arg(long, conflicts_with = "counts")]
        file: Option<PathBuf>,
    },

    /// Show per-status mean, standard deviation and threshold
    Baseline {
        /// Compute locally from a history CSV
        #[arg(long, conflicts_with = "remote")]
        history: Option<PathBuf>,

        /// Fetch the baseline from the running monitor
        #[arg(long)]
        remote: bool,

        /// Standard deviations above the mean used for the threshold column
        #[arg(long)]
        std_multiplier: Option<f64>,
    },

    /// Total counts per hour of day and status
    Summary {
        /// History CSV to summarise
        #[arg(long)]
        history: PathBuf,

        /// Only these hours, comma separated (e.g. 8,9,15)
        #[arg(long)]
        hours: Option<String>,
    },

    /// Show health of the running monitor
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let file_config = config::Config::load()?;

    let api_url = cli
        .api_url
        .or(file_config.api_url)
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let format = cli
        .format
        .or_else(|| {
            file_config
                .default_format
                .as_deref()
                .and_then(output::OutputFormat::from_name)
        })
        .unwrap_or_default();

    let client = client::ApiClient::new(&api_url)?;

    match cli.command {
        Commands::Check { counts, file } => {
            check::check(&client, &counts, file.as_deref(), format).await?;
        }
        Commands::Baseline {
            history,
            remote,
            std_multiplier,
        } => {
            baseline::show_baseline(&client, history.as_deref(), remote, std_multiplier, format)
                .await?;
        }
        Commands::Summary { history, hours } => {
            summary::show_summary(&history, hours.as_deref(), format)?;
        }
        Commands::Health => {
            health::show_health(&client, format).await?;
        }
    }

    Ok(())
}
