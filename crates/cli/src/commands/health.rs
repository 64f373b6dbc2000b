//! Query the health of a running monitor

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{
    color_status, format_unix_timestamp, print_info, print_json, print_table, OutputFormat,
};

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    component: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Last Check")]
    last_check: String,
}

pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health = client.health().await?;

    match format {
        OutputFormat::Json => print_json(&health)?,
        OutputFormat::Table => {
            println!("{} {}", "Overall:".bold(), color_status(health.status.as_str()));

            if health.components.is_empty() {
                print_info("No components registered");
                return Ok(());
            }

            let rows: Vec<ComponentRow> = health
                .components
                .iter()
                .map(|(component, h)| ComponentRow {
                    component: component.to_string(),
                    status: color_status(h.status.as_str()),
                    message: h.message.clone().unwrap_or_default(),
                    last_check: format_unix_timestamp(h.last_check_timestamp),
                })
                .collect();
            print_table(rows);
        }
    }

    Ok(())
}
