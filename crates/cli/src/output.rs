//! Output formatting utilities

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use scanner_lib::StoppedInstanceReport;
use tabled::{settings::Style, Table, Tabled};

/// Output format for the stdout listing.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

#[derive(Tabled)]
struct InstanceRow {
    #[tabled(rename = "Instance")]
    name: String,
    #[tabled(rename = "Days Old")]
    days: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Shape")]
    shape: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Compartment")]
    compartment: String,
    #[tabled(rename = "Owner")]
    owner: String,
}

impl From<&StoppedInstanceReport> for InstanceRow {
    fn from(report: &StoppedInstanceReport) -> Self {
        Self {
            name: report.instance_name.clone(),
            days: color_age(report.days_since_created),
            created: report.time_created.chars().take(10).collect(),
            shape: report.shape.clone(),
            region: report.region.clone(),
            compartment: report.compartment_name.clone(),
            owner: report.instance_owner.clone(),
        }
    }
}

/// Print the report listing as a table or JSON.
pub fn print_reports(reports: &[StoppedInstanceReport], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            if reports.is_empty() {
                println!("{}", "No stopped instances found".yellow());
                return Ok(());
            }
            let rows: Vec<InstanceRow> = reports.iter().map(InstanceRow::from).collect();
            let table = Table::new(rows).with(Style::rounded()).to_string();
            println!("{table}");
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(reports)?);
        }
    }
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Color an age by how overdue for cleanup it is.
fn color_age(days: i64) -> String {
    let text = days.to_string();
    if days >= 365 {
        text.red().bold().to_string()
    } else if days >= 180 {
        text.yellow().bold().to_string()
    } else if days >= 90 {
        text.yellow().to_string()
    } else {
        text.green().to_string()
    }
}
