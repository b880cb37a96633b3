//! stopscan — list stopped compute instances across an OCI tenancy
//!
//! One bounded scan-and-report pass per invocation: resolve the scan
//! universe, fan out over the region x compartment matrix, then render
//! CSV/HTML artifacts and a text summary.

mod config;
mod output;

use anyhow::{bail, Context, Result};
use clap::Parser;
use scanner_lib::{
    process, report, scan, ComputeApi, IdentityApi, OciCliClient, ReportWriter, RetryPolicy,
    ScanExecutor, ScanStats, ScanUniverse,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Lists stopped compute instances across an OCI tenancy
#[derive(Parser)]
#[command(name = "stopscan")]
#[command(author, version, about = "List stopped compute instances across an OCI tenancy", long_about = None)]
struct Cli {
    /// Minimum days since creation
    #[arg(long, default_value_t = 0)]
    min_days: i64,

    /// Comma-separated compartment OCIDs (scans all accessible compartments
    /// if not specified)
    #[arg(long, value_delimiter = ',')]
    compartments: Option<Vec<String>>,

    /// Comma-separated region names (scans all subscribed regions if not
    /// specified)
    #[arg(long, value_delimiter = ',')]
    regions: Option<Vec<String>>,

    /// Comma-separated regions to skip
    #[arg(long, value_delimiter = ',')]
    skip_regions: Option<Vec<String>>,

    /// OCI config profile
    #[arg(long, env = "OCI_CLI_PROFILE", default_value = "DEFAULT")]
    profile: String,

    /// Tenancy OCID (read from the config profile if not provided)
    #[arg(long)]
    tenancy_id: Option<String>,

    /// Output directory for reports
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Maximum parallel scan workers
    #[arg(long, default_value_t = 20)]
    max_workers: usize,

    /// Per-call timeout in seconds
    #[arg(long, default_value_t = 300)]
    timeout: u64,

    /// Output format for the stdout listing
    #[arg(long, short, default_value = "table")]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(fmt::layer().with_target(false))
        .init();

    // Setup errors (missing config, no tenancy) abort before any scanning.
    let profile = config::OciProfile::load(&cli.profile)?;
    let tenancy_id = cli
        .tenancy_id
        .clone()
        .or(profile.tenancy)
        .context("tenancy OCID not found in config profile or --tenancy-id")?;

    info!(
        profile = %cli.profile,
        tenancy = %tenancy_id,
        home_region = profile.region.as_deref().unwrap_or("unknown"),
        "configuration loaded"
    );

    run(cli, tenancy_id).await
}

async fn run(cli: Cli, tenancy_id: String) -> Result<()> {
    let start = Instant::now();
    let call_timeout = Duration::from_secs(cli.timeout);

    let stats = Arc::new(ScanStats::new());
    let client = Arc::new(OciCliClient::new(cli.profile.clone(), call_timeout));
    let identity: Arc<dyn IdentityApi> = client.clone();
    let compute: Arc<dyn ComputeApi> = client;

    let universe = ScanUniverse::new(
        identity,
        tenancy_id,
        cli.compartments.clone(),
        stats.clone(),
    );

    // Ctrl-C stops submission of new scan cells; in-flight cells drain.
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    let mut regions = match &cli.regions {
        Some(explicit) => explicit.clone(),
        None => universe.regions().await.to_vec(),
    };
    if let Some(skip) = &cli.skip_regions {
        regions.retain(|r| !skip.contains(r));
        output::print_warning(&format!("skipping regions: {}", skip.join(", ")));
    }

    let compartments = universe.compartments().await;
    stats.set_regions_scanned(regions.len());
    stats.set_compartments_scanned(compartments.len());

    let targets = scan::build_targets(&regions, compartments.keys());
    info!(
        regions = regions.len(),
        compartments = compartments.len(),
        cells = targets.len(),
        "scanning for stopped instances"
    );

    let executor = ScanExecutor::new(compute, stats.clone())
        .with_max_workers(cli.max_workers)
        .with_retry_policy(RetryPolicy::default())
        // The adapter enforces the call timeout itself; give the outer guard
        // a little headroom so the typed timeout error wins.
        .with_call_timeout(call_timeout + Duration::from_secs(5));
    let outcome = executor.scan(targets, shutdown_rx).await;

    if outcome.interrupted {
        output::print_warning("scan interrupted by user");
        bail!("scan interrupted");
    }

    let reports = process::process(
        &outcome.instances,
        cli.min_days,
        compartments,
        chrono::Utc::now(),
    );
    let snapshot = stats.snapshot();

    println!();
    println!("{}", report::render_summary(&reports, &snapshot, start.elapsed()));

    if reports.is_empty() {
        output::print_success(&format!(
            "no stopped instances found over the {}-day threshold",
            cli.min_days
        ));
        return Ok(());
    }

    output::print_reports(&reports, cli.format)?;

    let writer = ReportWriter::new(cli.output_dir.clone());
    let csv_path = writer.write_csv(&reports).await?;
    let html_path = writer.write_html(&reports, &snapshot).await?;
    output::print_info(&format!("CSV report: {}", csv_path.display()));
    output::print_info(&format!("HTML report: {}", html_path.display()));

    Ok(())
}
