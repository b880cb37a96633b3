//! Plain-text summary printed to stdout

use super::count_by;
use crate::models::{StatsSnapshot, StoppedInstanceReport};
use std::fmt::Write as _;
use std::time::Duration;

/// Render the end-of-run text summary: totals, averages, per-region and
/// top-compartment counts, and call statistics.
pub fn render_summary(
    reports: &[StoppedInstanceReport],
    stats: &StatsSnapshot,
    elapsed: Duration,
) -> String {
    if reports.is_empty() {
        return "No stopped instances found.".to_string();
    }

    let total = reports.len();
    let avg_days = reports.iter().map(|r| r.days_since_created).sum::<i64>() as f64 / total as f64;
    // Reports are sorted oldest first, but don't depend on that here.
    let oldest = reports
        .iter()
        .max_by_key(|r| r.days_since_created)
        .expect("non-empty reports");

    let mut by_region = count_by(reports, |r| r.region.clone());
    by_region.sort_by(|a, b| a.0.cmp(&b.0));
    let by_compartment = count_by(reports, |r| r.compartment_name.clone());

    let mut out = String::new();
    out.push_str("STOPPED INSTANCES SUMMARY\n");
    out.push_str("=========================\n");
    let _ = writeln!(out, "Total stopped instances: {total}");
    let _ = writeln!(out, "Average days since created: {avg_days:.1}");
    let _ = writeln!(
        out,
        "Oldest instance: {} ({} days)",
        oldest.instance_name, oldest.days_since_created
    );

    out.push_str("\nBy region:\n");
    for (region, count) in &by_region {
        let _ = writeln!(out, "  {region}: {count}");
    }

    out.push_str("\nBy compartment (top 10):\n");
    for (compartment, count) in by_compartment.iter().take(10) {
        let _ = writeln!(out, "  {compartment}: {count}");
    }

    let _ = writeln!(
        out,
        "\nScanned {} regions and {} compartments in {:.1}s ({} API calls)",
        stats.regions_scanned,
        stats.compartments_scanned,
        elapsed.as_secs_f64(),
        stats.api_calls_made
    );

    out
}
