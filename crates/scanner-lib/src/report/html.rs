//! HTML report rendering
//!
//! Pure presentation: every number here is derived from the already-processed
//! report list and the stats snapshot.

use super::count_by;
use crate::models::{StatsSnapshot, StoppedInstanceReport};
use chrono::Local;
use std::collections::HashSet;
use std::fmt::Write as _;

/// Age histogram buckets: label with inclusive day bounds.
const AGE_BUCKETS: [(&str, i64, i64); 5] = [
    ("0-29 days", 0, 29),
    ("30-89 days", 30, 89),
    ("90-179 days", 90, 179),
    ("180-364 days", 180, 364),
    ("365+ days", 365, i64::MAX),
];

const TOP_OLDEST: usize = 20;
const TOP_COMPARTMENTS: usize = 15;
const TOP_SHAPES: usize = 10;
const TOP_OWNERS: usize = 10;

const STYLE: &str = r#"
  * { margin: 0; padding: 0; box-sizing: border-box; }
  body { font-family: 'Segoe UI', sans-serif; background: #f4f5f7; color: #333; line-height: 1.6; }
  .container { max-width: 1400px; margin: 0 auto; padding: 20px; }
  .header { background: linear-gradient(135deg, #dc3545, #fd7e14); color: white; padding: 30px; border-radius: 12px; text-align: center; margin-bottom: 20px; }
  .header h1 { font-size: 2.2rem; margin-bottom: 10px; }
  .stats-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(180px, 1fr)); gap: 15px; margin-bottom: 20px; }
  .stat-card { background: white; padding: 20px; border-radius: 10px; text-align: center; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }
  .stat-number { font-size: 1.8rem; font-weight: bold; color: #dc3545; margin-bottom: 5px; }
  .stat-label { color: #666; font-size: 0.85rem; }
  .section { background: white; margin: 20px 0; border-radius: 10px; overflow: hidden; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }
  .section-header { background: linear-gradient(135deg, #dc3545, #fd7e14); color: white; padding: 15px; font-size: 1.1rem; font-weight: bold; }
  .section-content { padding: 15px; }
  table { width: 100%; border-collapse: collapse; }
  th, td { padding: 8px; text-align: left; border-bottom: 1px solid #ddd; font-size: 0.85rem; }
  th { background: #f5f5f5; font-weight: bold; }
  .age-critical { color: #dc3545; font-weight: bold; }
  .age-high { color: #fd7e14; font-weight: bold; }
  .age-medium { color: #ffc107; font-weight: bold; }
  .age-low { color: #28a745; font-weight: bold; }
  .breakdown-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(300px, 1fr)); gap: 20px; }
  .mono { font-family: monospace; font-size: 0.75rem; }
"#;

/// Render the full HTML document.
pub fn render_html(reports: &[StoppedInstanceReport], stats: &StatsSnapshot) -> String {
    let total = reports.len();
    let avg_days = if total > 0 {
        reports.iter().map(|r| r.days_since_created).sum::<i64>() as f64 / total as f64
    } else {
        0.0
    };
    let oldest_days = reports
        .iter()
        .map(|r| r.days_since_created)
        .max()
        .unwrap_or(0);
    let regions: HashSet<&str> = reports.iter().map(|r| r.region.as_str()).collect();
    let compartments: HashSet<&str> = reports.iter().map(|r| r.compartment_name.as_str()).collect();
    let shapes: HashSet<&str> = reports.iter().map(|r| r.shape.as_str()).collect();

    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    out.push_str("<meta charset=\"UTF-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    out.push_str("<title>Stopped Instances Report</title>\n");
    let _ = write!(out, "<style>{STYLE}</style>\n");
    out.push_str("</head>\n<body>\n<div class=\"container\">\n");

    let _ = write!(
        out,
        "<div class=\"header\"><h1>Stopped Instances Report</h1><div>Generated {}</div>\
         <div>{} regions scanned, {} compartments scanned, {} API calls</div></div>\n",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        stats.regions_scanned,
        stats.compartments_scanned,
        stats.api_calls_made
    );

    out.push_str("<div class=\"stats-grid\">\n");
    stat_card(&mut out, &total.to_string(), "Stopped Instances");
    stat_card(&mut out, &format!("{avg_days:.1}"), "Avg Days Old");
    stat_card(&mut out, &oldest_days.to_string(), "Oldest Instance (days)");
    stat_card(&mut out, &regions.len().to_string(), "Regions");
    stat_card(&mut out, &compartments.len().to_string(), "Compartments");
    stat_card(&mut out, &shapes.len().to_string(), "Instance Shapes");
    out.push_str("</div>\n");

    render_age_distribution(&mut out, reports);
    render_oldest_table(&mut out, reports);

    out.push_str("<div class=\"breakdown-grid\">\n");
    render_breakdown(
        &mut out,
        "Regional Distribution",
        count_by(reports, |r| r.region.clone()),
        usize::MAX,
        total,
    );
    render_breakdown(
        &mut out,
        "Compartment Distribution",
        count_by(reports, |r| r.compartment_name.clone()),
        TOP_COMPARTMENTS,
        total,
    );
    out.push_str("</div>\n<div class=\"breakdown-grid\">\n");
    render_breakdown(
        &mut out,
        "Shape Distribution",
        count_by(reports, |r| r.shape.clone()),
        TOP_SHAPES,
        total,
    );
    render_breakdown(
        &mut out,
        "Owner Distribution",
        count_by(reports, |r| r.instance_owner.clone()),
        TOP_OWNERS,
        total,
    );
    out.push_str("</div>\n");

    render_inventory(&mut out, reports);

    out.push_str("</div>\n</body>\n</html>\n");
    out
}

fn stat_card(out: &mut String, number: &str, label: &str) {
    let _ = write!(
        out,
        "<div class=\"stat-card\"><div class=\"stat-number\">{}</div>\
         <div class=\"stat-label\">{}</div></div>\n",
        escape(number),
        escape(label)
    );
}

fn render_age_distribution(out: &mut String, reports: &[StoppedInstanceReport]) {
    let total = reports.len();
    out.push_str("<div class=\"section\"><div class=\"section-header\">Age Distribution</div>\n");
    out.push_str("<div class=\"section-content\"><table>\n");
    out.push_str("<thead><tr><th>Age Range</th><th>Instance Count</th><th>Percentage</th><th>Priority</th></tr></thead>\n<tbody>\n");

    for (label, low, high) in AGE_BUCKETS {
        let count = reports
            .iter()
            .filter(|r| r.days_since_created >= low && r.days_since_created <= high)
            .count();
        let percentage = percentage(count, total);
        let (priority, class) = priority_for(low);
        let _ = write!(
            out,
            "<tr><td><strong>{label}</strong></td><td>{count}</td><td>{percentage:.1}%</td>\
             <td class=\"{class}\">{priority}</td></tr>\n"
        );
    }

    out.push_str("</tbody></table></div></div>\n");
}

fn render_oldest_table(out: &mut String, reports: &[StoppedInstanceReport]) {
    let _ = write!(
        out,
        "<div class=\"section\"><div class=\"section-header\">Top {TOP_OLDEST} Oldest Stopped Instances</div>\n"
    );
    out.push_str("<div class=\"section-content\"><table>\n");
    out.push_str("<thead><tr><th>Instance Name</th><th>Days Old</th><th>Created</th><th>Shape</th><th>Region</th><th>Compartment</th><th>Owner</th><th>Availability Domain</th></tr></thead>\n<tbody>\n");

    // Input is already sorted oldest first.
    for report in reports.iter().take(TOP_OLDEST) {
        let _ = write!(
            out,
            "<tr><td><strong>{}</strong></td><td class=\"{}\">{}</td><td>{}</td><td>{}</td>\
             <td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape(&report.instance_name),
            age_class(report.days_since_created),
            report.days_since_created,
            escape(created_date(&report.time_created)),
            escape(&report.shape),
            escape(&report.region),
            escape(&report.compartment_name),
            escape(&report.instance_owner),
            escape(&report.availability_domain),
        );
    }

    out.push_str("</tbody></table></div></div>\n");
}

fn render_breakdown(
    out: &mut String,
    title: &str,
    counts: Vec<(String, usize)>,
    top_n: usize,
    total: usize,
) {
    let _ = write!(
        out,
        "<div class=\"section\"><div class=\"section-header\">{}</div>\n",
        escape(title)
    );
    out.push_str("<div class=\"section-content\"><table>\n");
    out.push_str("<thead><tr><th>Name</th><th>Count</th><th>%</th></tr></thead>\n<tbody>\n");

    for (name, count) in counts.into_iter().take(top_n) {
        let _ = write!(
            out,
            "<tr><td><strong>{}</strong></td><td>{}</td><td>{:.1}%</td></tr>\n",
            escape(&name),
            count,
            percentage(count, total)
        );
    }

    out.push_str("</tbody></table></div></div>\n");
}

fn render_inventory(out: &mut String, reports: &[StoppedInstanceReport]) {
    out.push_str("<div class=\"section\"><div class=\"section-header\">Complete Inventory</div>\n");
    let _ = write!(
        out,
        "<div class=\"section-content\"><p>All {} stopped instances, oldest first:</p>\n<table>\n",
        reports.len()
    );
    out.push_str("<thead><tr><th>Instance Name</th><th>Days Old</th><th>Created</th><th>Shape</th><th>Region</th><th>Compartment</th><th>Owner</th><th>Instance ID</th></tr></thead>\n<tbody>\n");

    for report in reports {
        let _ = write!(
            out,
            "<tr><td><strong>{}</strong></td><td class=\"{}\">{}</td><td>{}</td><td>{}</td>\
             <td>{}</td><td>{}</td><td>{}</td><td class=\"mono\">{}</td></tr>\n",
            escape(&report.instance_name),
            age_class(report.days_since_created),
            report.days_since_created,
            escape(created_date(&report.time_created)),
            escape(&report.shape),
            escape(&report.region),
            escape(&report.compartment_name),
            escape(&report.instance_owner),
            escape(&report.instance_id),
        );
    }

    out.push_str("</tbody></table></div></div>\n");
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

fn priority_for(bucket_low: i64) -> (&'static str, &'static str) {
    if bucket_low >= 365 {
        ("CRITICAL", "age-critical")
    } else if bucket_low >= 180 {
        ("HIGH", "age-high")
    } else if bucket_low >= 90 {
        ("MEDIUM", "age-medium")
    } else {
        ("LOW", "age-low")
    }
}

fn age_class(days: i64) -> &'static str {
    if days >= 365 {
        "age-critical"
    } else if days >= 180 {
        "age-high"
    } else if days >= 90 {
        "age-medium"
    } else {
        "age-low"
    }
}

/// Date portion of the creation timestamp, for display. Timestamps are not
/// guaranteed well-formed here, so truncation must stay char-safe.
fn created_date(time_created: &str) -> &str {
    time_created.get(..10).unwrap_or(time_created)
}

/// Minimal HTML escaping for text content.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(name: &str, days: i64, shape: &str, owner: &str) -> StoppedInstanceReport {
        StoppedInstanceReport {
            instance_name: name.to_string(),
            instance_id: format!("ocid1.instance.oc1..{name}"),
            shape: shape.to_string(),
            region: "us-ashburn-1".to_string(),
            availability_domain: "AD-1".to_string(),
            compartment_name: "dev".to_string(),
            compartment_id: "ocid1.compartment.oc1..dev".to_string(),
            time_created: "2024-01-01T00:00:00Z".to_string(),
            days_since_created: days,
            instance_owner: owner.to_string(),
            fault_domain: "FD-1".to_string(),
            image_id: "ocid1.image.oc1..img".to_string(),
        }
    }

    #[test]
    fn buckets_and_breakdowns_appear() {
        let reports = vec![
            report("fresh", 5, "VM.Standard.E4.Flex", "alice"),
            report("aging", 100, "VM.Standard.E4.Flex", "bob"),
            report("stale", 400, "BM.Standard2.52", "alice"),
        ];
        let html = render_html(&reports, &StatsSnapshot::default());

        for (label, _, _) in AGE_BUCKETS {
            assert!(html.contains(label), "missing bucket {label}");
        }
        assert!(html.contains("Regional Distribution"));
        assert!(html.contains("Owner Distribution"));
        assert!(html.contains("BM.Standard2.52"));
        assert!(html.contains("age-critical"));
        assert!(html.contains("2024-01-01"));
    }

    #[test]
    fn instance_names_are_escaped() {
        let reports = vec![report("a<script>b", 1, "shape", "o&wner")];
        let html = render_html(&reports, &StatsSnapshot::default());
        assert!(html.contains("a&lt;script&gt;b"));
        assert!(html.contains("o&amp;wner"));
        assert!(!html.contains("a<script>b"));
    }

    #[test]
    fn renders_multibyte_timestamp_without_panicking() {
        // Unparseable timestamps survive processing with age 0, so the
        // renderer must not assume byte 10 is a char boundary.
        let mut record = report("odd-clock", 0, "s", "o");
        record.time_created = "123456789€xx".to_string();
        let html = render_html(&[record], &StatsSnapshot::default());
        assert!(html.contains("123456789€xx"));

        assert_eq!(created_date("123456789€xx"), "123456789€xx");
        assert_eq!(created_date("2024-01-01T00:00:00Z"), "2024-01-01");
        assert_eq!(created_date("short"), "short");
    }

    #[test]
    fn bucket_boundaries_are_inclusive() {
        let reports = vec![
            report("edge29", 29, "s", "o"),
            report("edge30", 30, "s", "o"),
            report("edge364", 364, "s", "o"),
            report("edge365", 365, "s", "o"),
        ];
        let html = render_html(&reports, &StatsSnapshot::default());
        // Two buckets get one entry each, two get one each; the LOW bucket
        // holds only edge29.
        assert!(html.contains("<td><strong>0-29 days</strong></td><td>1</td>"));
        assert!(html.contains("<td><strong>30-89 days</strong></td><td>1</td>"));
        assert!(html.contains("<td><strong>180-364 days</strong></td><td>1</td>"));
        assert!(html.contains("<td><strong>365+ days</strong></td><td>1</td>"));
    }
}
