//! CSV rendering for stopped-instance reports

use crate::models::StoppedInstanceReport;

/// Column order, matching the report field names.
pub const CSV_HEADER: [&str; 12] = [
    "instance_name",
    "instance_id",
    "shape",
    "region",
    "availability_domain",
    "compartment_name",
    "compartment_id",
    "time_created",
    "days_since_created",
    "instance_owner",
    "fault_domain",
    "image_id",
];

/// Render a header row plus one row per report.
pub fn render_csv(reports: &[StoppedInstanceReport]) -> String {
    let mut out = String::new();
    out.push_str(&CSV_HEADER.join(","));
    out.push('\n');

    for report in reports {
        let fields = [
            report.instance_name.as_str(),
            report.instance_id.as_str(),
            report.shape.as_str(),
            report.region.as_str(),
            report.availability_domain.as_str(),
            report.compartment_name.as_str(),
            report.compartment_id.as_str(),
            report.time_created.as_str(),
            &report.days_since_created.to_string(),
            report.instance_owner.as_str(),
            report.fault_domain.as_str(),
            report.image_id.as_str(),
        ];
        let row: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

/// Quote a field when it contains a delimiter, quote, or newline.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
