//! Result processing: raw instances into sorted, filtered reports

use crate::models::{RawInstance, StoppedInstanceReport};
use crate::tags;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{info, warn};

/// Map raw records into reports, drop anything younger than `min_days`, and
/// sort oldest first. The sort is stable, so records of equal age keep their
/// input order. Malformed records are logged and skipped, never fatal.
pub fn process(
    raws: &[RawInstance],
    min_days: i64,
    compartment_names: &HashMap<String, String>,
    now: DateTime<Utc>,
) -> Vec<StoppedInstanceReport> {
    let mut reports = Vec::with_capacity(raws.len());

    for raw in raws {
        let Some(report) = build_report(raw, compartment_names, now) else {
            warn!(instance_id = %raw.id, "skipping malformed instance record");
            continue;
        };
        if report.days_since_created >= min_days {
            reports.push(report);
        }
    }

    reports.sort_by(|a, b| b.days_since_created.cmp(&a.days_since_created));

    info!(
        kept = reports.len(),
        total = raws.len(),
        min_days,
        "processing complete"
    );
    reports
}

/// Derive one report from one raw record. Records without an id or display
/// name are malformed; optional placement and image fields default to
/// "Unknown".
fn build_report(
    raw: &RawInstance,
    compartment_names: &HashMap<String, String>,
    now: DateTime<Utc>,
) -> Option<StoppedInstanceReport> {
    if raw.id.is_empty() || raw.display_name.is_empty() {
        return None;
    }

    let compartment_name = compartment_names
        .get(&raw.compartment_id)
        .cloned()
        .unwrap_or_else(|| "Unknown".to_string());

    Some(StoppedInstanceReport {
        instance_name: raw.display_name.clone(),
        instance_id: raw.id.clone(),
        shape: raw.shape.clone(),
        region: raw.region.clone(),
        availability_domain: raw
            .availability_domain
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
        compartment_name,
        compartment_id: raw.compartment_id.clone(),
        time_created: raw.time_created.clone(),
        days_since_created: tags::age_days(&raw.time_created, now),
        instance_owner: tags::extract_owner(&raw.freeform_tags, &raw.defined_tags),
        fault_domain: raw
            .fault_domain
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
        image_id: raw.image_id.clone().unwrap_or_else(|| "Unknown".to_string()),
    })
}
