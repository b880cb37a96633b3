//! Owner and age extraction from raw instance metadata
//!
//! Pure functions: no capability calls, no shared state.

use crate::models::DefinedTags;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::collections::HashMap;
use tracing::warn;

/// Freeform tag keys checked for ownership, highest priority first.
const FREEFORM_OWNER_KEYS: [&str; 5] = ["Owner", "CreatedBy", "Contact", "Maintainer", "Team"];

/// Keys checked within each defined-tag namespace when no freeform tag
/// matched. Namespace iteration order is whatever the source map provides.
const DEFINED_OWNER_KEYS: [&str; 4] = ["Owner", "CreatedBy", "Contact", "ApplicationOwner"];

/// Derive an owner string from instance tags. Freeform tags win over defined
/// tags; within each, the first matching key wins. No match yields "Unknown".
pub fn extract_owner(freeform_tags: &HashMap<String, String>, defined_tags: &DefinedTags) -> String {
    for key in FREEFORM_OWNER_KEYS {
        if let Some(value) = freeform_tags.get(key) {
            return value.clone();
        }
    }

    for namespace_tags in defined_tags.values() {
        for key in DEFINED_OWNER_KEYS {
            if let Some(value) = namespace_tags.get(key) {
                return match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
            }
        }
    }

    "Unknown".to_string()
}

/// Whole days between `time_created` and `now`, floored at 0. Empty or
/// unparseable input defaults to 0 with a warning rather than failing the
/// record.
pub fn age_days(time_created: &str, now: DateTime<Utc>) -> i64 {
    if time_created.is_empty() {
        return 0;
    }

    match parse_timestamp(time_created) {
        Some(created) => (now - created).num_days().max(0),
        None => {
            warn!(value = %time_created, "unparseable creation timestamp, defaulting age to 0");
            0
        }
    }
}

/// Convenience wrapper evaluating the age against the current instant.
pub fn age_days_now(time_created: &str) -> i64 {
    age_days(time_created, Utc::now())
}

/// Parse the timestamp shapes the service emits: RFC 3339 with `Z` or
/// `+00:00`, the space-separated SDK variant, each with or without
/// fractional seconds, and offset-less values assumed to be UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    let normalized = raw.replacen(' ', "T", 1);
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(parsed.with_timezone(&Utc));
    }

    normalized
        .parse::<NaiveDateTime>()
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
