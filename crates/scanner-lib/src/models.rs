//! Core data models for the stopped-instance scanner

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Defined tags are namespaced: namespace -> key -> value.
pub type DefinedTags = HashMap<String, HashMap<String, serde_json::Value>>;

/// One cell of the region x compartment scan matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanTarget {
    pub region: String,
    pub compartment_id: String,
}

impl ScanTarget {
    pub fn new(region: impl Into<String>, compartment_id: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            compartment_id: compartment_id.into(),
        }
    }
}

/// Raw instance record as returned by the listing capability.
///
/// Fields follow the kebab-case keys of the OCI JSON output; anything the
/// service may omit defaults instead of failing deserialization. The
/// processor decides what counts as malformed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawInstance {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "display-name", alias = "display_name", default)]
    pub display_name: String,
    #[serde(default)]
    pub shape: String,
    #[serde(rename = "availability-domain", alias = "availability_domain", default)]
    pub availability_domain: Option<String>,
    #[serde(rename = "fault-domain", alias = "fault_domain", default)]
    pub fault_domain: Option<String>,
    #[serde(rename = "compartment-id", alias = "compartment_id", default)]
    pub compartment_id: String,
    #[serde(rename = "time-created", alias = "time_created", default)]
    pub time_created: String,
    #[serde(rename = "freeform-tags", alias = "freeform_tags", default)]
    pub freeform_tags: HashMap<String, String>,
    #[serde(rename = "defined-tags", alias = "defined_tags", default)]
    pub defined_tags: DefinedTags,
    #[serde(rename = "image-id", alias = "image_id", default)]
    pub image_id: Option<String>,
    /// Source region, tagged by the executor before aggregation. Not part of
    /// the service response.
    #[serde(default)]
    pub region: String,
}

/// Fully derived record for one stopped instance. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoppedInstanceReport {
    pub instance_name: String,
    pub instance_id: String,
    pub shape: String,
    pub region: String,
    pub availability_domain: String,
    pub compartment_name: String,
    pub compartment_id: String,
    pub time_created: String,
    pub days_since_created: i64,
    pub instance_owner: String,
    pub fault_domain: String,
    pub image_id: String,
}

/// Shared scan counters. Incremented concurrently by up to `max_workers`
/// tasks, so everything is atomic.
#[derive(Debug, Default)]
pub struct ScanStats {
    regions_scanned: AtomicUsize,
    compartments_scanned: AtomicUsize,
    instances_found: AtomicUsize,
    api_calls_made: AtomicUsize,
}

impl ScanStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_api_call(&self) {
        self.api_calls_made.fetch_add(1, Ordering::SeqCst);
    }

    pub fn set_regions_scanned(&self, count: usize) {
        self.regions_scanned.store(count, Ordering::SeqCst);
    }

    pub fn set_compartments_scanned(&self, count: usize) {
        self.compartments_scanned.store(count, Ordering::SeqCst);
    }

    pub fn set_instances_found(&self, count: usize) {
        self.instances_found.store(count, Ordering::SeqCst);
    }

    pub fn api_calls_made(&self) -> usize {
        self.api_calls_made.load(Ordering::SeqCst)
    }

    /// Point-in-time copy for the renderers.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            regions_scanned: self.regions_scanned.load(Ordering::SeqCst),
            compartments_scanned: self.compartments_scanned.load(Ordering::SeqCst),
            instances_found: self.instances_found.load(Ordering::SeqCst),
            api_calls_made: self.api_calls_made.load(Ordering::SeqCst),
        }
    }
}

/// Immutable view of the counters, consumed by the report renderers.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatsSnapshot {
    pub regions_scanned: usize,
    pub compartments_scanned: usize,
    pub instances_found: usize,
    pub api_calls_made: usize,
}
