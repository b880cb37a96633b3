//! Core library for the stopped-instance scanner
//!
//! This crate provides the pipeline behind the `stopscan` binary:
//! - Capability traits over the cloud identity/compute APIs
//! - Region and compartment discovery with per-run caches
//! - Bounded-concurrency scan of the region x compartment matrix
//! - Owner/age extraction and result processing
//! - CSV, HTML, and text report rendering

pub mod capability;
pub mod discovery;
pub mod models;
pub mod process;
pub mod report;
pub mod scan;
pub mod tags;

pub use capability::{ApiError, ComputeApi, IdentityApi, OciCliClient};
pub use discovery::ScanUniverse;
pub use models::*;
pub use report::ReportWriter;
pub use scan::{RetryPolicy, ScanExecutor, ScanOutcome};
