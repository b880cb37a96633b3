//! Capability seams for the cloud identity and compute APIs
//!
//! The scanner never talks to the cloud directly; it goes through these
//! traits so the production adapter (the `oci` CLI subprocess) and test
//! doubles are interchangeable.

mod oci_cli;

pub use oci_cli::OciCliClient;

use crate::models::RawInstance;
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Errors surfaced by the capability layer.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("service error {code}: {message}")]
    Service { code: String, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("{0}")]
    Other(String),
}

/// Keywords used to classify opaque errors as transient. Only consulted for
/// [`ApiError::Other`]; typed variants are classified directly.
const TRANSIENT_KEYWORDS: [&str; 3] = ["timeout", "connection", "max retries"];

impl ApiError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Timeout(_) | ApiError::Connection(_) => true,
            ApiError::Service { .. } | ApiError::Malformed(_) => false,
            ApiError::Other(message) => {
                let lower = message.to_lowercase();
                TRANSIENT_KEYWORDS.iter().any(|k| lower.contains(k))
            }
        }
    }
}

/// A tenancy's subscription to one region.
#[derive(Debug, Clone, Deserialize)]
pub struct RegionSubscription {
    #[serde(rename = "region-name", alias = "region_name")]
    pub region_name: String,
    #[serde(default)]
    pub status: String,
}

/// Compartment as returned by the identity capability.
#[derive(Debug, Clone, Deserialize)]
pub struct CompartmentSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "lifecycle-state", alias = "lifecycle_state", default)]
    pub lifecycle_state: String,
}

/// Tenancy root metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct Tenancy {
    pub id: String,
    pub name: String,
}

/// Identity capability: regions, compartments, tenancy metadata.
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// List all region subscriptions for the tenancy.
    async fn list_subscribed_regions(
        &self,
        tenancy_id: &str,
    ) -> Result<Vec<RegionSubscription>, ApiError>;

    /// Fetch a single compartment by id.
    async fn get_compartment(&self, compartment_id: &str) -> Result<CompartmentSummary, ApiError>;

    /// List all accessible compartments in the subtree rooted at `root_id`.
    async fn list_compartments_recursive(
        &self,
        root_id: &str,
    ) -> Result<Vec<CompartmentSummary>, ApiError>;

    /// Fetch tenancy metadata.
    async fn get_tenancy(&self, tenancy_id: &str) -> Result<Tenancy, ApiError>;
}

/// Compute capability: instance listing.
#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// List instances in one compartment of one region, filtered to the
    /// given lifecycle state.
    async fn list_instances(
        &self,
        region: &str,
        compartment_id: &str,
        lifecycle_state: &str,
    ) -> Result<Vec<RawInstance>, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_errors_classify_without_text_matching() {
        assert!(ApiError::Timeout("read".into()).is_transient());
        assert!(ApiError::Connection("refused".into()).is_transient());
        assert!(!ApiError::Service {
            code: "NotAuthorized".into(),
            message: "forbidden".into()
        }
        .is_transient());
        assert!(!ApiError::Malformed("bad json".into()).is_transient());
    }

    #[test]
    fn opaque_errors_fall_back_to_keyword_heuristic() {
        assert!(ApiError::Other("Read Timeout on endpoint".into()).is_transient());
        assert!(ApiError::Other("Connection reset by peer".into()).is_transient());
        assert!(ApiError::Other("Max retries exceeded".into()).is_transient());
        assert!(!ApiError::Other("compartment not found".into()).is_transient());
    }
}
