//! Production capability adapter backed by the `oci` command-line client
//!
//! Each call spawns one short-lived `oci ... --output json` process, so no
//! client object is shared between concurrent scan tasks. The process is
//! killed if it outlives the per-call timeout.

use super::{ApiError, CompartmentSummary, ComputeApi, IdentityApi, RegionSubscription, Tenancy};
use crate::models::RawInstance;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::process::Stdio;
use std::time::Duration;
use tracing::debug;

/// Default per-call timeout, matching the service read timeout the scanner
/// advertises in its CLI help.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(300);

/// Capability client that shells out to the `oci` binary.
#[derive(Debug, Clone)]
pub struct OciCliClient {
    binary: String,
    profile: String,
    call_timeout: Duration,
}

impl OciCliClient {
    pub fn new(profile: impl Into<String>, call_timeout: Duration) -> Self {
        Self {
            binary: "oci".to_string(),
            profile: profile.into(),
            call_timeout,
        }
    }

    /// Override the binary name, for environments where `oci` is not on PATH.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    async fn invoke(&self, args: &[&str]) -> Result<serde_json::Value, ApiError> {
        let mut full_args = vec!["--profile", self.profile.as_str(), "--output", "json"];
        full_args.extend_from_slice(args);
        debug!(binary = %self.binary, args = ?full_args, "invoking oci CLI");

        let mut child = tokio::process::Command::new(&self.binary)
            .args(&full_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ApiError::Connection(format!("failed to spawn {}: {e}", self.binary)))?;

        let output = match tokio::time::timeout(self.call_timeout, child.wait_with_output()).await {
            Ok(result) => result
                .map_err(|e| ApiError::Other(format!("waiting for {}: {e}", self.binary)))?,
            Err(_) => {
                return Err(ApiError::Timeout(format!(
                    "{} produced no response within {}s",
                    self.binary,
                    self.call_timeout.as_secs()
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_cli_failure(stderr.trim()));
        }

        // Some list operations print nothing at all for an empty result set.
        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::json!({ "data": [] }));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| ApiError::Malformed(format!("invalid JSON from {}: {e}", self.binary)))
    }

    /// Invoke and deserialize the `data` envelope the CLI wraps every
    /// response in.
    async fn invoke_data<T: DeserializeOwned>(&self, args: &[&str]) -> Result<T, ApiError> {
        let value = self.invoke(args).await?;
        let data = value
            .get("data")
            .cloned()
            .ok_or_else(|| ApiError::Malformed("response missing `data` envelope".to_string()))?;
        serde_json::from_value(data).map_err(|e| ApiError::Malformed(e.to_string()))
    }
}

/// Map a non-zero CLI exit to an error class. The CLI emits a structured
/// `ServiceError` block for API-level failures; everything else stays opaque
/// and is left to the keyword heuristic.
fn classify_cli_failure(stderr: &str) -> ApiError {
    if let Some(start) = stderr.find('{') {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&stderr[start..]) {
            if let (Some(code), Some(message)) = (
                value.get("code").and_then(|v| v.as_str()),
                value.get("message").and_then(|v| v.as_str()),
            ) {
                return ApiError::Service {
                    code: code.to_string(),
                    message: message.to_string(),
                };
            }
        }
    }
    ApiError::Other(stderr.to_string())
}

#[async_trait]
impl IdentityApi for OciCliClient {
    async fn list_subscribed_regions(
        &self,
        tenancy_id: &str,
    ) -> Result<Vec<RegionSubscription>, ApiError> {
        self.invoke_data(&[
            "iam",
            "region-subscription",
            "list",
            "--tenancy-id",
            tenancy_id,
        ])
        .await
    }

    async fn get_compartment(&self, compartment_id: &str) -> Result<CompartmentSummary, ApiError> {
        self.invoke_data(&["iam", "compartment", "get", "--compartment-id", compartment_id])
            .await
    }

    async fn list_compartments_recursive(
        &self,
        root_id: &str,
    ) -> Result<Vec<CompartmentSummary>, ApiError> {
        self.invoke_data(&[
            "iam",
            "compartment",
            "list",
            "--compartment-id",
            root_id,
            "--compartment-id-in-subtree",
            "true",
            "--access-level",
            "ACCESSIBLE",
            "--all",
        ])
        .await
    }

    async fn get_tenancy(&self, tenancy_id: &str) -> Result<Tenancy, ApiError> {
        self.invoke_data(&["iam", "tenancy", "get", "--tenancy-id", tenancy_id])
            .await
    }
}

#[async_trait]
impl ComputeApi for OciCliClient {
    async fn list_instances(
        &self,
        region: &str,
        compartment_id: &str,
        lifecycle_state: &str,
    ) -> Result<Vec<RawInstance>, ApiError> {
        self.invoke_data(&[
            "--region",
            region,
            "compute",
            "instance",
            "list",
            "--compartment-id",
            compartment_id,
            "--lifecycle-state",
            lifecycle_state,
            "--all",
        ])
        .await
    }
}
