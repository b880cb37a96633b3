//! Scan universe discovery: subscribed regions and accessible compartments
//!
//! `ScanUniverse` owns the per-run caches. Both lookups are memoized, so
//! repeat calls return the cached answer without further capability calls.

use crate::capability::IdentityApi;
use crate::models::ScanStats;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Regions assumed reachable when subscription listing fails.
pub const FALLBACK_REGIONS: [&str; 2] = ["us-ashburn-1", "us-phoenix-1"];

/// Per-run view of what to scan. Construct one per invocation; the caches
/// are not invalidated within a run.
pub struct ScanUniverse {
    identity: Arc<dyn IdentityApi>,
    tenancy_id: String,
    explicit_compartments: Option<Vec<String>>,
    stats: Arc<ScanStats>,
    regions: OnceCell<Vec<String>>,
    compartments: OnceCell<HashMap<String, String>>,
}

impl ScanUniverse {
    pub fn new(
        identity: Arc<dyn IdentityApi>,
        tenancy_id: impl Into<String>,
        explicit_compartments: Option<Vec<String>>,
        stats: Arc<ScanStats>,
    ) -> Self {
        Self {
            identity,
            tenancy_id: tenancy_id.into(),
            explicit_compartments,
            stats,
            regions: OnceCell::new(),
            compartments: OnceCell::new(),
        }
    }

    pub fn tenancy_id(&self) -> &str {
        &self.tenancy_id
    }

    /// Subscribed regions in READY status. Falls back to a fixed pair of
    /// regions rather than failing the run.
    pub async fn regions(&self) -> &[String] {
        self.regions
            .get_or_init(|| async { self.resolve_regions().await })
            .await
    }

    /// Compartment id -> display name. Explicit ids are resolved
    /// individually; otherwise the whole accessible subtree plus the tenancy
    /// root.
    pub async fn compartments(&self) -> &HashMap<String, String> {
        self.compartments
            .get_or_init(|| async { self.resolve_compartments().await })
            .await
    }

    async fn resolve_regions(&self) -> Vec<String> {
        self.stats.record_api_call();
        match self.identity.list_subscribed_regions(&self.tenancy_id).await {
            Ok(subscriptions) => {
                let regions: Vec<String> = subscriptions
                    .into_iter()
                    .filter(|s| s.status.eq_ignore_ascii_case("READY"))
                    .map(|s| s.region_name)
                    .collect();
                info!(count = regions.len(), "resolved subscribed regions");
                regions
            }
            Err(e) => {
                warn!(error = %e, "failed to list subscribed regions, using fallback list");
                FALLBACK_REGIONS.iter().map(|r| r.to_string()).collect()
            }
        }
    }

    async fn resolve_compartments(&self) -> HashMap<String, String> {
        if let Some(ids) = &self.explicit_compartments {
            return self.resolve_explicit(ids).await;
        }

        let mut cache = HashMap::new();
        self.stats.record_api_call();
        match self
            .identity
            .list_compartments_recursive(&self.tenancy_id)
            .await
        {
            Ok(compartments) => {
                for compartment in compartments {
                    if compartment.lifecycle_state.eq_ignore_ascii_case("ACTIVE") {
                        cache.insert(compartment.id, compartment.name);
                    }
                }
                cache.insert(self.tenancy_id.clone(), self.root_name().await);
                info!(count = cache.len(), "resolved accessible compartments");
            }
            Err(e) => {
                warn!(error = %e, "failed to list compartments, scanning root only");
                cache.insert(self.tenancy_id.clone(), "Root Compartment".to_string());
            }
        }
        cache
    }

    async fn resolve_explicit(&self, ids: &[String]) -> HashMap<String, String> {
        let mut cache = HashMap::new();
        for id in ids {
            self.stats.record_api_call();
            let name = match self.identity.get_compartment(id).await {
                Ok(compartment) => compartment.name,
                Err(e) => {
                    warn!(compartment_id = %id, error = %e, "could not resolve compartment name");
                    "Unknown".to_string()
                }
            };
            cache.insert(id.clone(), name);
        }
        cache
    }

    async fn root_name(&self) -> String {
        self.stats.record_api_call();
        match self.identity.get_tenancy(&self.tenancy_id).await {
            Ok(tenancy) => format!("{} (Root)", tenancy.name),
            Err(e) => {
                warn!(error = %e, "could not resolve tenancy name");
                "Root Compartment".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{
        ApiError, CompartmentSummary, IdentityApi, RegionSubscription, Tenancy,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Identity double with scripted answers and call counting.
    struct MockIdentity {
        regions: Result<Vec<RegionSubscription>, ()>,
        compartments: Result<Vec<CompartmentSummary>, ()>,
        tenancy_name: Result<&'static str, ()>,
        calls: AtomicUsize,
    }

    impl MockIdentity {
        fn healthy() -> Self {
            Self {
                regions: Ok(vec![
                    subscription("us-ashburn-1", "READY"),
                    subscription("eu-frankfurt-1", "READY"),
                    subscription("ap-tokyo-1", "CREATING"),
                ]),
                compartments: Ok(vec![
                    compartment("ocid1.compartment.oc1..dev", "dev", "ACTIVE"),
                    compartment("ocid1.compartment.oc1..old", "old", "DELETED"),
                    compartment("ocid1.compartment.oc1..prod", "prod", "ACTIVE"),
                ]),
                tenancy_name: Ok("acme"),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn subscription(name: &str, status: &str) -> RegionSubscription {
        RegionSubscription {
            region_name: name.to_string(),
            status: status.to_string(),
        }
    }

    fn compartment(id: &str, name: &str, state: &str) -> CompartmentSummary {
        CompartmentSummary {
            id: id.to_string(),
            name: name.to_string(),
            lifecycle_state: state.to_string(),
        }
    }

    #[async_trait]
    impl IdentityApi for MockIdentity {
        async fn list_subscribed_regions(
            &self,
            _tenancy_id: &str,
        ) -> Result<Vec<RegionSubscription>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.regions
                .clone()
                .map_err(|()| ApiError::Connection("unreachable".into()))
        }

        async fn get_compartment(
            &self,
            compartment_id: &str,
        ) -> Result<CompartmentSummary, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if compartment_id.ends_with("known") {
                Ok(compartment(compartment_id, "known-name", "ACTIVE"))
            } else {
                Err(ApiError::Service {
                    code: "NotAuthorizedOrNotFound".into(),
                    message: "no such compartment".into(),
                })
            }
        }

        async fn list_compartments_recursive(
            &self,
            _root_id: &str,
        ) -> Result<Vec<CompartmentSummary>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.compartments
                .clone()
                .map_err(|()| ApiError::Timeout("listing".into()))
        }

        async fn get_tenancy(&self, tenancy_id: &str) -> Result<Tenancy, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.tenancy_name
                .map_err(|()| ApiError::Timeout("tenancy".into()))
                .map(|name| Tenancy {
                    id: tenancy_id.to_string(),
                    name: name.to_string(),
                })
        }
    }

    fn universe(
        identity: Arc<MockIdentity>,
        explicit: Option<Vec<String>>,
    ) -> (ScanUniverse, Arc<ScanStats>) {
        let stats = Arc::new(ScanStats::new());
        let universe = ScanUniverse::new(
            identity,
            "ocid1.tenancy.oc1..root",
            explicit,
            stats.clone(),
        );
        (universe, stats)
    }

    #[tokio::test]
    async fn keeps_only_ready_regions() {
        let identity = Arc::new(MockIdentity::healthy());
        let (universe, _) = universe(identity, None);

        let regions = universe.regions().await;
        assert_eq!(regions, ["us-ashburn-1", "eu-frankfurt-1"]);
    }

    #[tokio::test]
    async fn region_failure_falls_back_without_erroring() {
        let mut identity = MockIdentity::healthy();
        identity.regions = Err(());
        let (universe, _) = universe(Arc::new(identity), None);

        let regions = universe.regions().await;
        assert_eq!(regions, FALLBACK_REGIONS);
    }

    #[tokio::test]
    async fn resolution_is_memoized() {
        let identity = Arc::new(MockIdentity::healthy());
        let (universe, stats) = universe(identity.clone(), None);

        universe.regions().await;
        universe.compartments().await;
        let calls_after_first = identity.call_count();
        let api_calls_after_first = stats.api_calls_made();

        let regions_again = universe.regions().await.to_vec();
        let compartments_again = universe.compartments().await.clone();

        assert_eq!(identity.call_count(), calls_after_first);
        assert_eq!(stats.api_calls_made(), api_calls_after_first);
        assert_eq!(regions_again, universe.regions().await);
        assert_eq!(&compartments_again, universe.compartments().await);
    }

    #[tokio::test]
    async fn subtree_listing_keeps_active_and_adds_root() {
        let identity = Arc::new(MockIdentity::healthy());
        let (universe, _) = universe(identity, None);

        let compartments = universe.compartments().await;
        assert_eq!(compartments.len(), 3);
        assert_eq!(compartments["ocid1.compartment.oc1..dev"], "dev");
        assert_eq!(compartments["ocid1.compartment.oc1..prod"], "prod");
        assert_eq!(compartments["ocid1.tenancy.oc1..root"], "acme (Root)");
        assert!(!compartments.contains_key("ocid1.compartment.oc1..old"));
    }

    #[tokio::test]
    async fn root_name_lookup_failure_uses_generic_label() {
        let mut identity = MockIdentity::healthy();
        identity.tenancy_name = Err(());
        let (universe, _) = universe(Arc::new(identity), None);

        let compartments = universe.compartments().await;
        assert_eq!(compartments["ocid1.tenancy.oc1..root"], "Root Compartment");
    }

    #[tokio::test]
    async fn explicit_ids_resolve_individually_with_unknown_fallback() {
        let identity = Arc::new(MockIdentity::healthy());
        let explicit = vec![
            "ocid1.compartment.oc1..known".to_string(),
            "ocid1.compartment.oc1..missing".to_string(),
        ];
        let (universe, stats) = universe(identity, Some(explicit));

        let compartments = universe.compartments().await;
        assert_eq!(compartments["ocid1.compartment.oc1..known"], "known-name");
        assert_eq!(compartments["ocid1.compartment.oc1..missing"], "Unknown");
        assert_eq!(stats.api_calls_made(), 2);
    }

    #[tokio::test]
    async fn listing_failure_degrades_to_root_only() {
        let mut identity = MockIdentity::healthy();
        identity.compartments = Err(());
        let (universe, _) = universe(Arc::new(identity), None);

        let compartments = universe.compartments().await;
        assert_eq!(compartments.len(), 1);
        assert_eq!(compartments["ocid1.tenancy.oc1..root"], "Root Compartment");
    }
}
