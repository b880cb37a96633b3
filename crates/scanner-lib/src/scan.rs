//! Bounded-concurrency fan-out over the region x compartment matrix
//!
//! Each cell is an independent task gated by a semaphore permit. A cell
//! retries transient failures with exponential backoff and degrades to an
//! empty result on anything else; only a shutdown signal stops the scan as
//! a whole.

use crate::capability::{ApiError, ComputeApi};
use crate::models::{RawInstance, ScanStats, ScanTarget};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Lifecycle state the scanner filters on.
pub const STOPPED_LIFECYCLE_STATE: &str = "STOPPED";

/// Default number of concurrent scan tasks.
pub const DEFAULT_MAX_WORKERS: usize = 20;

/// Retry behavior for one scan cell.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles after each one.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(5),
        }
    }
}

/// Pure retry decision: another attempt must remain and the error must be
/// transient.
pub fn should_retry(error: &ApiError, attempt: u32, max_attempts: u32) -> bool {
    attempt < max_attempts && error.is_transient()
}

/// Cross-product of regions and compartment ids, one target per cell.
pub fn build_targets<'a, I>(regions: &[String], compartment_ids: I) -> Vec<ScanTarget>
where
    I: IntoIterator<Item = &'a String>,
{
    let ids: Vec<&String> = compartment_ids.into_iter().collect();
    let mut targets = Vec::with_capacity(regions.len() * ids.len());
    for region in regions {
        for id in &ids {
            targets.push(ScanTarget::new(region.clone(), (*id).clone()));
        }
    }
    targets
}

/// Result of a scan pass.
#[derive(Debug)]
pub struct ScanOutcome {
    /// Union of all per-cell results, each tagged with its source region.
    pub instances: Vec<RawInstance>,
    /// Whether the shutdown signal interrupted submission.
    pub interrupted: bool,
}

/// Executes the scan matrix under a bounded worker pool.
pub struct ScanExecutor {
    compute: Arc<dyn ComputeApi>,
    stats: Arc<ScanStats>,
    retry: RetryPolicy,
    max_workers: usize,
    call_timeout: Duration,
}

impl ScanExecutor {
    pub fn new(compute: Arc<dyn ComputeApi>, stats: Arc<ScanStats>) -> Self {
        Self {
            compute,
            stats,
            retry: RetryPolicy::default(),
            max_workers: DEFAULT_MAX_WORKERS,
            call_timeout: Duration::from_secs(300),
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Scan every target cell. A cell failure never aborts the pass; the
    /// shutdown receiver stops submission of new cells and lets in-flight
    /// cells drain into the aggregate.
    pub async fn scan(
        &self,
        targets: Vec<ScanTarget>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> ScanOutcome {
        let total = targets.len();
        info!(cells = total, workers = self.max_workers, "starting scan pass");

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut tasks = JoinSet::new();
        let mut interrupted = false;

        for target in targets {
            let permit = tokio::select! {
                biased;
                () = wait_for_shutdown(&mut shutdown) => {
                    warn!("shutdown signal received, no further cells will be submitted");
                    interrupted = true;
                    break;
                }
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let compute = Arc::clone(&self.compute);
            let stats = Arc::clone(&self.stats);
            let retry = self.retry;
            let call_timeout = self.call_timeout;
            tasks.spawn(async move {
                let _permit = permit;
                scan_cell(compute.as_ref(), &target, retry, call_timeout, &stats).await
            });
        }

        let mut instances = Vec::new();
        let mut completed = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(cell_instances) => instances.extend(cell_instances),
                Err(e) => warn!(error = %e, "scan task failed to complete"),
            }
            completed += 1;
            if completed % 10 == 0 {
                debug!(completed, total, "scan progress");
            }
        }

        self.stats.set_instances_found(instances.len());
        info!(
            instances = instances.len(),
            completed, interrupted, "scan pass complete"
        );

        ScanOutcome {
            instances,
            interrupted,
        }
    }
}

/// Resolve when a shutdown signal arrives. A closed channel means no sender
/// exists anymore, so no signal can come: pend forever instead of resolving.
async fn wait_for_shutdown(shutdown: &mut broadcast::Receiver<()>) {
    loop {
        match shutdown.recv().await {
            Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => return,
            Err(broadcast::error::RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}

/// Scan one (region, compartment) cell with retry and backoff. Every
/// attempt, successful or not, counts as an API call.
async fn scan_cell(
    compute: &dyn ComputeApi,
    target: &ScanTarget,
    retry: RetryPolicy,
    call_timeout: Duration,
    stats: &ScanStats,
) -> Vec<RawInstance> {
    let mut attempt = 1u32;
    let mut delay = retry.initial_delay;

    loop {
        stats.record_api_call();

        let result = match tokio::time::timeout(
            call_timeout,
            compute.list_instances(
                &target.region,
                &target.compartment_id,
                STOPPED_LIFECYCLE_STATE,
            ),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout(format!(
                "no response within {}s",
                call_timeout.as_secs()
            ))),
        };

        match result {
            Ok(mut instances) => {
                for instance in &mut instances {
                    instance.region = target.region.clone();
                }
                if !instances.is_empty() {
                    info!(
                        region = %target.region,
                        compartment = %target.compartment_id,
                        count = instances.len(),
                        "found stopped instances"
                    );
                }
                return instances;
            }
            Err(error) if should_retry(&error, attempt, retry.max_attempts) => {
                warn!(
                    region = %target.region,
                    compartment = %target.compartment_id,
                    attempt,
                    max_attempts = retry.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(error) => {
                warn!(
                    region = %target.region,
                    compartment = %target.compartment_id,
                    attempt,
                    error = %error,
                    "scan cell failed, yielding empty result"
                );
                return Vec::new();
            }
        }
    }
}
