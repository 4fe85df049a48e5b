use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use pgstack_config::shared::RetryConfig;
use tracing::{debug, warn};

use crate::descriptor::{ResourceDescriptor, ResourceRef, UpdatePolicy};
use crate::gateway::{ClusterGateway, GatewayError};
use crate::outcome::{
    ApplyStatus, DescriptorOutcome, FailureReason, ReconciliationOutcome, TeardownOutcome,
    TeardownResult, TeardownStatus,
};
use crate::plan::Plan;
use crate::shutdown::{ShutdownRx, is_cancelled};

const APPLY_CANCELLED: &str = "provisioning cancelled";
const TEARDOWN_CANCELLED: &str = "teardown cancelled";

/// Converges plans against the live cluster, one resource at a time.
///
/// Failures never roll back earlier resources and never stop the run;
/// resources whose prerequisites failed are skipped while independent
/// branches continue. Transient platform errors are retried with capped
/// exponential backoff before a resource is given up on.
pub struct Reconciler {
    gateway: Arc<dyn ClusterGateway>,
    retry: RetryConfig,
}

impl Reconciler {
    pub fn new(gateway: Arc<dyn ClusterGateway>, retry: RetryConfig) -> Self {
        Self { gateway, retry }
    }

    /// Applies every descriptor of `plan` in order.
    ///
    /// Cancellation is honored between descriptors, never mid-resource: a
    /// signal arriving while a resource is in flight lets that resource
    /// finish and aborts before the next one.
    pub async fn apply(&self, plan: &Plan, shutdown: ShutdownRx) -> ReconciliationOutcome {
        let started = Instant::now();
        counter!("reconcile_attempts").increment(1);

        let mut results: Vec<DescriptorOutcome> = Vec::with_capacity(plan.len());
        let mut failed: HashSet<ResourceRef> = HashSet::new();
        let mut cancelled = false;

        for descriptor in plan.descriptors() {
            if is_cancelled(&shutdown) {
                cancelled = true;
                break;
            }

            let target = descriptor.resource_ref();
            let status = match descriptor
                .depends_on
                .iter()
                .find(|dependency| failed.contains(dependency))
            {
                Some(dependency) => {
                    debug!(resource = %target, dependency = %dependency, "skipping resource, prerequisite failed");
                    ApplyStatus::Failed {
                        reason: FailureReason::DependencyFailed {
                            dependency: dependency.to_string(),
                        },
                    }
                }
                None => self.apply_one(descriptor).await,
            };

            if let ApplyStatus::Failed { reason } = &status {
                warn!(resource = %target, %reason, "resource failed to converge");
                failed.insert(target);
            } else {
                debug!(resource = %target, ?status, "resource converged");
            }
            results.push(DescriptorOutcome {
                kind: descriptor.kind,
                name: descriptor.name.clone(),
                status,
            });
        }

        let outcome = if cancelled {
            ReconciliationOutcome::aborted(results, APPLY_CANCELLED)
        } else {
            ReconciliationOutcome::from_results(results)
        };

        if outcome.is_success() {
            counter!("reconcile_ok").increment(1);
        } else {
            counter!("reconcile_err").increment(1);
        }
        histogram!("reconcile_latency_ms").record(started.elapsed().as_secs_f64() * 1000.0);

        outcome
    }

    /// Deletes the referenced resources back to front, so dependents go
    /// before their prerequisites. Absent resources count as clean.
    pub async fn teardown(
        &self,
        namespace: &str,
        refs: &[ResourceRef],
        shutdown: ShutdownRx,
    ) -> TeardownOutcome {
        counter!("teardown_attempts").increment(1);

        let mut results = Vec::with_capacity(refs.len());
        let mut cancelled = false;

        for target in refs.iter().rev() {
            if is_cancelled(&shutdown) {
                cancelled = true;
                break;
            }

            let status = match self
                .with_retry("delete", || {
                    self.gateway.delete(target.kind, namespace, &target.name)
                })
                .await
            {
                Ok(true) => TeardownStatus::Deleted,
                Ok(false) => TeardownStatus::Absent,
                Err(error) => {
                    warn!(resource = %target, %error, "failed to delete resource");
                    TeardownStatus::Failed {
                        reason: failure_reason(error),
                    }
                }
            };
            results.push(TeardownResult {
                kind: target.kind,
                name: target.name.clone(),
                status,
            });
        }

        let outcome = if cancelled {
            TeardownOutcome::aborted(results, TEARDOWN_CANCELLED)
        } else {
            TeardownOutcome::from_results(results)
        };
        if !outcome.is_success() {
            counter!("teardown_err").increment(1);
        }
        outcome
    }

    /// Converges a single resource.
    ///
    /// The decision tree is read first: absent resources are created,
    /// matching resources are left alone, and diverged resources are either
    /// updated in place or reported as drift depending on the kind's update
    /// policy.
    async fn apply_one(&self, descriptor: &ResourceDescriptor) -> ApplyStatus {
        let kind = descriptor.kind;
        let existing = match self
            .with_retry("get", || {
                self.gateway
                    .get(kind, &descriptor.namespace, &descriptor.name)
            })
            .await
        {
            Ok(existing) => existing,
            Err(error) => return failure_status(error),
        };

        match existing {
            None => match self
                .with_retry("create", || self.gateway.create(descriptor))
                .await
            {
                Ok(()) => ApplyStatus::Created,
                Err(error) => failure_status(error),
            },
            Some(live) if live.spec == descriptor.spec => ApplyStatus::Unchanged,
            Some(_) => match kind.update_policy() {
                UpdatePolicy::Immutable => ApplyStatus::Failed {
                    reason: FailureReason::ImmutableDrift,
                },
                UpdatePolicy::InPlace => match self
                    .with_retry("update", || self.gateway.update(descriptor))
                    .await
                {
                    Ok(()) => ApplyStatus::Updated,
                    Err(error) => failure_status(error),
                },
            },
        }
    }

    /// Runs `call` until it succeeds, fails terminally, or the attempt
    /// budget is spent. Only transient errors are retried.
    async fn with_retry<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, GatewayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let mut delay = Duration::from_millis(self.retry.initial_delay_ms);
        let max_delay = Duration::from_millis(self.retry.max_delay_ms);
        let mut attempt = 1u32;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() && attempt < self.retry.max_attempts => {
                    debug!(operation, %error, attempt, "transient cluster error, retrying");
                    tokio::time::sleep(delay).await;
                    delay = delay.mul_f32(self.retry.backoff_factor).min(max_delay);
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

fn failure_status(error: GatewayError) -> ApplyStatus {
    ApplyStatus::Failed {
        reason: failure_reason(error),
    }
}

fn failure_reason(error: GatewayError) -> FailureReason {
    match error {
        GatewayError::Transient(message) => FailureReason::Transient { message },
        GatewayError::Rejected(message) => FailureReason::Rejected { message },
    }
}
