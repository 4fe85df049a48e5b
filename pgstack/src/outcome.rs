use std::fmt;

use serde::{Deserialize, Serialize};

use crate::descriptor::{ResourceKind, ResourceRef};

/// Result of applying a single resource descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub enum ApplyStatus {
    /// The resource did not exist and was created.
    Created,
    /// The live resource already matched the desired state.
    Unchanged,
    /// The live resource diverged and was converged in place.
    Updated,
    Failed { reason: FailureReason },
}

impl ApplyStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, ApplyStatus::Failed { .. })
    }
}

/// Why a resource could not be converged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub enum FailureReason {
    /// An immutable resource diverged from its desired state.
    ImmutableDrift,
    /// A prerequisite of this resource failed earlier in the run.
    DependencyFailed { dependency: String },
    /// The platform kept failing transiently after every retry.
    Transient { message: String },
    /// The platform refused the operation outright.
    Rejected { message: String },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::ImmutableDrift => f.write_str("immutable resource drift"),
            FailureReason::DependencyFailed { .. } => f.write_str("dependency failed"),
            FailureReason::Transient { message } => {
                write!(f, "transient platform error: {message}")
            }
            FailureReason::Rejected { message } => write!(f, "rejected by platform: {message}"),
        }
    }
}

/// Per-resource entry of a reconciliation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct DescriptorOutcome {
    pub kind: ResourceKind,
    pub name: String,
    #[serde(flatten)]
    pub status: ApplyStatus,
}

/// Overall disposition of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub enum OutcomeSummary {
    /// Every resource converged.
    Success,
    /// At least one resource failed; independent resources were still
    /// attempted.
    PartialFailure { failed: Vec<ResourceRef> },
    /// The run was cancelled between resources; the remainder was never
    /// attempted.
    Aborted { reason: String },
}

/// What a reconciliation run did to every resource of a plan, in apply
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct ReconciliationOutcome {
    pub summary: OutcomeSummary,
    pub results: Vec<DescriptorOutcome>,
}

impl ReconciliationOutcome {
    /// Builds the outcome from per-resource results, deriving the summary.
    pub fn from_results(results: Vec<DescriptorOutcome>) -> Self {
        let failed: Vec<ResourceRef> = results
            .iter()
            .filter(|result| result.status.is_failure())
            .map(|result| ResourceRef::new(result.kind, result.name.clone()))
            .collect();
        let summary = if failed.is_empty() {
            OutcomeSummary::Success
        } else {
            OutcomeSummary::PartialFailure { failed }
        };
        Self { summary, results }
    }

    /// Builds an aborted outcome carrying whatever was applied before
    /// cancellation.
    pub fn aborted(results: Vec<DescriptorOutcome>, reason: impl Into<String>) -> Self {
        Self {
            summary: OutcomeSummary::Aborted {
                reason: reason.into(),
            },
            results,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.summary, OutcomeSummary::Success)
    }

    /// Whether any failure stems from immutable drift.
    pub fn has_immutable_drift(&self) -> bool {
        self.results.iter().any(|result| {
            matches!(
                result.status,
                ApplyStatus::Failed {
                    reason: FailureReason::ImmutableDrift
                }
            )
        })
    }

    pub fn status_of(&self, kind: ResourceKind, name: &str) -> Option<&ApplyStatus> {
        self.results
            .iter()
            .find(|result| result.kind == kind && result.name == name)
            .map(|result| &result.status)
    }
}

/// Result of deleting a single resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub enum TeardownStatus {
    Deleted,
    /// The resource was already gone.
    Absent,
    Failed { reason: FailureReason },
}

impl TeardownStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, TeardownStatus::Failed { .. })
    }
}

/// Per-resource entry of a teardown outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct TeardownResult {
    pub kind: ResourceKind,
    pub name: String,
    #[serde(flatten)]
    pub status: TeardownStatus,
}

/// What a teardown run did, in deletion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct TeardownOutcome {
    pub summary: OutcomeSummary,
    pub results: Vec<TeardownResult>,
}

impl TeardownOutcome {
    pub fn from_results(results: Vec<TeardownResult>) -> Self {
        let failed: Vec<ResourceRef> = results
            .iter()
            .filter(|result| result.status.is_failure())
            .map(|result| ResourceRef::new(result.kind, result.name.clone()))
            .collect();
        let summary = if failed.is_empty() {
            OutcomeSummary::Success
        } else {
            OutcomeSummary::PartialFailure { failed }
        };
        Self { summary, results }
    }

    pub fn aborted(results: Vec<TeardownResult>, reason: impl Into<String>) -> Self {
        Self {
            summary: OutcomeSummary::Aborted {
                reason: reason.into(),
            },
            results,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.summary, OutcomeSummary::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created(kind: ResourceKind, name: &str) -> DescriptorOutcome {
        DescriptorOutcome {
            kind,
            name: name.to_string(),
            status: ApplyStatus::Created,
        }
    }

    #[test]
    fn all_successes_summarize_as_success() {
        let outcome = ReconciliationOutcome::from_results(vec![
            created(ResourceKind::Secret, "app-secret"),
            created(ResourceKind::ConfigMap, "app-config"),
        ]);
        assert!(outcome.is_success());
        assert!(!outcome.has_immutable_drift());
    }

    #[test]
    fn any_failure_summarizes_as_partial_failure() {
        let outcome = ReconciliationOutcome::from_results(vec![
            created(ResourceKind::Secret, "app-secret"),
            DescriptorOutcome {
                kind: ResourceKind::ConfigMap,
                name: "app-config".to_string(),
                status: ApplyStatus::Failed {
                    reason: FailureReason::Rejected {
                        message: "quota exceeded".to_string(),
                    },
                },
            },
        ]);

        assert!(!outcome.is_success());
        match &outcome.summary {
            OutcomeSummary::PartialFailure { failed } => {
                assert_eq!(
                    failed,
                    &vec![ResourceRef::new(ResourceKind::ConfigMap, "app-config")]
                );
            }
            other => panic!("expected partial failure, got {other:?}"),
        }
    }

    #[test]
    fn drift_failures_are_detected() {
        let outcome = ReconciliationOutcome::from_results(vec![DescriptorOutcome {
            kind: ResourceKind::Secret,
            name: "app-secret".to_string(),
            status: ApplyStatus::Failed {
                reason: FailureReason::ImmutableDrift,
            },
        }]);
        assert!(outcome.has_immutable_drift());
    }

    #[test]
    fn failure_reasons_render_stable_messages() {
        assert_eq!(
            FailureReason::ImmutableDrift.to_string(),
            "immutable resource drift"
        );
        assert_eq!(
            FailureReason::DependencyFailed {
                dependency: "Secret/app-secret".to_string()
            }
            .to_string(),
            "dependency failed"
        );
    }

    #[test]
    fn outcome_entries_serialize_with_a_flat_status() {
        let entry = DescriptorOutcome {
            kind: ResourceKind::Workload,
            name: "orders".to_string(),
            status: ApplyStatus::Failed {
                reason: FailureReason::DependencyFailed {
                    dependency: "Secret/orders-secret".to_string(),
                },
            },
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["kind"], "workload");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"]["kind"], "dependency_failed");
    }

    #[test]
    fn aborted_outcomes_keep_partial_results() {
        let outcome = ReconciliationOutcome::aborted(
            vec![created(ResourceKind::Secret, "app-secret")],
            "provisioning cancelled",
        );
        assert!(!outcome.is_success());
        assert_eq!(outcome.results.len(), 1);
        assert!(matches!(outcome.summary, OutcomeSummary::Aborted { .. }));
    }
}
