use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::descriptor::{ResourceDescriptor, ResourceKind};

/// Errors surfaced by a cluster gateway.
///
/// The split drives retry behavior: transient errors are retried with
/// backoff, rejected operations fail immediately.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The platform could not serve the call right now (timeouts, write
    /// conflicts, server errors).
    #[error("transient cluster error: {0}")]
    Transient(String),
    /// The platform refused the operation (validation, permissions, quota).
    #[error("rejected by cluster: {0}")]
    Rejected(String),
}

impl GatewayError {
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Transient(_))
    }
}

/// Desired and available replica counts of a live workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct WorkloadStatus {
    pub desired_replicas: i32,
    pub available_replicas: i32,
}

/// A simplified view of an instance lifecycle phase.
///
/// This mirrors the string phases reported by the platform but only tracks
/// the states needed by status projection. Unknown values map to
/// [`InstancePhase::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub enum InstancePhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl From<&str> for InstancePhase {
    fn from(value: &str) -> Self {
        match value {
            "Pending" => InstancePhase::Pending,
            "Running" => InstancePhase::Running,
            "Succeeded" => InstancePhase::Succeeded,
            "Failed" => InstancePhase::Failed,
            _ => InstancePhase::Unknown,
        }
    }
}

/// Live view of one member instance of a workload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct InstanceStatus {
    pub name: String,
    pub phase: InstancePhase,
    /// Node hosting the instance, when scheduled.
    pub host: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub host_ip: Option<String>,
    pub instance_ip: Option<String>,
}

/// The sole boundary between the provisioning core and the orchestration
/// platform.
///
/// Implementations translate [`ResourceDescriptor`]s to and from platform
/// objects. Reads must drop server-assigned fields so that structural
/// comparison against a descriptor only ever sees desired state.
#[async_trait]
pub trait ClusterGateway: Send + Sync {
    /// Reads one resource by name. `Ok(None)` when it does not exist.
    async fn get(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ResourceDescriptor>, GatewayError>;

    /// Creates the resource described by `descriptor`.
    async fn create(&self, descriptor: &ResourceDescriptor) -> Result<(), GatewayError>;

    /// Replaces the live resource's desired state with `descriptor`.
    async fn update(&self, descriptor: &ResourceDescriptor) -> Result<(), GatewayError>;

    /// Deletes one resource by name. Returns `false` when it was already
    /// gone.
    async fn delete(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<bool, GatewayError>;

    /// Lists resources of `kind` whose labels contain every entry of
    /// `labels`.
    async fn list_by_label(
        &self,
        kind: ResourceKind,
        namespace: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<Vec<ResourceDescriptor>, GatewayError>;

    /// Replica counts of a live workload, `None` when it does not exist.
    async fn workload_status(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<WorkloadStatus>, GatewayError>;

    /// Live instances backing the workloads selected by `labels`.
    async fn list_instances(
        &self,
        namespace: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<Vec<InstanceStatus>, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_phases_parse_from_platform_strings() {
        assert_eq!(InstancePhase::from("Running"), InstancePhase::Running);
        assert_eq!(InstancePhase::from("Pending"), InstancePhase::Pending);
        assert_eq!(InstancePhase::from("Succeeded"), InstancePhase::Succeeded);
        assert_eq!(InstancePhase::from("Failed"), InstancePhase::Failed);
        assert_eq!(InstancePhase::from("Evicted"), InstancePhase::Unknown);
    }

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(GatewayError::Transient("timeout".to_string()).is_transient());
        assert!(!GatewayError::Rejected("forbidden".to_string()).is_transient());
    }
}
