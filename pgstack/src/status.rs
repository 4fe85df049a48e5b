use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::descriptor::{APP_LABEL, MANAGED_BY_LABEL, MANAGED_BY_VALUE, ResourceKind};
use crate::gateway::{ClusterGateway, GatewayError, InstanceStatus};
use crate::plan::workload_name;

/// Errors raised while projecting live status.
#[derive(Debug, Error)]
pub enum StatusError {
    /// No workload exists for the requested application.
    #[error("no application named `{0}` is provisioned")]
    NotFound(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Read-only summary of one application's live state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct AppStatus {
    pub app_name: String,
    pub desired_replicas: i32,
    pub available_replicas: i32,
    /// Live instances backing the workload. Empty while nothing has been
    /// scheduled yet.
    pub instances: Vec<InstanceStatus>,
}

/// Projects live cluster state into [`AppStatus`] summaries.
///
/// Projection is purely read-only and reflects whatever the cluster reports
/// at the moment of the call; it never consults reconciliation history.
pub struct StatusProjector {
    gateway: Arc<dyn ClusterGateway>,
    namespace: String,
}

impl StatusProjector {
    pub fn new(gateway: Arc<dyn ClusterGateway>, namespace: impl Into<String>) -> Self {
        Self {
            gateway,
            namespace: namespace.into(),
        }
    }

    /// Summarizes the live state of one application.
    ///
    /// A workload with zero live instances is a valid summary; a missing
    /// workload is [`StatusError::NotFound`].
    pub async fn project(&self, app_name: &str) -> Result<AppStatus, StatusError> {
        let workload = self
            .gateway
            .workload_status(&self.namespace, &workload_name(app_name))
            .await?
            .ok_or_else(|| StatusError::NotFound(app_name.to_string()))?;

        let labels = BTreeMap::from([(APP_LABEL.to_string(), app_name.to_string())]);
        let instances = self.gateway.list_instances(&self.namespace, &labels).await?;

        Ok(AppStatus {
            app_name: app_name.to_string(),
            desired_replicas: workload.desired_replicas,
            available_replicas: workload.available_replicas,
            instances,
        })
    }

    /// Summarizes every application this provisioner manages, discovered
    /// through the managed-by label on workloads.
    pub async fn project_all(&self) -> Result<Vec<AppStatus>, StatusError> {
        let managed = BTreeMap::from([(
            MANAGED_BY_LABEL.to_string(),
            MANAGED_BY_VALUE.to_string(),
        )]);
        let workloads = self
            .gateway
            .list_by_label(ResourceKind::Workload, &self.namespace, &managed)
            .await?;

        let mut statuses = Vec::with_capacity(workloads.len());
        for workload in workloads {
            match self.project(&workload.name).await {
                Ok(status) => statuses.push(status),
                // Deleted between the list and the read; not an error.
                Err(StatusError::NotFound(app_name)) => {
                    debug!(app_name, "workload disappeared while projecting status");
                }
                Err(error) => return Err(error),
            }
        }
        Ok(statuses)
    }
}
