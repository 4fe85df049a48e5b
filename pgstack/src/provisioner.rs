use std::sync::Arc;

use pgstack_config::shared::RetryConfig;
use tracing::info;

use crate::gateway::ClusterGateway;
use crate::locks::AppLocks;
use crate::outcome::{ReconciliationOutcome, TeardownOutcome};
use crate::plan::{
    DEFAULT_NAMESPACE, DEFAULT_WORKLOAD_IMAGE, PlanBuilder, PlanError, PlanSettings, removal_refs,
};
use crate::reconcile::Reconciler;
use crate::request::{ProvisioningRequest, ValidationError};
use crate::shutdown::ShutdownRx;
use crate::status::{AppStatus, StatusError, StatusProjector};

/// Settings for a [`Provisioner`].
#[derive(Debug, Clone)]
pub struct ProvisionerSettings {
    pub namespace: String,
    pub workload_image: String,
    pub retry: RetryConfig,
}

impl Default for ProvisionerSettings {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            workload_image: DEFAULT_WORKLOAD_IMAGE.to_string(),
            retry: RetryConfig::default(),
        }
    }
}

/// Front door of the provisioning core.
///
/// Owns the plan builder, the reconciler, and the status projector, and
/// serializes provisioning and teardown per application name. Status reads
/// bypass the locks since they never write.
pub struct Provisioner {
    namespace: String,
    builder: PlanBuilder,
    reconciler: Reconciler,
    projector: StatusProjector,
    locks: AppLocks,
}

impl Provisioner {
    pub fn new(gateway: Arc<dyn ClusterGateway>, settings: ProvisionerSettings) -> Self {
        let builder = PlanBuilder::new(
            gateway.clone(),
            PlanSettings {
                namespace: settings.namespace.clone(),
                workload_image: settings.workload_image,
            },
        );
        let reconciler = Reconciler::new(gateway.clone(), settings.retry);
        let projector = StatusProjector::new(gateway, settings.namespace.clone());
        Self {
            namespace: settings.namespace,
            builder,
            reconciler,
            projector,
            locks: AppLocks::new(),
        }
    }

    /// Provisions or converges one application stack.
    ///
    /// Repeating a request whose resources already exist reports every
    /// resource unchanged and never rotates credentials.
    pub async fn provision(
        &self,
        request: &ProvisioningRequest,
        shutdown: ShutdownRx,
    ) -> Result<ReconciliationOutcome, PlanError> {
        let _guard = self.locks.acquire(&request.app_name).await;

        info!(app_name = %request.app_name, "building provisioning plan");
        let plan = self.builder.build(request).await?;
        let outcome = self.reconciler.apply(&plan, shutdown).await;
        info!(
            app_name = %request.app_name,
            success = outcome.is_success(),
            "reconciliation finished"
        );
        Ok(outcome)
    }

    /// Deletes every resource of an application stack, dependents first.
    pub async fn teardown(
        &self,
        app_name: &str,
        shutdown: ShutdownRx,
    ) -> Result<TeardownOutcome, ValidationError> {
        let _guard = self.locks.acquire(app_name).await;

        let refs = removal_refs(app_name)?;
        info!(app_name, "tearing down application stack");
        let outcome = self.reconciler.teardown(&self.namespace, &refs, shutdown).await;
        info!(app_name, success = outcome.is_success(), "teardown finished");
        Ok(outcome)
    }

    /// Live status of one application.
    pub async fn status(&self, app_name: &str) -> Result<AppStatus, StatusError> {
        self.projector.project(app_name).await
    }

    /// Live status of every managed application.
    pub async fn status_all(&self) -> Result<Vec<AppStatus>, StatusError> {
        self.projector.project_all().await
    }
}
