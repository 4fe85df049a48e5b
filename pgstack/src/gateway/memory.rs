use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::descriptor::{APP_LABEL, ResourceDescriptor, ResourceKind, ResourceSpec};
use crate::gateway::base::{
    ClusterGateway, GatewayError, InstanceStatus, WorkloadStatus,
};

/// Gateway operation classes used for failure injection and the operation
/// log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayOp {
    Get,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone)]
struct PlannedFailure {
    kind: ResourceKind,
    op: GatewayOp,
    error: GatewayError,
    remaining: usize,
}

type ObjectKey = (ResourceKind, String, String);

#[derive(Default)]
struct Inner {
    objects: HashMap<ObjectKey, ResourceDescriptor>,
    workloads: HashMap<(String, String), WorkloadStatus>,
    instances: HashMap<(String, String), Vec<InstanceStatus>>,
    failures: Vec<PlannedFailure>,
    operations: Vec<(GatewayOp, ResourceKind, String)>,
    create_counts: HashMap<ObjectKey, usize>,
}

impl Inner {
    fn take_failure(&mut self, kind: ResourceKind, op: GatewayOp) -> Option<GatewayError> {
        let index = self
            .failures
            .iter()
            .position(|failure| failure.kind == kind && failure.op == op)?;
        let error = self.failures[index].error.clone();
        self.failures[index].remaining -= 1;
        if self.failures[index].remaining == 0 {
            self.failures.remove(index);
        }
        Some(error)
    }

    fn record(&mut self, op: GatewayOp, kind: ResourceKind, name: &str) {
        self.operations.push((op, kind, name.to_string()));
    }
}

/// [`ClusterGateway`] backed by process-local maps.
///
/// Used by the test suites and by embedders that want to exercise
/// provisioning without a cluster. Creating a workload registers a live
/// status with zero available replicas; tests drive availability and
/// instances through the setter methods. Cloning is shallow, all clones
/// share the same state.
#[derive(Clone, Default)]
pub struct InMemoryGateway {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arranges the next `times` calls of `op` on `kind` to fail with
    /// `error`.
    pub async fn inject_failure(
        &self,
        kind: ResourceKind,
        op: GatewayOp,
        error: GatewayError,
        times: usize,
    ) {
        if times == 0 {
            return;
        }
        self.inner.lock().await.failures.push(PlannedFailure {
            kind,
            op,
            error,
            remaining: times,
        });
    }

    /// Overwrites a live resource's spec, simulating an out-of-band edit.
    ///
    /// Returns `false` when the resource does not exist.
    pub async fn overwrite_spec(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
        spec: ResourceSpec,
    ) -> bool {
        let mut inner = self.inner.lock().await;
        match inner
            .objects
            .get_mut(&(kind, namespace.to_string(), name.to_string()))
        {
            Some(descriptor) => {
                descriptor.spec = spec;
                true
            }
            None => false,
        }
    }

    /// Number of successful create calls observed for one resource.
    pub async fn create_count(&self, kind: ResourceKind, namespace: &str, name: &str) -> usize {
        let inner = self.inner.lock().await;
        inner
            .create_counts
            .get(&(kind, namespace.to_string(), name.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Ordered log of successful operations.
    pub async fn operations(&self) -> Vec<(GatewayOp, ResourceKind, String)> {
        self.inner.lock().await.operations.clone()
    }

    pub async fn contains(&self, kind: ResourceKind, namespace: &str, name: &str) -> bool {
        let inner = self.inner.lock().await;
        inner
            .objects
            .contains_key(&(kind, namespace.to_string(), name.to_string()))
    }

    pub async fn object_count(&self) -> usize {
        self.inner.lock().await.objects.len()
    }

    /// Seeds the live instance list returned for `app_name`.
    pub async fn set_instances(
        &self,
        namespace: &str,
        app_name: &str,
        instances: Vec<InstanceStatus>,
    ) {
        self.inner
            .lock()
            .await
            .instances
            .insert((namespace.to_string(), app_name.to_string()), instances);
    }

    /// Overrides the availability reported for a workload. Returns `false`
    /// when no such workload exists.
    pub async fn set_available_replicas(
        &self,
        namespace: &str,
        name: &str,
        available_replicas: i32,
    ) -> bool {
        let mut inner = self.inner.lock().await;
        match inner
            .workloads
            .get_mut(&(namespace.to_string(), name.to_string()))
        {
            Some(status) => {
                status.available_replicas = available_replicas;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl ClusterGateway for InMemoryGateway {
    async fn get(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ResourceDescriptor>, GatewayError> {
        let mut inner = self.inner.lock().await;
        if let Some(error) = inner.take_failure(kind, GatewayOp::Get) {
            return Err(error);
        }
        inner.record(GatewayOp::Get, kind, name);
        Ok(inner
            .objects
            .get(&(kind, namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn create(&self, descriptor: &ResourceDescriptor) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().await;
        if let Some(error) = inner.take_failure(descriptor.kind, GatewayOp::Create) {
            return Err(error);
        }

        let key = (
            descriptor.kind,
            descriptor.namespace.clone(),
            descriptor.name.clone(),
        );
        if inner.objects.contains_key(&key) {
            return Err(GatewayError::Rejected(format!(
                "{} already exists",
                descriptor.resource_ref()
            )));
        }

        inner.record(GatewayOp::Create, descriptor.kind, &descriptor.name);
        *inner.create_counts.entry(key.clone()).or_insert(0) += 1;
        if let ResourceSpec::Workload(spec) = &descriptor.spec {
            inner.workloads.insert(
                (descriptor.namespace.clone(), descriptor.name.clone()),
                WorkloadStatus {
                    desired_replicas: spec.replicas,
                    available_replicas: 0,
                },
            );
        }
        inner.objects.insert(key, descriptor.clone());
        Ok(())
    }

    async fn update(&self, descriptor: &ResourceDescriptor) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().await;
        if let Some(error) = inner.take_failure(descriptor.kind, GatewayOp::Update) {
            return Err(error);
        }

        let key = (
            descriptor.kind,
            descriptor.namespace.clone(),
            descriptor.name.clone(),
        );
        if !inner.objects.contains_key(&key) {
            return Err(GatewayError::Rejected(format!(
                "{} does not exist",
                descriptor.resource_ref()
            )));
        }

        inner.record(GatewayOp::Update, descriptor.kind, &descriptor.name);
        if let ResourceSpec::Workload(spec) = &descriptor.spec {
            if let Some(status) = inner
                .workloads
                .get_mut(&(descriptor.namespace.clone(), descriptor.name.clone()))
            {
                status.desired_replicas = spec.replicas;
            }
        }
        inner.objects.insert(key, descriptor.clone());
        Ok(())
    }

    async fn delete(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<bool, GatewayError> {
        let mut inner = self.inner.lock().await;
        if let Some(error) = inner.take_failure(kind, GatewayOp::Delete) {
            return Err(error);
        }

        inner.record(GatewayOp::Delete, kind, name);
        let removed = inner
            .objects
            .remove(&(kind, namespace.to_string(), name.to_string()));
        if kind == ResourceKind::Workload {
            inner
                .workloads
                .remove(&(namespace.to_string(), name.to_string()));
            if let Some(app_name) = removed
                .as_ref()
                .and_then(|descriptor| descriptor.labels.get(APP_LABEL))
            {
                inner
                    .instances
                    .remove(&(namespace.to_string(), app_name.clone()));
            }
        }
        Ok(removed.is_some())
    }

    async fn list_by_label(
        &self,
        kind: ResourceKind,
        namespace: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<Vec<ResourceDescriptor>, GatewayError> {
        let inner = self.inner.lock().await;
        let mut matches: Vec<ResourceDescriptor> = inner
            .objects
            .values()
            .filter(|descriptor| {
                descriptor.kind == kind
                    && descriptor.namespace == namespace
                    && labels
                        .iter()
                        .all(|(key, value)| descriptor.labels.get(key) == Some(value))
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matches)
    }

    async fn workload_status(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<WorkloadStatus>, GatewayError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .workloads
            .get(&(namespace.to_string(), name.to_string()))
            .copied())
    }

    async fn list_instances(
        &self,
        namespace: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<Vec<InstanceStatus>, GatewayError> {
        let inner = self.inner.lock().await;
        let Some(app_name) = labels.get(APP_LABEL) else {
            return Ok(Vec::new());
        };
        Ok(inner
            .instances
            .get(&(namespace.to_string(), app_name.clone()))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ConfigMapSpec, standard_labels};

    fn config_map(name: &str) -> ResourceDescriptor {
        ResourceDescriptor {
            kind: ResourceKind::ConfigMap,
            name: name.to_string(),
            namespace: "default".to_string(),
            labels: standard_labels("orders"),
            spec: ResourceSpec::ConfigMap(ConfigMapSpec {
                data: BTreeMap::from([("key".to_string(), "value".to_string())]),
            }),
            depends_on: Vec::new(),
        }
    }

    #[tokio::test]
    async fn create_get_delete_round_trip() {
        let gateway = InMemoryGateway::new();
        let descriptor = config_map("orders-config");

        gateway.create(&descriptor).await.unwrap();
        let read = gateway
            .get(ResourceKind::ConfigMap, "default", "orders-config")
            .await
            .unwrap();
        assert_eq!(read, Some(descriptor));

        assert!(gateway
            .delete(ResourceKind::ConfigMap, "default", "orders-config")
            .await
            .unwrap());
        assert!(!gateway
            .delete(ResourceKind::ConfigMap, "default", "orders-config")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn create_rejects_duplicates() {
        let gateway = InMemoryGateway::new();
        let descriptor = config_map("orders-config");

        gateway.create(&descriptor).await.unwrap();
        let error = gateway.create(&descriptor).await.unwrap_err();
        assert!(matches!(error, GatewayError::Rejected(_)));
    }

    #[tokio::test]
    async fn injected_failures_are_consumed_in_order() {
        let gateway = InMemoryGateway::new();
        gateway
            .inject_failure(
                ResourceKind::ConfigMap,
                GatewayOp::Create,
                GatewayError::Transient("connection reset".to_string()),
                2,
            )
            .await;

        let descriptor = config_map("orders-config");
        assert!(gateway.create(&descriptor).await.is_err());
        assert!(gateway.create(&descriptor).await.is_err());
        gateway.create(&descriptor).await.unwrap();
        assert_eq!(
            gateway
                .create_count(ResourceKind::ConfigMap, "default", "orders-config")
                .await,
            1
        );
    }

    #[tokio::test]
    async fn list_by_label_filters_on_every_entry() {
        let gateway = InMemoryGateway::new();
        gateway.create(&config_map("orders-config")).await.unwrap();

        let mut other = config_map("billing-config");
        other.labels = standard_labels("billing");
        gateway.create(&other).await.unwrap();

        let matches = gateway
            .list_by_label(
                ResourceKind::ConfigMap,
                "default",
                &standard_labels("orders"),
            )
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "orders-config");
    }
}
