use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use secrecy::SecretString;
use thiserror::Error;
use tracing::debug;

use crate::credentials::{generate_credentials, is_credential_set};
use crate::descriptor::{
    APP_LABEL, ClaimSpec, ConfigMapSpec, EndpointSpec, ResourceDescriptor, ResourceKind,
    ResourceRef, ResourceSpec, SecretSpec, VolumeSpec, WorkloadSpec, standard_labels,
};
use crate::gateway::{ClusterGateway, GatewayError};
use crate::request::{ProvisioningRequest, ValidationError, validate_app_name};

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "default";
/// Image used for database workloads when none is configured.
pub const DEFAULT_WORKLOAD_IMAGE: &str = "postgres:16.3";

const POSTGRES_PORT: i32 = 5432;
const WORKLOAD_REPLICAS: i32 = 1;
const ACCESS_MODE: &str = "ReadWriteOnce";
const RECLAIM_POLICY: &str = "Retain";
/// Node directory under which every application gets its own backing path.
const HOST_PATH_PREFIX: &str = "/mnt/data";

const CONFIG_FILE_NAME: &str = "postgresql.conf";
const POSTGRESQL_CONF: &str = "\
# PostgreSQL configuration file

# General settings
listen_addresses = '*'
max_connections = 100

# Memory and performance tuning
shared_buffers = 128MB
effective_cache_size = 4GB
work_mem = 4MB

# Logging
logging_collector = on
log_directory = '/var/log/postgresql'
log_filename = 'postgresql-%Y-%m-%d_%H%M%S.log'
log_statement = 'all'
";

pub fn secret_name(app_name: &str) -> String {
    format!("{app_name}-secret")
}

pub fn config_name(app_name: &str) -> String {
    format!("{app_name}-config")
}

pub fn volume_name(app_name: &str) -> String {
    format!("{app_name}-pv")
}

pub fn claim_name(app_name: &str) -> String {
    format!("{app_name}-pvc")
}

pub fn workload_name(app_name: &str) -> String {
    app_name.to_string()
}

pub fn endpoint_name(app_name: &str) -> String {
    format!("{app_name}-service")
}

/// Errors raised while deriving a plan.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The live Secret could not be read; nothing was applied.
    #[error("failed to inspect existing resources: {0}")]
    Gateway(#[from] GatewayError),
}

/// An ordered set of resource descriptors ready to be applied.
///
/// Construction guarantees that every descriptor appears after all of its
/// dependencies.
#[derive(Debug, Clone)]
pub struct Plan {
    descriptors: Vec<ResourceDescriptor>,
}

impl Plan {
    /// Orders `descriptors` topologically, keeping the given order among
    /// independent descriptors.
    pub fn from_descriptors(
        descriptors: Vec<ResourceDescriptor>,
    ) -> Result<Self, ValidationError> {
        let position: HashMap<ResourceRef, usize> = descriptors
            .iter()
            .enumerate()
            .map(|(index, descriptor)| (descriptor.resource_ref(), index))
            .collect();

        let mut in_degree = vec![0usize; descriptors.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); descriptors.len()];
        for (index, descriptor) in descriptors.iter().enumerate() {
            for dependency in &descriptor.depends_on {
                let Some(&dependency_index) = position.get(dependency) else {
                    return Err(ValidationError::UnknownDependency(dependency.to_string()));
                };
                in_degree[index] += 1;
                dependents[dependency_index].push(index);
            }
        }

        let mut ready: VecDeque<usize> = (0..descriptors.len())
            .filter(|&index| in_degree[index] == 0)
            .collect();
        let mut order = Vec::with_capacity(descriptors.len());
        while let Some(index) = ready.pop_front() {
            order.push(index);
            for &dependent in &dependents[index] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.push_back(dependent);
                }
            }
        }

        if order.len() != descriptors.len() {
            let stuck = descriptors
                .iter()
                .enumerate()
                .find(|(index, _)| in_degree[*index] > 0)
                .map(|(_, descriptor)| descriptor.resource_ref().to_string())
                .unwrap_or_default();
            return Err(ValidationError::DependencyCycle(stuck));
        }

        let mut rank = vec![0usize; descriptors.len()];
        for (slot, &index) in order.iter().enumerate() {
            rank[index] = slot;
        }
        let mut indexed: Vec<(usize, ResourceDescriptor)> = descriptors
            .into_iter()
            .enumerate()
            .map(|(index, descriptor)| (rank[index], descriptor))
            .collect();
        indexed.sort_by_key(|(slot, _)| *slot);

        Ok(Self {
            descriptors: indexed.into_iter().map(|(_, descriptor)| descriptor).collect(),
        })
    }

    pub fn descriptors(&self) -> &[ResourceDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Settings controlling how plans are derived from requests.
#[derive(Debug, Clone)]
pub struct PlanSettings {
    /// Namespace every derived resource lives in.
    pub namespace: String,
    /// Container image used for the database workloads.
    pub workload_image: String,
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            workload_image: DEFAULT_WORKLOAD_IMAGE.to_string(),
        }
    }
}

/// Derives the resource plan for one application stack.
pub struct PlanBuilder {
    gateway: Arc<dyn ClusterGateway>,
    settings: PlanSettings,
}

impl PlanBuilder {
    pub fn new(gateway: Arc<dyn ClusterGateway>, settings: PlanSettings) -> Self {
        Self { gateway, settings }
    }

    /// Expands a validated request into the six-resource plan.
    ///
    /// The live Secret is read first so that an existing credential set is
    /// carried over untouched; fresh credentials are generated only when no
    /// Secret exists yet.
    pub async fn build(&self, request: &ProvisioningRequest) -> Result<Plan, PlanError> {
        request.validate()?;
        let quantities = request.resource_requests.parse()?;

        let app_name = request.app_name.as_str();
        let namespace = self.settings.namespace.clone();
        let labels = standard_labels(app_name);

        let secret_data = match self.existing_secret_data(app_name).await? {
            Some(data) => {
                debug!(app_name, "carrying over existing credentials");
                data
            }
            None => {
                debug!(app_name, "generating fresh credentials");
                generate_credentials()
            }
        };

        let secret = ResourceDescriptor {
            kind: ResourceKind::Secret,
            name: secret_name(app_name),
            namespace: namespace.clone(),
            labels: labels.clone(),
            spec: ResourceSpec::Secret(SecretSpec { data: secret_data }),
            depends_on: Vec::new(),
        };

        let config = ResourceDescriptor {
            kind: ResourceKind::ConfigMap,
            name: config_name(app_name),
            namespace: namespace.clone(),
            labels: labels.clone(),
            spec: ResourceSpec::ConfigMap(ConfigMapSpec {
                data: BTreeMap::from([(
                    CONFIG_FILE_NAME.to_string(),
                    POSTGRESQL_CONF.to_string(),
                )]),
            }),
            depends_on: Vec::new(),
        };

        let volume = ResourceDescriptor {
            kind: ResourceKind::PersistentVolume,
            name: volume_name(app_name),
            namespace: namespace.clone(),
            labels: labels.clone(),
            spec: ResourceSpec::PersistentVolume(VolumeSpec {
                capacity: quantities.storage.clone(),
                host_path: format!("{HOST_PATH_PREFIX}/{app_name}"),
                access_modes: vec![ACCESS_MODE.to_string()],
                reclaim_policy: RECLAIM_POLICY.to_string(),
            }),
            depends_on: Vec::new(),
        };

        let claim = ResourceDescriptor {
            kind: ResourceKind::PersistentVolumeClaim,
            name: claim_name(app_name),
            namespace: namespace.clone(),
            labels: labels.clone(),
            spec: ResourceSpec::PersistentVolumeClaim(ClaimSpec {
                storage: quantities.storage,
                access_modes: vec![ACCESS_MODE.to_string()],
                volume_name: volume.name.clone(),
            }),
            depends_on: vec![volume.resource_ref()],
        };

        let workload = ResourceDescriptor {
            kind: ResourceKind::Workload,
            name: workload_name(app_name),
            namespace: namespace.clone(),
            labels: labels.clone(),
            spec: ResourceSpec::Workload(WorkloadSpec {
                image: self.settings.workload_image.clone(),
                replicas: WORKLOAD_REPLICAS,
                container_port: POSTGRES_PORT,
                cpu: quantities.cpu,
                memory: quantities.memory,
                secret_name: secret.name.clone(),
                config_name: config.name.clone(),
                claim_name: claim.name.clone(),
                service_name: endpoint_name(app_name),
            }),
            depends_on: vec![
                secret.resource_ref(),
                config.resource_ref(),
                claim.resource_ref(),
            ],
        };

        let endpoint = ResourceDescriptor {
            kind: ResourceKind::NetworkEndpoint,
            name: endpoint_name(app_name),
            namespace,
            labels: labels.clone(),
            spec: ResourceSpec::NetworkEndpoint(EndpointSpec {
                exposure: request.exposure_policy,
                port: POSTGRES_PORT,
                target_port: POSTGRES_PORT,
                selector: BTreeMap::from([(APP_LABEL.to_string(), app_name.to_string())]),
            }),
            depends_on: vec![workload.resource_ref()],
        };

        let plan =
            Plan::from_descriptors(vec![secret, config, volume, claim, workload, endpoint])?;
        Ok(plan)
    }

    async fn existing_secret_data(
        &self,
        app_name: &str,
    ) -> Result<Option<BTreeMap<String, SecretString>>, GatewayError> {
        let existing = self
            .gateway
            .get(
                ResourceKind::Secret,
                &self.settings.namespace,
                &secret_name(app_name),
            )
            .await?;
        // A mangled live Secret (wrong key set) is not carried over; the
        // fresh desired set then surfaces as immutable drift at apply time.
        Ok(existing.and_then(|descriptor| match descriptor.spec {
            ResourceSpec::Secret(spec) if is_credential_set(&spec.data) => Some(spec.data),
            _ => None,
        }))
    }
}

/// Every resource of an application stack in apply order; teardown walks it
/// backwards.
pub fn removal_refs(app_name: &str) -> Result<Vec<ResourceRef>, ValidationError> {
    validate_app_name(app_name)?;
    Ok(vec![
        ResourceRef::new(ResourceKind::Secret, secret_name(app_name)),
        ResourceRef::new(ResourceKind::ConfigMap, config_name(app_name)),
        ResourceRef::new(ResourceKind::PersistentVolume, volume_name(app_name)),
        ResourceRef::new(ResourceKind::PersistentVolumeClaim, claim_name(app_name)),
        ResourceRef::new(ResourceKind::Workload, workload_name(app_name)),
        ResourceRef::new(ResourceKind::NetworkEndpoint, endpoint_name(app_name)),
    ])
}
