//! [`ClusterGateway`] implementation backed by a real Kubernetes API server.

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{StatefulSet, StatefulSetSpec};
use k8s_openapi::api::core::v1::{
    ConfigMap, ConfigMapVolumeSource, Container, ContainerPort, EnvFromSource,
    HostPathVolumeSource, PersistentVolume, PersistentVolumeClaim, PersistentVolumeClaimSpec,
    PersistentVolumeClaimVolumeSource, PersistentVolumeSpec, Pod, PodSpec, PodTemplateSpec,
    ResourceRequirements, Secret, SecretEnvSource, Service, ServicePort, ServiceSpec, Volume,
    VolumeMount, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity as PlatformQuantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::Client;
use secrecy::{ExposeSecret, SecretString};

use crate::descriptor::{
    APP_LABEL, ClaimSpec, ConfigMapSpec, EndpointSpec, ResourceDescriptor, ResourceKind,
    ResourceSpec, SecretSpec, VolumeSpec, WorkloadSpec,
};
use crate::gateway::base::{
    ClusterGateway, GatewayError, InstancePhase, InstanceStatus, WorkloadStatus,
};
use crate::quantity::Quantity;
use crate::request::ExposurePolicy;

/// Field manager name recorded on server-side apply patches.
const FIELD_MANAGER: &str = "pgstack";

/// Name of the single database container inside a workload pod.
const CONTAINER_NAME: &str = "postgres";
/// Pod volume carrying the data claim.
const DATA_VOLUME: &str = "data";
const DATA_MOUNT_PATH: &str = "/var/lib/postgresql/data";
/// Pod volume carrying the configuration files.
const CONFIG_VOLUME: &str = "config";
const CONFIG_MOUNT_PATH: &str = "/etc/postgresql";

const STORAGE_RESOURCE: &str = "storage";
const CPU_RESOURCE: &str = "cpu";
const MEMORY_RESOURCE: &str = "memory";

/// Gateway talking to a Kubernetes cluster through the [`kube`] client.
///
/// Descriptors map onto Secrets, ConfigMaps, PersistentVolumes,
/// PersistentVolumeClaims, StatefulSets, and Services. Reads translate live
/// objects back into descriptors field by field, which drops every
/// server-assigned field so comparison against a desired descriptor never
/// sees noise like resource versions, default storage classes, or assigned
/// cluster IPs.
pub struct KubeGateway {
    client: Client,
}

impl KubeGateway {
    /// Connects using the ambient configuration (in-cluster or local
    /// `~/.kube/config`).
    pub async fn connect() -> Result<Self, GatewayError> {
        let client = Client::try_default().await.map_err(|error| {
            GatewayError::Rejected(format!("cluster configuration unavailable: {error}"))
        })?;
        Ok(Self::new(client))
    }

    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn config_maps(&self, namespace: &str) -> Api<ConfigMap> {
        Api::namespaced(self.client.clone(), namespace)
    }

    /// PersistentVolumes are cluster-scoped.
    fn volumes(&self) -> Api<PersistentVolume> {
        Api::all(self.client.clone())
    }

    fn claims(&self, namespace: &str) -> Api<PersistentVolumeClaim> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn stateful_sets(&self, namespace: &str) -> Api<StatefulSet> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn services(&self, namespace: &str) -> Api<Service> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ClusterGateway for KubeGateway {
    async fn get(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ResourceDescriptor>, GatewayError> {
        let descriptor = match kind {
            ResourceKind::Secret => self
                .secrets(namespace)
                .get_opt(name)
                .await
                .map_err(to_gateway_error)?
                .map(read_secret),
            ResourceKind::ConfigMap => self
                .config_maps(namespace)
                .get_opt(name)
                .await
                .map_err(to_gateway_error)?
                .map(read_config_map),
            ResourceKind::PersistentVolume => self
                .volumes()
                .get_opt(name)
                .await
                .map_err(to_gateway_error)?
                .map(read_volume),
            ResourceKind::PersistentVolumeClaim => self
                .claims(namespace)
                .get_opt(name)
                .await
                .map_err(to_gateway_error)?
                .map(read_claim),
            ResourceKind::Workload => self
                .stateful_sets(namespace)
                .get_opt(name)
                .await
                .map_err(to_gateway_error)?
                .map(read_workload),
            ResourceKind::NetworkEndpoint => self
                .services(namespace)
                .get_opt(name)
                .await
                .map_err(to_gateway_error)?
                .map(read_endpoint),
        };
        Ok(descriptor)
    }

    async fn create(&self, descriptor: &ResourceDescriptor) -> Result<(), GatewayError> {
        let params = PostParams::default();
        match &descriptor.spec {
            ResourceSpec::Secret(spec) => {
                self.secrets(&descriptor.namespace)
                    .create(&params, &build_secret(descriptor, spec))
                    .await
                    .map_err(to_gateway_error)?;
            }
            ResourceSpec::ConfigMap(spec) => {
                self.config_maps(&descriptor.namespace)
                    .create(&params, &build_config_map(descriptor, spec))
                    .await
                    .map_err(to_gateway_error)?;
            }
            ResourceSpec::PersistentVolume(spec) => {
                self.volumes()
                    .create(&params, &build_volume(descriptor, spec))
                    .await
                    .map_err(to_gateway_error)?;
            }
            ResourceSpec::PersistentVolumeClaim(spec) => {
                self.claims(&descriptor.namespace)
                    .create(&params, &build_claim(descriptor, spec))
                    .await
                    .map_err(to_gateway_error)?;
            }
            ResourceSpec::Workload(spec) => {
                self.stateful_sets(&descriptor.namespace)
                    .create(&params, &build_workload(descriptor, spec))
                    .await
                    .map_err(to_gateway_error)?;
            }
            ResourceSpec::NetworkEndpoint(spec) => {
                self.services(&descriptor.namespace)
                    .create(&params, &build_endpoint(descriptor, spec))
                    .await
                    .map_err(to_gateway_error)?;
            }
        }
        Ok(())
    }

    async fn update(&self, descriptor: &ResourceDescriptor) -> Result<(), GatewayError> {
        let params = PatchParams::apply(FIELD_MANAGER).force();
        let name = descriptor.name.as_str();
        match &descriptor.spec {
            ResourceSpec::Secret(spec) => {
                self.secrets(&descriptor.namespace)
                    .patch(name, &params, &Patch::Apply(&build_secret(descriptor, spec)))
                    .await
                    .map_err(to_gateway_error)?;
            }
            ResourceSpec::ConfigMap(spec) => {
                self.config_maps(&descriptor.namespace)
                    .patch(
                        name,
                        &params,
                        &Patch::Apply(&build_config_map(descriptor, spec)),
                    )
                    .await
                    .map_err(to_gateway_error)?;
            }
            ResourceSpec::PersistentVolume(spec) => {
                self.volumes()
                    .patch(name, &params, &Patch::Apply(&build_volume(descriptor, spec)))
                    .await
                    .map_err(to_gateway_error)?;
            }
            ResourceSpec::PersistentVolumeClaim(spec) => {
                self.claims(&descriptor.namespace)
                    .patch(name, &params, &Patch::Apply(&build_claim(descriptor, spec)))
                    .await
                    .map_err(to_gateway_error)?;
            }
            ResourceSpec::Workload(spec) => {
                self.stateful_sets(&descriptor.namespace)
                    .patch(
                        name,
                        &params,
                        &Patch::Apply(&build_workload(descriptor, spec)),
                    )
                    .await
                    .map_err(to_gateway_error)?;
            }
            ResourceSpec::NetworkEndpoint(spec) => {
                self.services(&descriptor.namespace)
                    .patch(
                        name,
                        &params,
                        &Patch::Apply(&build_endpoint(descriptor, spec)),
                    )
                    .await
                    .map_err(to_gateway_error)?;
            }
        }
        Ok(())
    }

    async fn delete(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<bool, GatewayError> {
        let params = DeleteParams::default();
        let result = match kind {
            ResourceKind::Secret => self.secrets(namespace).delete(name, &params).await.map(|_| ()),
            ResourceKind::ConfigMap => self
                .config_maps(namespace)
                .delete(name, &params)
                .await
                .map(|_| ()),
            ResourceKind::PersistentVolume => {
                self.volumes().delete(name, &params).await.map(|_| ())
            }
            ResourceKind::PersistentVolumeClaim => {
                self.claims(namespace).delete(name, &params).await.map(|_| ())
            }
            ResourceKind::Workload => self
                .stateful_sets(namespace)
                .delete(name, &params)
                .await
                .map(|_| ()),
            ResourceKind::NetworkEndpoint => {
                self.services(namespace).delete(name, &params).await.map(|_| ())
            }
        };
        match result {
            Ok(()) => Ok(true),
            Err(kube::Error::Api(response)) if response.code == 404 => Ok(false),
            Err(error) => Err(to_gateway_error(error)),
        }
    }

    async fn list_by_label(
        &self,
        kind: ResourceKind,
        namespace: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<Vec<ResourceDescriptor>, GatewayError> {
        let params = ListParams::default().labels(&label_selector(labels));
        let descriptors = match kind {
            ResourceKind::Secret => self
                .secrets(namespace)
                .list(&params)
                .await
                .map_err(to_gateway_error)?
                .items
                .into_iter()
                .map(read_secret)
                .collect(),
            ResourceKind::ConfigMap => self
                .config_maps(namespace)
                .list(&params)
                .await
                .map_err(to_gateway_error)?
                .items
                .into_iter()
                .map(read_config_map)
                .collect(),
            ResourceKind::PersistentVolume => self
                .volumes()
                .list(&params)
                .await
                .map_err(to_gateway_error)?
                .items
                .into_iter()
                .map(read_volume)
                .collect(),
            ResourceKind::PersistentVolumeClaim => self
                .claims(namespace)
                .list(&params)
                .await
                .map_err(to_gateway_error)?
                .items
                .into_iter()
                .map(read_claim)
                .collect(),
            ResourceKind::Workload => self
                .stateful_sets(namespace)
                .list(&params)
                .await
                .map_err(to_gateway_error)?
                .items
                .into_iter()
                .map(read_workload)
                .collect(),
            ResourceKind::NetworkEndpoint => self
                .services(namespace)
                .list(&params)
                .await
                .map_err(to_gateway_error)?
                .items
                .into_iter()
                .map(read_endpoint)
                .collect(),
        };
        Ok(descriptors)
    }

    async fn workload_status(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<WorkloadStatus>, GatewayError> {
        let set = self
            .stateful_sets(namespace)
            .get_opt(name)
            .await
            .map_err(to_gateway_error)?;
        Ok(set.map(|set| WorkloadStatus {
            desired_replicas: set
                .spec
                .as_ref()
                .and_then(|spec| spec.replicas)
                .unwrap_or_default(),
            available_replicas: set
                .status
                .as_ref()
                .and_then(|status| status.available_replicas)
                .unwrap_or_default(),
        }))
    }

    async fn list_instances(
        &self,
        namespace: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<Vec<InstanceStatus>, GatewayError> {
        let params = ListParams::default().labels(&label_selector(labels));
        let pods = self
            .pods(namespace)
            .list(&params)
            .await
            .map_err(to_gateway_error)?;
        Ok(pods.items.into_iter().map(read_instance).collect())
    }
}

/// Splits platform errors into the retryable and terminal classes.
///
/// Write conflicts, throttling, and server-side errors are worth retrying;
/// the rest of the 4xx family means the request itself is unacceptable.
fn to_gateway_error(error: kube::Error) -> GatewayError {
    match error {
        kube::Error::Api(response) => {
            if response.code == 409 || response.code == 429 || response.code >= 500 {
                GatewayError::Transient(response.to_string())
            } else {
                GatewayError::Rejected(response.to_string())
            }
        }
        other => GatewayError::Transient(other.to_string()),
    }
}

fn label_selector(labels: &BTreeMap<String, String>) -> String {
    labels
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Object metadata shared by every managed resource.
///
/// PersistentVolumes are cluster-scoped and must not carry a namespace.
fn metadata_for(descriptor: &ResourceDescriptor) -> ObjectMeta {
    let namespace = match descriptor.kind {
        ResourceKind::PersistentVolume => None,
        _ => Some(descriptor.namespace.clone()),
    };
    ObjectMeta {
        name: Some(descriptor.name.clone()),
        namespace,
        labels: Some(descriptor.labels.clone()),
        ..Default::default()
    }
}

fn into_descriptor(kind: ResourceKind, metadata: ObjectMeta, spec: ResourceSpec) -> ResourceDescriptor {
    ResourceDescriptor {
        kind,
        name: metadata.name.unwrap_or_default(),
        namespace: metadata.namespace.unwrap_or_default(),
        labels: metadata.labels.unwrap_or_default(),
        spec,
        depends_on: Vec::new(),
    }
}

fn build_secret(descriptor: &ResourceDescriptor, spec: &SecretSpec) -> Secret {
    let data = spec
        .data
        .iter()
        .map(|(key, value)| (key.clone(), value.expose_secret().to_string()))
        .collect();
    Secret {
        metadata: metadata_for(descriptor),
        string_data: Some(data),
        type_: Some("Opaque".to_string()),
        ..Default::default()
    }
}

fn read_secret(secret: Secret) -> ResourceDescriptor {
    let data = secret
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| {
            let plaintext = String::from_utf8_lossy(&value.0).to_string();
            (key, SecretString::from(plaintext))
        })
        .collect();
    into_descriptor(
        ResourceKind::Secret,
        secret.metadata,
        ResourceSpec::Secret(SecretSpec { data }),
    )
}

fn build_config_map(descriptor: &ResourceDescriptor, spec: &ConfigMapSpec) -> ConfigMap {
    ConfigMap {
        metadata: metadata_for(descriptor),
        data: Some(spec.data.clone()),
        ..Default::default()
    }
}

fn read_config_map(config_map: ConfigMap) -> ResourceDescriptor {
    into_descriptor(
        ResourceKind::ConfigMap,
        config_map.metadata,
        ResourceSpec::ConfigMap(ConfigMapSpec {
            data: config_map.data.unwrap_or_default(),
        }),
    )
}

fn build_volume(descriptor: &ResourceDescriptor, spec: &VolumeSpec) -> PersistentVolume {
    PersistentVolume {
        metadata: metadata_for(descriptor),
        spec: Some(PersistentVolumeSpec {
            capacity: Some(BTreeMap::from([(
                STORAGE_RESOURCE.to_string(),
                PlatformQuantity(spec.capacity.to_string()),
            )])),
            access_modes: Some(spec.access_modes.clone()),
            persistent_volume_reclaim_policy: Some(spec.reclaim_policy.clone()),
            host_path: Some(HostPathVolumeSource {
                path: spec.host_path.clone(),
                type_: None,
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn read_volume(volume: PersistentVolume) -> ResourceDescriptor {
    let spec = volume.spec.unwrap_or_default();
    let capacity = spec
        .capacity
        .as_ref()
        .and_then(|capacity| capacity.get(STORAGE_RESOURCE))
        .map(|quantity| Quantity::from_raw(&quantity.0))
        .unwrap_or_else(|| Quantity::from_raw(""));
    into_descriptor(
        ResourceKind::PersistentVolume,
        volume.metadata,
        ResourceSpec::PersistentVolume(VolumeSpec {
            capacity,
            host_path: spec.host_path.map(|path| path.path).unwrap_or_default(),
            access_modes: spec.access_modes.unwrap_or_default(),
            reclaim_policy: spec.persistent_volume_reclaim_policy.unwrap_or_default(),
        }),
    )
}

fn build_claim(descriptor: &ResourceDescriptor, spec: &ClaimSpec) -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        metadata: metadata_for(descriptor),
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(spec.access_modes.clone()),
            resources: Some(VolumeResourceRequirements {
                requests: Some(BTreeMap::from([(
                    STORAGE_RESOURCE.to_string(),
                    PlatformQuantity(spec.storage.to_string()),
                )])),
                ..Default::default()
            }),
            volume_name: Some(spec.volume_name.clone()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn read_claim(claim: PersistentVolumeClaim) -> ResourceDescriptor {
    let spec = claim.spec.unwrap_or_default();
    let storage = spec
        .resources
        .as_ref()
        .and_then(|resources| resources.requests.as_ref())
        .and_then(|requests| requests.get(STORAGE_RESOURCE))
        .map(|quantity| Quantity::from_raw(&quantity.0))
        .unwrap_or_else(|| Quantity::from_raw(""));
    into_descriptor(
        ResourceKind::PersistentVolumeClaim,
        claim.metadata,
        ResourceSpec::PersistentVolumeClaim(ClaimSpec {
            storage,
            access_modes: spec.access_modes.unwrap_or_default(),
            volume_name: spec.volume_name.unwrap_or_default(),
        }),
    )
}

fn build_workload(descriptor: &ResourceDescriptor, spec: &WorkloadSpec) -> StatefulSet {
    let app_name = descriptor
        .labels
        .get(APP_LABEL)
        .cloned()
        .unwrap_or_else(|| descriptor.name.clone());
    StatefulSet {
        metadata: metadata_for(descriptor),
        spec: Some(StatefulSetSpec {
            replicas: Some(spec.replicas),
            selector: LabelSelector {
                match_labels: Some(BTreeMap::from([(APP_LABEL.to_string(), app_name)])),
                ..Default::default()
            },
            service_name: spec.service_name.clone(),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(descriptor.labels.clone()),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: CONTAINER_NAME.to_string(),
                        image: Some(spec.image.clone()),
                        ports: Some(vec![ContainerPort {
                            container_port: spec.container_port,
                            ..Default::default()
                        }]),
                        env_from: Some(vec![EnvFromSource {
                            secret_ref: Some(SecretEnvSource {
                                name: Some(spec.secret_name.clone()),
                                optional: None,
                            }),
                            ..Default::default()
                        }]),
                        resources: Some(ResourceRequirements {
                            requests: Some(BTreeMap::from([
                                (
                                    CPU_RESOURCE.to_string(),
                                    PlatformQuantity(spec.cpu.to_string()),
                                ),
                                (
                                    MEMORY_RESOURCE.to_string(),
                                    PlatformQuantity(spec.memory.to_string()),
                                ),
                            ])),
                            ..Default::default()
                        }),
                        volume_mounts: Some(vec![
                            VolumeMount {
                                name: DATA_VOLUME.to_string(),
                                mount_path: DATA_MOUNT_PATH.to_string(),
                                ..Default::default()
                            },
                            VolumeMount {
                                name: CONFIG_VOLUME.to_string(),
                                mount_path: CONFIG_MOUNT_PATH.to_string(),
                                ..Default::default()
                            },
                        ]),
                        ..Default::default()
                    }],
                    volumes: Some(vec![
                        Volume {
                            name: DATA_VOLUME.to_string(),
                            persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                                claim_name: spec.claim_name.clone(),
                                read_only: None,
                            }),
                            ..Default::default()
                        },
                        Volume {
                            name: CONFIG_VOLUME.to_string(),
                            config_map: Some(ConfigMapVolumeSource {
                                name: Some(spec.config_name.clone()),
                                ..Default::default()
                            }),
                            ..Default::default()
                        },
                    ]),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn read_workload(set: StatefulSet) -> ResourceDescriptor {
    let metadata = set.metadata;
    let spec = set.spec.unwrap_or_default();
    let pod_spec = spec.template.spec.unwrap_or_default();
    let container = pod_spec.containers.into_iter().next().unwrap_or_default();

    let container_port = container
        .ports
        .as_ref()
        .and_then(|ports| ports.first())
        .map(|port| port.container_port)
        .unwrap_or_default();
    let secret_name = container
        .env_from
        .unwrap_or_default()
        .into_iter()
        .find_map(|source| source.secret_ref.and_then(|secret| secret.name))
        .unwrap_or_default();
    let requests = container
        .resources
        .and_then(|resources| resources.requests)
        .unwrap_or_default();
    let read_request = |resource: &str| {
        requests
            .get(resource)
            .map(|quantity| Quantity::from_raw(&quantity.0))
            .unwrap_or_else(|| Quantity::from_raw(""))
    };

    let volumes = pod_spec.volumes.unwrap_or_default();
    let config_name = volumes
        .iter()
        .find_map(|volume| {
            volume
                .config_map
                .as_ref()
                .and_then(|config| config.name.clone())
        })
        .unwrap_or_default();
    let claim_name = volumes
        .iter()
        .find_map(|volume| {
            volume
                .persistent_volume_claim
                .as_ref()
                .map(|claim| claim.claim_name.clone())
        })
        .unwrap_or_default();

    into_descriptor(
        ResourceKind::Workload,
        metadata,
        ResourceSpec::Workload(WorkloadSpec {
            image: container.image.unwrap_or_default(),
            replicas: spec.replicas.unwrap_or_default(),
            container_port,
            cpu: read_request(CPU_RESOURCE),
            memory: read_request(MEMORY_RESOURCE),
            secret_name,
            config_name,
            claim_name,
            service_name: spec.service_name,
        }),
    )
}

fn build_endpoint(descriptor: &ResourceDescriptor, spec: &EndpointSpec) -> Service {
    let (type_, cluster_ip) = match spec.exposure {
        ExposurePolicy::ClusterInternal => (None, Some("None".to_string())),
        ExposurePolicy::LoadBalanced => (Some("LoadBalancer".to_string()), None),
    };
    Service {
        metadata: metadata_for(descriptor),
        spec: Some(ServiceSpec {
            type_,
            cluster_ip,
            selector: Some(spec.selector.clone()),
            ports: Some(vec![ServicePort {
                port: spec.port,
                target_port: Some(IntOrString::Int(spec.target_port)),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn read_endpoint(service: Service) -> ResourceDescriptor {
    let spec = service.spec.unwrap_or_default();
    let exposure = if spec.type_.as_deref() == Some("LoadBalancer") {
        ExposurePolicy::LoadBalanced
    } else {
        ExposurePolicy::ClusterInternal
    };
    let port = spec
        .ports
        .unwrap_or_default()
        .into_iter()
        .next()
        .unwrap_or_default();
    // An absent targetPort means the service targets its own port.
    let target_port = match port.target_port {
        Some(IntOrString::Int(target)) => target,
        _ => port.port,
    };
    into_descriptor(
        ResourceKind::NetworkEndpoint,
        service.metadata,
        ResourceSpec::NetworkEndpoint(EndpointSpec {
            exposure,
            port: port.port,
            target_port,
            selector: spec.selector.unwrap_or_default(),
        }),
    )
}

fn read_instance(pod: Pod) -> InstanceStatus {
    let status = pod.status.unwrap_or_default();
    InstanceStatus {
        name: pod.metadata.name.unwrap_or_default(),
        phase: status
            .phase
            .as_deref()
            .map(InstancePhase::from)
            .unwrap_or(InstancePhase::Unknown),
        host: pod.spec.and_then(|spec| spec.node_name),
        started_at: status.start_time.map(|time| time.0),
        host_ip: status.host_ip,
        instance_ip: status.pod_ip,
    }
}
