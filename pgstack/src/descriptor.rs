use std::collections::BTreeMap;
use std::fmt;

use constant_time_eq::constant_time_eq;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::quantity::Quantity;
use crate::request::ExposurePolicy;

/// Label carrying the application name on every managed object.
pub const APP_LABEL: &str = "app";
/// Label marking an object as owned by this provisioner.
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
/// Value stored under [`MANAGED_BY_LABEL`].
pub const MANAGED_BY_VALUE: &str = "pgstack";

/// The kinds of platform resources a plan can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub enum ResourceKind {
    Secret,
    ConfigMap,
    PersistentVolume,
    PersistentVolumeClaim,
    Workload,
    NetworkEndpoint,
}

impl ResourceKind {
    /// How divergence between desired and live state is handled for this
    /// kind.
    ///
    /// Credentials must not be rotated behind a running database and a
    /// volume cannot be resized safely, so Secret and the storage kinds
    /// never converge in place.
    pub fn update_policy(&self) -> UpdatePolicy {
        match self {
            ResourceKind::Secret
            | ResourceKind::PersistentVolume
            | ResourceKind::PersistentVolumeClaim => UpdatePolicy::Immutable,
            ResourceKind::ConfigMap | ResourceKind::Workload | ResourceKind::NetworkEndpoint => {
                UpdatePolicy::InPlace
            }
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Secret => "Secret",
            ResourceKind::ConfigMap => "ConfigMap",
            ResourceKind::PersistentVolume => "PersistentVolume",
            ResourceKind::PersistentVolumeClaim => "PersistentVolumeClaim",
            ResourceKind::Workload => "Workload",
            ResourceKind::NetworkEndpoint => "NetworkEndpoint",
        };
        f.write_str(name)
    }
}

/// Divergence handling for one resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePolicy {
    /// Divergence is surfaced as a failure, never auto-corrected.
    Immutable,
    /// Divergence is converged with an in-place update.
    InPlace,
}

/// Identifies one resource within a plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub name: String,
}

impl ResourceRef {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// Desired state of one platform resource.
///
/// Descriptors are pure data derived from a provisioning request; nothing in
/// them refers to live cluster state.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub spec: ResourceSpec,
    /// Plan members that must have been applied successfully before this
    /// one.
    pub depends_on: Vec<ResourceRef>,
}

impl ResourceDescriptor {
    pub fn resource_ref(&self) -> ResourceRef {
        ResourceRef::new(self.kind, self.name.clone())
    }
}

/// Kind-specific desired state.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceSpec {
    Secret(SecretSpec),
    ConfigMap(ConfigMapSpec),
    PersistentVolume(VolumeSpec),
    PersistentVolumeClaim(ClaimSpec),
    Workload(WorkloadSpec),
    NetworkEndpoint(EndpointSpec),
}

impl ResourceSpec {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceSpec::Secret(_) => ResourceKind::Secret,
            ResourceSpec::ConfigMap(_) => ResourceKind::ConfigMap,
            ResourceSpec::PersistentVolume(_) => ResourceKind::PersistentVolume,
            ResourceSpec::PersistentVolumeClaim(_) => ResourceKind::PersistentVolumeClaim,
            ResourceSpec::Workload(_) => ResourceKind::Workload,
            ResourceSpec::NetworkEndpoint(_) => ResourceKind::NetworkEndpoint,
        }
    }
}

/// Opaque key-value credential payload.
///
/// Values are [`SecretString`]s so debug output and logs never carry them,
/// and equality runs in constant time per value.
#[derive(Debug, Clone)]
pub struct SecretSpec {
    pub data: BTreeMap<String, SecretString>,
}

impl PartialEq for SecretSpec {
    fn eq(&self, other: &Self) -> bool {
        if self.data.len() != other.data.len() {
            return false;
        }
        self.data
            .iter()
            .zip(other.data.iter())
            .all(|((key_a, value_a), (key_b, value_b))| {
                key_a == key_b
                    && constant_time_eq(
                        value_a.expose_secret().as_bytes(),
                        value_b.expose_secret().as_bytes(),
                    )
            })
    }
}

impl Eq for SecretSpec {}

/// Plain configuration files keyed by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigMapSpec {
    pub data: BTreeMap<String, String>,
}

/// Backing volume carved out of a node-local path.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeSpec {
    pub capacity: Quantity,
    pub host_path: String,
    pub access_modes: Vec<String>,
    pub reclaim_policy: String,
}

/// Claim binding a workload to its backing volume.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimSpec {
    pub storage: Quantity,
    pub access_modes: Vec<String>,
    /// Name of the volume this claim binds to.
    pub volume_name: String,
}

/// Single-container database workload.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadSpec {
    pub image: String,
    pub replicas: i32,
    pub container_port: i32,
    pub cpu: Quantity,
    pub memory: Quantity,
    /// Secret injected into the container environment.
    pub secret_name: String,
    /// ConfigMap mounted as the configuration directory.
    pub config_name: String,
    /// Claim mounted as the data directory.
    pub claim_name: String,
    /// Governing service the workload registers under.
    pub service_name: String,
}

/// Service publishing the workload inside or outside the cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointSpec {
    pub exposure: ExposurePolicy,
    pub port: i32,
    pub target_port: i32,
    pub selector: BTreeMap<String, String>,
}

/// Labels applied to every resource of an application stack.
pub fn standard_labels(app_name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (APP_LABEL.to_string(), app_name.to_string()),
        (MANAGED_BY_LABEL.to_string(), MANAGED_BY_VALUE.to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_and_storage_kinds_are_immutable() {
        assert_eq!(ResourceKind::Secret.update_policy(), UpdatePolicy::Immutable);
        assert_eq!(
            ResourceKind::PersistentVolume.update_policy(),
            UpdatePolicy::Immutable
        );
        assert_eq!(
            ResourceKind::PersistentVolumeClaim.update_policy(),
            UpdatePolicy::Immutable
        );
        assert_eq!(ResourceKind::ConfigMap.update_policy(), UpdatePolicy::InPlace);
        assert_eq!(ResourceKind::Workload.update_policy(), UpdatePolicy::InPlace);
        assert_eq!(
            ResourceKind::NetworkEndpoint.update_policy(),
            UpdatePolicy::InPlace
        );
    }

    #[test]
    fn resource_ref_display_names_kind_and_object() {
        let reference = ResourceRef::new(ResourceKind::ConfigMap, "orders-config");
        assert_eq!(reference.to_string(), "ConfigMap/orders-config");
    }

    #[test]
    fn secret_specs_compare_by_plaintext_value() {
        let left = SecretSpec {
            data: BTreeMap::from([("user".to_string(), SecretString::from("alpha".to_string()))]),
        };
        let right = SecretSpec {
            data: BTreeMap::from([("user".to_string(), SecretString::from("alpha".to_string()))]),
        };
        let changed = SecretSpec {
            data: BTreeMap::from([("user".to_string(), SecretString::from("beta".to_string()))]),
        };
        assert_eq!(left, right);
        assert_ne!(left, changed);
    }

    #[test]
    fn secret_spec_debug_redacts_values() {
        let spec = SecretSpec {
            data: BTreeMap::from([(
                "password".to_string(),
                SecretString::from("hunter2".to_string()),
            )]),
        };
        let rendered = format!("{spec:?}");
        assert!(!rendered.contains("hunter2"));
    }
}
