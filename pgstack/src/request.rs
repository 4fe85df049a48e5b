use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::quantity::{Quantity, QuantityError};

/// Longest suffix appended to an application name when deriving resource
/// names, so every derived name stays within the platform's 63 character
/// label limit.
pub const MAX_APP_NAME_LENGTH: usize = 55;

/// Everything needed to stand up one application stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct ProvisioningRequest {
    /// Unique name of the application instance. Doubles as the stem of every
    /// derived resource name.
    #[cfg_attr(feature = "utoipa", schema(example = "orders-db"))]
    pub app_name: String,
    pub resource_requests: ResourceRequests,
    pub exposure_policy: ExposurePolicy,
}

impl ProvisioningRequest {
    /// Validates the request shape before any plan is derived from it.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_app_name(&self.app_name)?;
        self.resource_requests.parse()?;
        Ok(())
    }
}

/// Requested sizing for the database workload and its storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct ResourceRequests {
    #[cfg_attr(feature = "utoipa", schema(example = "250m"))]
    pub cpu: String,
    #[cfg_attr(feature = "utoipa", schema(example = "256Mi"))]
    pub memory: String,
    #[cfg_attr(feature = "utoipa", schema(example = "1Gi"))]
    pub storage: String,
}

impl ResourceRequests {
    /// Parses all three quantities, rejecting malformed or non-positive
    /// values.
    pub fn parse(&self) -> Result<RequestedQuantities, ValidationError> {
        Ok(RequestedQuantities {
            cpu: parse_positive_quantity("cpu", &self.cpu)?,
            memory: parse_positive_quantity("memory", &self.memory)?,
            storage: parse_positive_quantity("storage", &self.storage)?,
        })
    }
}

/// Validated, typed view of [`ResourceRequests`].
#[derive(Debug, Clone, PartialEq)]
pub struct RequestedQuantities {
    pub cpu: Quantity,
    pub memory: Quantity,
    pub storage: Quantity,
}

/// How the provisioned database is reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub enum ExposurePolicy {
    /// Reachable only inside the cluster through a headless service.
    ClusterInternal,
    /// Published outside the cluster through a load balancer.
    LoadBalanced,
}

/// Rejections raised before any resource is touched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("application name cannot be empty")]
    EmptyAppName,
    #[error("application name `{name}` is invalid: {reason}")]
    InvalidAppName { name: String, reason: &'static str },
    #[error("application name `{0}` exceeds {MAX_APP_NAME_LENGTH} characters")]
    AppNameTooLong(String),
    #[error("{field} request `{value}` is not a valid quantity: {source}")]
    InvalidQuantity {
        field: &'static str,
        value: String,
        source: QuantityError,
    },
    #[error("{field} request `{value}` must be positive")]
    NonPositiveQuantity { field: &'static str, value: String },
    #[error("resource dependencies contain a cycle involving `{0}`")]
    DependencyCycle(String),
    #[error("dependency `{0}` does not match any resource in the plan")]
    UnknownDependency(String),
}

/// Validates an application name as a DNS label usable for service names,
/// which must additionally start with a letter.
pub fn validate_app_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyAppName);
    }
    if name.len() > MAX_APP_NAME_LENGTH {
        return Err(ValidationError::AppNameTooLong(name.to_string()));
    }

    let invalid = |reason| ValidationError::InvalidAppName {
        name: name.to_string(),
        reason,
    };
    let bytes = name.as_bytes();
    if !bytes[0].is_ascii_lowercase() {
        return Err(invalid("must start with a lowercase letter"));
    }
    if !bytes[bytes.len() - 1].is_ascii_lowercase() && !bytes[bytes.len() - 1].is_ascii_digit() {
        return Err(invalid("must end with a lowercase letter or digit"));
    }
    if !bytes
        .iter()
        .all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit() || *byte == b'-')
    {
        return Err(invalid(
            "may only contain lowercase letters, digits and hyphens",
        ));
    }
    Ok(())
}

fn parse_positive_quantity(field: &'static str, value: &str) -> Result<Quantity, ValidationError> {
    let quantity = Quantity::parse(value).map_err(|source| ValidationError::InvalidQuantity {
        field,
        value: value.to_string(),
        source,
    })?;
    if !quantity.is_positive() {
        return Err(ValidationError::NonPositiveQuantity {
            field,
            value: value.to_string(),
        });
    }
    Ok(quantity)
}
