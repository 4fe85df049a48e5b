use pgstack::plan::{DEFAULT_NAMESPACE, DEFAULT_WORKLOAD_IMAGE};
use pgstack_config::shared::{PgConnectionConfig, RetryConfig};
use serde::Deserialize;

/// Complete configuration for the pgstack API service.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Database connection used by the health query endpoint.
    pub database: PgConnectionConfig,
    /// Application server settings.
    pub application: ApplicationSettings,
    /// Cluster-facing provisioning settings.
    #[serde(default)]
    pub cluster: ClusterConfig,
    /// Retry policy applied to transient cluster errors.
    #[serde(default)]
    pub retry: RetryConfig,
}

/// HTTP server configuration settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSettings {
    /// Host address the API listens on.
    pub host: String,
    /// Port number the API listens on.
    pub port: u16,
}

/// Where and with what image application stacks are provisioned.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_workload_image")]
    pub workload_image: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            workload_image: default_workload_image(),
        }
    }
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_workload_image() -> String {
    DEFAULT_WORKLOAD_IMAGE.to_string()
}
