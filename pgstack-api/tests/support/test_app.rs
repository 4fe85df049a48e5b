#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;

use pgstack::gateway::ClusterGateway;
use pgstack::gateway::memory::InMemoryGateway;
use pgstack::request::{ExposurePolicy, ProvisioningRequest, ResourceRequests};
use pgstack_api::config::{ApiConfig, ApplicationSettings, ClusterConfig};
use pgstack_api::startup::{get_connection_pool, run};
use pgstack_config::shared::{PgConnectionConfig, RetryConfig};
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    /// Shared handle onto the gateway the server reconciles against; tests
    /// seed and inspect cluster state through it.
    pub gateway: InMemoryGateway,
    server_handle: tokio::task::JoinHandle<std::io::Result<()>>,
}

impl TestApp {
    pub async fn provision(&self, request: &ProvisioningRequest) -> reqwest::Response {
        self.client
            .post(format!("{}/provision", self.address))
            .json(request)
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn provision_raw(&self, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/provision", self.address))
            .json(&body)
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn teardown(&self, app_name: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}/provision/{app_name}", self.address))
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn status(&self, app_name: &str) -> reqwest::Response {
        self.client
            .get(format!("{}/status/{app_name}", self.address))
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn status_all(&self) -> reqwest::Response {
        self.client
            .get(format!("{}/status", self.address))
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn health(&self, app_name: &str) -> reqwest::Response {
        self.client
            .get(format!("{}/health/{app_name}", self.address))
            .send()
            .await
            .expect("failed to execute request")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

/// A well-formed provisioning request for `app_name`.
pub fn provisioning_request(app_name: &str) -> ProvisioningRequest {
    ProvisioningRequest {
        app_name: app_name.to_string(),
        resource_requests: ResourceRequests {
            cpu: "250m".to_string(),
            memory: "256Mi".to_string(),
            storage: "1Gi".to_string(),
        },
        exposure_policy: ExposurePolicy::ClusterInternal,
    }
}

/// A port nothing is listening on, so database connections fail fast.
fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind probe port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn test_config() -> ApiConfig {
    ApiConfig {
        // The pool is lazy and points at a port with no listener: suites
        // that stay away from the database never connect, and the health
        // route observes a connection failure deterministically.
        database: PgConnectionConfig {
            host: "127.0.0.1".to_string(),
            port: closed_port(),
            name: format!("pgstack_{}", Uuid::new_v4().simple()),
            username: "postgres".to_string(),
            password: None,
            require_ssl: false,
        },
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        cluster: ClusterConfig::default(),
        retry: RetryConfig {
            max_attempts: 3,
            initial_delay_ms: 5,
            max_delay_ms: 20,
            backoff_factor: 2.0,
        },
    }
}

pub async fn spawn_test_app() -> TestApp {
    spawn_test_app_inner(true).await
}

/// Server without cluster access, as when no kubeconfig resolves at startup.
pub async fn spawn_degraded_test_app() -> TestApp {
    spawn_test_app_inner(false).await
}

async fn spawn_test_app_inner(with_gateway: bool) -> TestApp {
    let base_address = "127.0.0.1";
    let listener =
        TcpListener::bind(format!("{base_address}:0")).expect("failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let config = test_config();
    let connection_pool = get_connection_pool(&config.database);
    let gateway = InMemoryGateway::new();

    let server = run(
        config,
        listener,
        connection_pool,
        with_gateway.then(|| Arc::new(gateway.clone()) as Arc<dyn ClusterGateway>),
    )
    .await
    .expect("failed to build server");

    let server_handle = tokio::spawn(server);

    TestApp {
        address: format!("http://{base_address}:{port}"),
        client: reqwest::Client::new(),
        gateway,
        server_handle,
    }
}
