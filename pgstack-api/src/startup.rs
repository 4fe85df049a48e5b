use std::{net::TcpListener, sync::Arc, time::Duration};

use actix_web::{App, HttpResponse, HttpServer, Responder, dev::Server, web};
use pgstack::descriptor::{ResourceKind, ResourceRef};
use pgstack::gateway::kube::KubeGateway;
use pgstack::gateway::{ClusterGateway, InstancePhase, InstanceStatus};
use pgstack::outcome::{
    ApplyStatus, DescriptorOutcome, FailureReason, OutcomeSummary, ReconciliationOutcome,
    TeardownOutcome, TeardownResult, TeardownStatus,
};
use pgstack::provisioner::{Provisioner, ProvisionerSettings};
use pgstack::request::{ExposurePolicy, ProvisioningRequest, ResourceRequests};
use pgstack::shutdown::create_shutdown_channel;
use pgstack::status::AppStatus;
use pgstack_config::shared::PgConnectionConfig;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::warn;
use tracing_actix_web::TracingLogger;
use utoipa::OpenApi;

use crate::{
    config::ApiConfig,
    db::health::HealthRecord,
    metrics::init_metrics,
    routes::{
        ErrorMessage,
        health::health,
        health_check::health_check,
        metrics::metrics,
        provision::{provision, teardown},
        status::{status, status_all},
    },
    span_builder::ApiRootSpanBuilder,
};

/// How long a request waits for a pooled database connection.
const DB_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(2);

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(config: ApiConfig) -> Result<Self, anyhow::Error> {
        let connection_pool = get_connection_pool(&config.database);

        let address = format!("{}:{}", config.application.host, config.application.port);
        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();

        let gateway = match KubeGateway::connect().await {
            Ok(gateway) => Some(Arc::new(gateway) as Arc<dyn ClusterGateway>),
            Err(e) => {
                warn!(
                    "failed to connect to the cluster: {e}. Running without provisioning support."
                );
                None
            }
        };

        let server = run(config, listener, connection_pool, gateway).await?;

        Ok(Self { port, server })
    }

    pub async fn migrate_database(config: PgConnectionConfig) -> Result<(), anyhow::Error> {
        let connection_pool = get_connection_pool(&config);

        sqlx::migrate!("./migrations").run(&connection_pool).await?;

        Ok(())
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn get_connection_pool(config: &PgConnectionConfig) -> PgPool {
    // Lazy so the server starts even while the database is down; the health
    // route surfaces the failure per request instead.
    PgPoolOptions::new()
        .acquire_timeout(DB_ACQUIRE_TIMEOUT)
        .connect_lazy_with(config.with_db())
}

async fn serve_openapi(doc: web::Data<utoipa::openapi::OpenApi>) -> impl Responder {
    HttpResponse::Ok().json(doc.as_ref())
}

// The gateway is an Option so the API can come up on machines without
// cluster access (and in tests that swap in the in-memory gateway);
// provisioning routes are only mounted when it is present.
pub async fn run(
    config: ApiConfig,
    listener: TcpListener,
    connection_pool: PgPool,
    gateway: Option<Arc<dyn ClusterGateway>>,
) -> Result<Server, anyhow::Error> {
    let connection_pool = web::Data::new(connection_pool);

    let provisioner = gateway.map(|gateway| {
        web::Data::new(Provisioner::new(
            gateway,
            ProvisionerSettings {
                namespace: config.cluster.namespace.clone(),
                workload_image: config.cluster.workload_image.clone(),
                retry: config.retry.clone(),
            },
        ))
    });

    // Runs are cancelled between resources when this sender signals; the
    // receiver half is re-derived per request.
    let (shutdown_tx, _shutdown_rx) = create_shutdown_channel();
    let shutdown_tx = web::Data::new(shutdown_tx);

    let metrics_handle = init_metrics()?;

    #[derive(OpenApi)]
    #[openapi(
        paths(
            crate::routes::health_check::health_check,
            crate::routes::metrics::metrics,
            crate::routes::provision::provision,
            crate::routes::provision::teardown,
            crate::routes::status::status_all,
            crate::routes::status::status,
            crate::routes::health::health,
        ),
        components(schemas(
            ErrorMessage,
            ProvisioningRequest,
            ResourceRequests,
            ExposurePolicy,
            ResourceKind,
            ResourceRef,
            ApplyStatus,
            FailureReason,
            DescriptorOutcome,
            OutcomeSummary,
            ReconciliationOutcome,
            TeardownStatus,
            TeardownResult,
            TeardownOutcome,
            AppStatus,
            InstancePhase,
            InstanceStatus,
            HealthRecord,
        ))
    )]
    struct ApiDoc;

    let openapi = web::Data::new(ApiDoc::openapi());

    let server = HttpServer::new(move || {
        let tracing_logger = TracingLogger::<ApiRootSpanBuilder>::new();
        let app = App::new()
            .wrap(tracing_logger)
            .service(health_check)
            .service(metrics)
            .service(health)
            .app_data(openapi.clone())
            .route("/api-docs/openapi.json", web::get().to(serve_openapi))
            .app_data(connection_pool.clone())
            .app_data(shutdown_tx.clone())
            .app_data(web::ThinData(metrics_handle.clone()));

        // Status projection reads through the same gateway the provisioner
        // writes through, so it is unavailable in the same degraded mode.
        if let Some(provisioner) = provisioner.clone() {
            app.service(provision)
                .service(teardown)
                .service(status_all)
                .service(status)
                .app_data(provisioner)
        } else {
            app
        }
    })
    .listen(listener)?
    .run();

    Ok(server)
}
