use actix_web::{
    HttpResponse, ResponseError, delete,
    http::{StatusCode, header::ContentType},
    post,
    web::{Data, Json, Path},
};
use pgstack::gateway::GatewayError;
use pgstack::outcome::{ReconciliationOutcome, TeardownOutcome};
use pgstack::plan::PlanError;
use pgstack::provisioner::Provisioner;
use pgstack::request::{ProvisioningRequest, ValidationError};
use pgstack::shutdown::ShutdownTx;
use thiserror::Error;
use tracing_actix_web::RootSpan;

use crate::routes::ErrorMessage;

/// Request-level provisioning failures.
///
/// Per-resource failures are never errors; they ride inside the returned
/// outcome. Only faults where nothing was applied end up here.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to inspect existing resources: {0}")]
    Gateway(GatewayError),
}

impl From<PlanError> for ProvisionError {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::Validation(e) => Self::Validation(e),
            PlanError::Gateway(e) => Self::Gateway(e),
        }
    }
}

impl ResponseError for ProvisionError {
    fn status_code(&self) -> StatusCode {
        match self {
            ProvisionError::Validation(_) => StatusCode::BAD_REQUEST,
            ProvisionError::Gateway(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_message = ErrorMessage {
            error: self.to_string(),
        };
        let body =
            serde_json::to_string(&error_message).expect("failed to serialize error message");
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(body)
    }
}

/// Maps an outcome to the response status.
///
/// Immutable drift is a conflict the caller must resolve by hand; every
/// other failure or abort is reported as an internal error. The body always
/// carries the full outcome so callers can tell what was applied.
fn outcome_response(outcome: &ReconciliationOutcome) -> HttpResponse {
    if outcome.is_success() {
        HttpResponse::Ok().json(outcome)
    } else if outcome.has_immutable_drift() {
        HttpResponse::Conflict().json(outcome)
    } else {
        HttpResponse::InternalServerError().json(outcome)
    }
}

#[utoipa::path(
    summary = "Provision an application stack",
    description = "Converges the secret, config, storage, workload and service of one application \
                   towards the requested state. Repeating a request is a no-op.",
    request_body = ProvisioningRequest,
    responses(
        (status = 200, description = "Every resource converged", body = ReconciliationOutcome),
        (status = 400, description = "Malformed request", body = ErrorMessage),
        (status = 409, description = "An immutable resource drifted", body = ReconciliationOutcome),
        (status = 500, description = "Some resources failed or the cluster was unreachable"),
    ),
    tag = "Provisioning",
)]
#[post("/provision")]
pub async fn provision(
    root_span: RootSpan,
    provisioner: Data<Provisioner>,
    shutdown: Data<ShutdownTx>,
    request: Json<ProvisioningRequest>,
) -> Result<HttpResponse, ProvisionError> {
    let request = request.into_inner();
    root_span.record("app_name", request.app_name.as_str());

    let outcome = provisioner.provision(&request, shutdown.subscribe()).await?;

    Ok(outcome_response(&outcome))
}

#[utoipa::path(
    summary = "Tear down an application stack",
    description = "Deletes every resource of an application, dependents first. Resources that are \
                   already gone are reported as absent.",
    params(
        ("app_name" = String, Path, description = "Name of the application to tear down"),
    ),
    responses(
        (status = 200, description = "Every resource deleted or already absent", body = TeardownOutcome),
        (status = 400, description = "Invalid application name", body = ErrorMessage),
        (status = 500, description = "Some resources could not be deleted"),
    ),
    tag = "Provisioning",
)]
#[delete("/provision/{app_name}")]
pub async fn teardown(
    root_span: RootSpan,
    provisioner: Data<Provisioner>,
    shutdown: Data<ShutdownTx>,
    app_name: Path<String>,
) -> Result<HttpResponse, ProvisionError> {
    let app_name = app_name.into_inner();
    root_span.record("app_name", app_name.as_str());

    let outcome = provisioner
        .teardown(&app_name, shutdown.subscribe())
        .await?;

    if outcome.is_success() {
        Ok(HttpResponse::Ok().json(outcome))
    } else {
        Ok(HttpResponse::InternalServerError().json(outcome))
    }
}
