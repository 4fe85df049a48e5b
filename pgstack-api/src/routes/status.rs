use actix_web::{
    HttpResponse, ResponseError, get,
    http::{StatusCode, header::ContentType},
    web::{Data, Path},
};
use pgstack::provisioner::Provisioner;
use pgstack::status::{AppStatus, StatusError};
use thiserror::Error;
use tracing_actix_web::RootSpan;

use crate::routes::ErrorMessage;

#[derive(Debug, Error)]
pub enum StatusQueryError {
    #[error(transparent)]
    Status(#[from] StatusError),
}

impl ResponseError for StatusQueryError {
    fn status_code(&self) -> StatusCode {
        match self {
            StatusQueryError::Status(StatusError::NotFound(_)) => StatusCode::NOT_FOUND,
            StatusQueryError::Status(StatusError::Gateway(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
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

#[utoipa::path(
    summary = "Status of every managed application",
    description = "Projects the live state of every application this service provisioned.",
    responses(
        (status = 200, description = "Live summaries returned", body = [AppStatus]),
        (status = 500, description = "The cluster could not be queried", body = ErrorMessage),
    ),
    tag = "Status",
)]
#[get("/status")]
pub async fn status_all(
    provisioner: Data<Provisioner>,
) -> Result<HttpResponse, StatusQueryError> {
    let statuses = provisioner.status_all().await?;

    Ok(HttpResponse::Ok().json(statuses))
}

#[utoipa::path(
    summary = "Status of one application",
    description = "Projects the live workload state and member instances of one application.",
    params(
        ("app_name" = String, Path, description = "Name of the application to inspect"),
    ),
    responses(
        (status = 200, description = "Live summary returned", body = AppStatus),
        (status = 404, description = "No such application", body = ErrorMessage),
        (status = 500, description = "The cluster could not be queried", body = ErrorMessage),
    ),
    tag = "Status",
)]
#[get("/status/{app_name}")]
pub async fn status(
    root_span: RootSpan,
    provisioner: Data<Provisioner>,
    app_name: Path<String>,
) -> Result<HttpResponse, StatusQueryError> {
    let app_name = app_name.into_inner();
    root_span.record("app_name", app_name.as_str());

    let status = provisioner.status(&app_name).await?;

    Ok(HttpResponse::Ok().json(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgstack::gateway::GatewayError;

    #[test]
    fn unknown_applications_map_to_404() {
        let error = StatusQueryError::Status(StatusError::NotFound("nonexistent".to_string()));
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn gateway_faults_map_to_500() {
        let error = StatusQueryError::Status(StatusError::Gateway(GatewayError::Transient(
            "timeout".to_string(),
        )));
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
