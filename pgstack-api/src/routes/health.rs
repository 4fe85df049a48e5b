use actix_web::{
    HttpResponse, ResponseError, get,
    http::{StatusCode, header::ContentType},
    web::{Data, Path},
};
use sqlx::PgPool;
use thiserror::Error;
use tracing_actix_web::RootSpan;

use crate::db::health::{HealthRecord, fetch_health_records};
use crate::routes::ErrorMessage;

#[derive(Debug, Error)]
pub enum HealthError {
    /// The query succeeded but matched nothing; distinct from a database
    /// fault.
    #[error("no health records exist for application {0}")]
    HealthRecordsNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl HealthError {
    fn to_message(&self) -> String {
        match self {
            // Do not expose internal database details in error messages
            HealthError::Database(_) => "internal server error".to_string(),
            e => e.to_string(),
        }
    }
}

impl ResponseError for HealthError {
    fn status_code(&self) -> StatusCode {
        match self {
            HealthError::HealthRecordsNotFound(_) => StatusCode::NOT_FOUND,
            HealthError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_message = ErrorMessage {
            error: self.to_message(),
        };
        let body =
            serde_json::to_string(&error_message).expect("failed to serialize error message");
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(body)
    }
}

#[utoipa::path(
    summary = "Stored health records of one application",
    description = "Returns the persisted health probe results for an application, newest first.",
    params(
        ("app_name" = String, Path, description = "Name of the application to query"),
    ),
    responses(
        (status = 200, description = "Health records returned", body = [HealthRecord]),
        (status = 404, description = "No records for this application", body = ErrorMessage),
        (status = 500, description = "The database could not be queried", body = ErrorMessage),
    ),
    tag = "Health",
)]
#[get("/health/{app_name}")]
pub async fn health(
    root_span: RootSpan,
    pool: Data<PgPool>,
    app_name: Path<String>,
) -> Result<HttpResponse, HealthError> {
    let app_name = app_name.into_inner();
    root_span.record("app_name", app_name.as_str());

    let records = fetch_health_records(&pool, &app_name).await?;
    if records.is_empty() {
        return Err(HealthError::HealthRecordsNotFound(app_name));
    }

    Ok(HttpResponse::Ok().json(records))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_records_map_to_404() {
        let error = HealthError::HealthRecordsNotFound("orders".to_string());
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            error.to_message(),
            "no health records exist for application orders"
        );
    }

    #[test]
    fn database_faults_map_to_500_and_hide_details() {
        let error = HealthError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.to_message(), "internal server error");
    }
}
