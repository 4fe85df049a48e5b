use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;

/// One stored health probe result for an application.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct HealthRecord {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "orders-db")]
    pub app_name: String,
    pub healthy: bool,
    #[schema(example = "connection refused")]
    pub message: Option<String>,
    pub checked_at: DateTime<Utc>,
}

/// Reads every stored health record for `app_name`, newest first.
///
/// The pool scopes the connection; it is returned on every path, including
/// query failures.
pub async fn fetch_health_records(
    pool: &PgPool,
    app_name: &str,
) -> Result<Vec<HealthRecord>, sqlx::Error> {
    sqlx::query_as::<_, HealthRecord>(
        r#"
        select id, app_name, healthy, message, checked_at
        from health_status
        where app_name = $1
        order by checked_at desc
        "#,
    )
    .bind(app_name)
    .fetch_all(pool)
    .await
}
