use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod health;
pub mod health_check;
pub mod metrics;
pub mod provision;
pub mod status;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorMessage {
    #[schema(example = "an error occurred in the api")]
    pub error: String,
}
