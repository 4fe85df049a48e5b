use actix_web::{HttpResponse, Responder, get};

// Liveness only: says the process serves requests, not that the cluster or
// the database are reachable.
#[utoipa::path(
    summary = "Service liveness",
    description = "Returns 'ok' while the provisioning service is accepting requests. Cluster and \
                   database reachability are reported by /status and /health/{app_name}.",
    responses(
        (status = 200, description = "The service is alive; returns 'ok'.", body = String),
    ),
    tag = "Health",
)]
#[get("/health_check")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("ok")
}
