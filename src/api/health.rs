use actix_web::{HttpResponse, Responder};
use serde_json::json;

use crate::utils::time;

/// Health check; also the target of the keep-alive self-ping.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = Object, example = json!({
        "status": "ok",
        "time": "2025-03-10T09:00:00"
    }))),
    tag = "Health"
)]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "time": time::utc_now(),
    }))
}
