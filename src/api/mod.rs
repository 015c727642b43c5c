pub mod bot;
pub mod dashboard;
pub mod health;

use actix_web::HttpResponse;
use serde_json::json;

use crate::error::AttendanceError;

/// One place that decides how engine rejections map onto HTTP.
pub fn error_response(err: &AttendanceError) -> HttpResponse {
    let body = json!({ "error": err.code(), "message": err.to_string() });
    match err {
        AttendanceError::Store(_) => {
            tracing::error!(error = %err, "store failure");
            HttpResponse::InternalServerError().json(json!({ "error": "store_failure" }))
        }
        AttendanceError::UnauthorizedAdminAction => HttpResponse::Forbidden().json(body),
        AttendanceError::DuplicateCheckIn => HttpResponse::Conflict().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}
