use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::{info, warn};

use crate::auth::jwt::generate_access_token;
use crate::auth::password::verify_password;
use crate::config::Config;
use crate::models::{LoginReq, LoginResponse};

/// Dashboard login
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "Auth"
)]
pub async fn login(payload: web::Json<LoginReq>, config: web::Data<Config>) -> impl Responder {
    let ok = payload.username == config.dashboard_username
        && verify_password(&payload.password, &config.dashboard_password_hash);
    if !ok {
        warn!(username = %payload.username, "failed dashboard login");
        return HttpResponse::Unauthorized().json(json!({"error": "Invalid credentials"}));
    }

    match generate_access_token(&payload.username, &config.jwt_secret, config.access_token_ttl) {
        Ok(access_token) => {
            info!(username = %payload.username, "dashboard login");
            HttpResponse::Ok().json(LoginResponse { access_token })
        }
        Err(e) => {
            warn!(error = %e, "token generation failed");
            HttpResponse::InternalServerError().json(json!({"error": "Token generation failed"}))
        }
    }
}
