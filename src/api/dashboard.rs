use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::api::error_response;
use crate::config::Config;
use crate::core::summary::Aggregator;
use crate::error::AttendanceError;
use crate::model::schedule::WorkHours;
use crate::store::Store;
use crate::utils::time;

#[derive(Debug, Deserialize, IntoParams)]
pub struct DateQuery {
    /// Defaults to today in the configured timezone.
    #[param(example = "2025-03-10")]
    pub date: Option<NaiveDate>,
}

fn date_or_today(query: &DateQuery, config: &Config) -> NaiveDate {
    query
        .date
        .unwrap_or_else(|| time::now_local(config.timezone).date())
}

/// Daily attendance summary
#[utoipa::path(
    get,
    path = "/api/summary",
    params(DateQuery),
    responses(
        (status = 200, description = "Summary for the date", body = crate::core::summary::DailySummary),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn summary(
    query: web::Query<DateQuery>,
    aggregator: web::Data<Aggregator>,
    config: web::Data<Config>,
) -> impl Responder {
    let date = date_or_today(&query, &config);
    match aggregator.daily_summary(date).await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => error_response(&e),
    }
}

/// Per-employee rows for a date, absentees included
#[utoipa::path(
    get,
    path = "/api/report",
    params(DateQuery),
    responses(
        (status = 200, description = "Report rows", body = [crate::core::summary::ReportRow]),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn report(
    query: web::Query<DateQuery>,
    aggregator: web::Data<Aggregator>,
    config: web::Data<Config>,
) -> impl Responder {
    let date = date_or_today(&query, &config);
    match aggregator.all_employees_report(date).await {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(e) => error_response(&e),
    }
}

/// Employees overdue for check-in right now
#[utoipa::path(
    get,
    path = "/api/alerts/late",
    responses(
        (status = 200, description = "Overdue employees", body = [crate::core::summary::LateAlert]),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn late_alerts(
    aggregator: web::Data<Aggregator>,
    config: web::Data<Config>,
) -> impl Responder {
    match aggregator.late_alerts(time::now_local(config.timezone)).await {
        Ok(alerts) => HttpResponse::Ok().json(alerts),
        Err(e) => error_response(&e),
    }
}

/// Employees still on the clock past the cutoff
#[utoipa::path(
    get,
    path = "/api/alerts/missed-checkout",
    responses(
        (status = 200, description = "Missed checkouts", body = [crate::core::summary::MissedCheckout]),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn missed_checkouts(
    aggregator: web::Data<Aggregator>,
    config: web::Data<Config>,
) -> impl Responder {
    match aggregator
        .missed_checkouts(time::now_local(config.timezone))
        .await
    {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(e) => error_response(&e),
    }
}

/// Active employees
#[utoipa::path(
    get,
    path = "/api/employees",
    responses(
        (status = 200, description = "Active employees", body = [crate::model::employee::Employee]),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn list_employees(store: web::Data<std::sync::Arc<dyn Store>>) -> impl Responder {
    match store.active_employees().await {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(e) => error_response(&AttendanceError::from(e)),
    }
}

/// Soft-deactivate an employee
#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    params(("id" = i64, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Deactivated"),
        (status = 404, description = "No such employee"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn deactivate_employee(
    path: web::Path<i64>,
    store: web::Data<std::sync::Arc<dyn Store>>,
) -> impl Responder {
    match store.deactivate_employee(path.into_inner()).await {
        Ok(true) => HttpResponse::Ok().json(serde_json::json!({"message": "Employee deactivated"})),
        Ok(false) => HttpResponse::NotFound().json(serde_json::json!({"error": "No such employee"})),
        Err(e) => error_response(&AttendanceError::from(e)),
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// Number of most recent records, newest first. Defaults to 7.
    #[param(example = 7)]
    pub limit: Option<u32>,
}

/// Recent attendance records for one employee, newest first
#[utoipa::path(
    get,
    path = "/api/employees/{id}/history",
    params(("id" = i64, Path, description = "Employee id"), HistoryQuery),
    responses(
        (status = 200, description = "Attendance records", body = [crate::model::attendance::AttendanceRecord]),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn employee_history(
    path: web::Path<i64>,
    query: web::Query<HistoryQuery>,
    aggregator: web::Data<Aggregator>,
) -> impl Responder {
    let limit = query.limit.unwrap_or(7);
    match aggregator
        .employee_history(path.into_inner(), limit)
        .await
    {
        Ok(records) => HttpResponse::Ok().json(records),
        Err(e) => error_response(&e),
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetHoursReq {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = String, example = "10:00")]
    pub start: NaiveTime,
    #[schema(value_type = String, example = "18:00")]
    pub end: NaiveTime,
    pub reason: String,
}

/// Upsert exceptional working hours for an employee/date
#[utoipa::path(
    put,
    path = "/api/employees/{id}/hours",
    params(("id" = i64, Path, description = "Employee id")),
    request_body = SetHoursReq,
    responses(
        (status = 200, description = "Hours recorded"),
        (status = 400, description = "Invalid window"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn set_hours(
    path: web::Path<i64>,
    payload: web::Json<SetHoursReq>,
    store: web::Data<std::sync::Arc<dyn Store>>,
    config: web::Data<Config>,
) -> impl Responder {
    let payload = payload.into_inner();
    if payload.end <= payload.start {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({"error": "end must be after start"}));
    }

    // The dashboard operator already passed the bearer gate; created_by 0
    // marks entries made here rather than by a chat admin.
    let exception = crate::model::schedule::ExceptionalSchedule {
        employee_id: path.into_inner(),
        date: payload.date,
        hours: WorkHours::new(payload.start, payload.end),
        reason: payload.reason,
        created_by: 0,
        created_at: time::now_local(config.timezone),
    };
    match store.upsert_exception(exception).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({"message": "Hours recorded"})),
        Err(e) => error_response(&AttendanceError::from(e)),
    }
}

/// Chat admins
#[utoipa::path(
    get,
    path = "/api/admins",
    responses(
        (status = 200, description = "Admin ids", body = [i64]),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn list_admins(store: web::Data<std::sync::Arc<dyn Store>>) -> impl Responder {
    match store.admins().await {
        Ok(ids) => HttpResponse::Ok().json(ids),
        Err(e) => error_response(&AttendanceError::from(e)),
    }
}

/// Grant chat-admin privileges
#[utoipa::path(
    post,
    path = "/api/admins/{id}",
    params(("id" = i64, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Granted"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn grant_admin(
    path: web::Path<i64>,
    store: web::Data<std::sync::Arc<dyn Store>>,
) -> impl Responder {
    match store.add_admin(path.into_inner()).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({"message": "Admin granted"})),
        Err(e) => error_response(&AttendanceError::from(e)),
    }
}

/// Revoke chat-admin privileges (no minimum-admin floor)
#[utoipa::path(
    delete,
    path = "/api/admins/{id}",
    params(("id" = i64, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Revoked"),
        (status = 404, description = "Was not an admin"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn revoke_admin(
    path: web::Path<i64>,
    store: web::Data<std::sync::Arc<dyn Store>>,
) -> impl Responder {
    match store.remove_admin(path.into_inner()).await {
        Ok(true) => HttpResponse::Ok().json(serde_json::json!({"message": "Admin revoked"})),
        Ok(false) => HttpResponse::NotFound().json(serde_json::json!({"error": "Was not an admin"})),
        Err(e) => error_response(&AttendanceError::from(e)),
    }
}
