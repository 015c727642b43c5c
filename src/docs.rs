use crate::api::bot::InboundEvent;
use crate::api::dashboard::SetHoursReq;
use crate::bot::event::{BotEvent, BotReply};
use crate::core::summary::{
    DailySummary, LateAlert, MissedCheckout, ReasonEntry, ReportRow,
};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, CheckEvent};
use crate::model::employee::Employee;
use crate::model::schedule::{ExceptionalSchedule, WorkHours};
use crate::models::{LoginReq, LoginResponse};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Geofenced Attendance Bot API",
        version = "1.0.0",
        description = r#"
## Geofenced Attendance System

Chat-first attendance tracking: employees check in and out by sharing
their live location, and the service accepts the event only when they
are physically within the office geofence.

### 🔹 Key Features
- **Location-verified check-in / check-out**
  - Haversine distance against the configured office circle
- **Schedules**
  - Default working hours with per-employee, per-date overrides
- **Late & early-leave reasons**
  - Chat follow-up collects a reason before the record is written
- **Admin dashboard**
  - Daily summary, late alerts, missed-checkout alerts, full report

### 🔐 Security
Dashboard endpoints are protected with **JWT Bearer authentication**.
The bot webhook and login endpoints are rate limited per client IP.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::health::health,
        crate::auth::handlers::login,
        crate::api::bot::bot_event,

        crate::api::dashboard::summary,
        crate::api::dashboard::report,
        crate::api::dashboard::late_alerts,
        crate::api::dashboard::missed_checkouts,
        crate::api::dashboard::list_employees,
        crate::api::dashboard::deactivate_employee,
        crate::api::dashboard::set_hours,
        crate::api::dashboard::employee_history,
        crate::api::dashboard::list_admins,
        crate::api::dashboard::grant_admin,
        crate::api::dashboard::revoke_admin,
    ),
    components(
        schemas(
            LoginReq,
            LoginResponse,
            InboundEvent,
            BotEvent,
            BotReply,
            Employee,
            AttendanceRecord,
            AttendanceStatus,
            CheckEvent,
            WorkHours,
            ExceptionalSchedule,
            SetHoursReq,
            DailySummary,
            ReasonEntry,
            LateAlert,
            MissedCheckout,
            ReportRow,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness probe"),
        (name = "Auth", description = "Dashboard authentication"),
        (name = "Bot", description = "Chat webhook"),
        (name = "Dashboard", description = "Admin dashboard APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
