use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::core::geofence::Coordinate;

/// Per-day attendance lifecycle. `CheckedOut` is terminal for the day.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    CheckedIn,
    CheckedOut,
}

/// A single accepted geofenced event: when, where, and how far from the office.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct CheckEvent {
    #[schema(value_type = String, format = "date-time")]
    pub time: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    /// Distance from the office center in meters, always within the radius.
    pub distance_m: f64,
}

impl CheckEvent {
    pub fn new(time: NaiveDateTime, point: Coordinate, distance_m: f64) -> Self {
        Self {
            time,
            latitude: point.latitude,
            longitude: point.longitude,
            distance_m,
        }
    }
}

/// One row per (employee, date); the unique pair is enforced by the store.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttendanceRecord {
    pub employee_id: i64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub check_in: CheckEvent,
    pub check_out: Option<CheckEvent>,
    pub status: AttendanceStatus,
    pub is_late: bool,
    pub late_reason: Option<String>,
    pub is_early_checkout: bool,
    pub early_checkout_reason: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

impl AttendanceRecord {
    /// `created_at` is when the row is written, which for a late check-in is
    /// later than the check-in event itself.
    pub fn open(
        employee_id: i64,
        check_in: CheckEvent,
        is_late: bool,
        late_reason: Option<String>,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            employee_id,
            date: check_in.time.date(),
            check_in,
            check_out: None,
            status: AttendanceStatus::CheckedIn,
            is_late,
            late_reason,
            is_early_checkout: false,
            early_checkout_reason: None,
            created_at,
        }
    }

    /// Minutes on the clock, up to `until` for a still-open record.
    pub fn worked_minutes(&self, until: NaiveDateTime) -> i64 {
        let end = self.check_out.map(|c| c.time).unwrap_or(until);
        (end - self.check_in.time).num_minutes().max(0)
    }
}
