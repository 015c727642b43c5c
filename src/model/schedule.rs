use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Expected working window for one employee on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WorkHours {
    #[schema(value_type = String, example = "09:00")]
    pub start: NaiveTime,
    #[schema(value_type = String, example = "17:00")]
    pub end: NaiveTime,
}

impl WorkHours {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }
}

/// Admin-created override of the default hours for a single (employee, date).
/// At most one per pair; upserts are last-writer-wins.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExceptionalSchedule {
    pub employee_id: i64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub hours: WorkHours,
    #[schema(example = "client visit, starts on site at 10:00")]
    pub reason: String,
    pub created_by: i64,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}
