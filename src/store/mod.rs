pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::NaiveDate;
use derive_more::Display;

use crate::model::attendance::{AttendanceRecord, CheckEvent};
use crate::model::employee::{Employee, NewEmployee};
use crate::model::schedule::ExceptionalSchedule;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

#[derive(Debug, Display)]
pub enum StoreError {
    /// Conditional insert lost to an existing row for the same key.
    #[display(fmt = "duplicate key")]
    DuplicateKey,

    /// Conditional update matched no row.
    #[display(fmt = "row not found")]
    NotFound,

    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        // MySQL reports unique-key violations as SQLSTATE 23000.
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.code().as_deref() == Some("23000") {
                return StoreError::DuplicateKey;
            }
        }
        StoreError::Database(e)
    }
}

/// Persistence seam for the attendance engine. Implementations must make
/// `insert_check_in` an atomic conditional write keyed on (employee, date):
/// of two concurrent check-in attempts, exactly one succeeds.
#[async_trait]
pub trait Store: Send + Sync {
    // employees
    async fn upsert_employee(&self, employee: NewEmployee) -> Result<Employee, StoreError>;
    async fn employee(&self, employee_id: i64) -> Result<Option<Employee>, StoreError>;
    async fn active_employees(&self) -> Result<Vec<Employee>, StoreError>;
    async fn deactivate_employee(&self, employee_id: i64) -> Result<bool, StoreError>;

    // attendance
    async fn insert_check_in(&self, record: AttendanceRecord) -> Result<(), StoreError>;
    async fn attendance(
        &self,
        employee_id: i64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError>;
    /// Closes the open record for (employee, date). `NotFound` when there is
    /// no record still in `checked_in` state.
    async fn complete_check_out(
        &self,
        employee_id: i64,
        date: NaiveDate,
        check_out: CheckEvent,
        is_early: bool,
        reason: Option<String>,
    ) -> Result<AttendanceRecord, StoreError>;
    async fn attendance_for_date(&self, date: NaiveDate)
    -> Result<Vec<AttendanceRecord>, StoreError>;
    async fn attendance_history(
        &self,
        employee_id: i64,
        limit: u32,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;

    // exceptional schedules
    async fn upsert_exception(&self, exception: ExceptionalSchedule) -> Result<(), StoreError>;
    async fn exception(
        &self,
        employee_id: i64,
        date: NaiveDate,
    ) -> Result<Option<ExceptionalSchedule>, StoreError>;

    // admins
    async fn add_admin(&self, employee_id: i64) -> Result<(), StoreError>;
    async fn remove_admin(&self, employee_id: i64) -> Result<bool, StoreError>;
    async fn is_admin(&self, employee_id: i64) -> Result<bool, StoreError>;
    async fn admins(&self) -> Result<Vec<i64>, StoreError>;
}
