use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::MySqlPool;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus, CheckEvent};
use crate::model::employee::{Employee, NewEmployee};
use crate::model::schedule::{ExceptionalSchedule, WorkHours};
use crate::store::{Store, StoreError};

/// MySQL-backed store. The unique key over (employee_id, date) is what makes
/// `insert_check_in` safe under concurrency: the duplicate-key rejection from
/// the database is mapped to `StoreError::DuplicateKey`.
pub struct MySqlStore {
    pool: MySqlPool,
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS employees (
        employee_id BIGINT PRIMARY KEY,
        username VARCHAR(64) NULL,
        first_name VARCHAR(128) NOT NULL,
        last_name VARCHAR(128) NULL,
        phone VARCHAR(32) NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS attendance (
        employee_id BIGINT NOT NULL,
        date DATE NOT NULL,
        check_in_time DATETIME NOT NULL,
        check_in_latitude DOUBLE NOT NULL,
        check_in_longitude DOUBLE NOT NULL,
        check_in_distance_m DOUBLE NOT NULL,
        check_out_time DATETIME NULL,
        check_out_latitude DOUBLE NULL,
        check_out_longitude DOUBLE NULL,
        check_out_distance_m DOUBLE NULL,
        status VARCHAR(16) NOT NULL DEFAULT 'checked_in',
        is_late BOOLEAN NOT NULL DEFAULT FALSE,
        late_reason TEXT NULL,
        is_early_checkout BOOLEAN NOT NULL DEFAULT FALSE,
        early_checkout_reason TEXT NULL,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY (employee_id, date)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS exceptional_hours (
        employee_id BIGINT NOT NULL,
        date DATE NOT NULL,
        work_start TIME NOT NULL,
        work_end TIME NOT NULL,
        reason TEXT NOT NULL,
        created_by BIGINT NOT NULL,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY (employee_id, date)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS admins (
        employee_id BIGINT PRIMARY KEY,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
];

#[derive(sqlx::FromRow)]
struct EmployeeRow {
    employee_id: i64,
    username: Option<String>,
    first_name: String,
    last_name: Option<String>,
    phone: Option<String>,
    is_active: bool,
    created_at: NaiveDateTime,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Employee {
            employee_id: row.employee_id,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AttendanceRow {
    employee_id: i64,
    date: NaiveDate,
    check_in_time: NaiveDateTime,
    check_in_latitude: f64,
    check_in_longitude: f64,
    check_in_distance_m: f64,
    check_out_time: Option<NaiveDateTime>,
    check_out_latitude: Option<f64>,
    check_out_longitude: Option<f64>,
    check_out_distance_m: Option<f64>,
    status: String,
    is_late: bool,
    late_reason: Option<String>,
    is_early_checkout: bool,
    early_checkout_reason: Option<String>,
    created_at: NaiveDateTime,
}

impl From<AttendanceRow> for AttendanceRecord {
    fn from(row: AttendanceRow) -> Self {
        let check_out = match (
            row.check_out_time,
            row.check_out_latitude,
            row.check_out_longitude,
            row.check_out_distance_m,
        ) {
            (Some(time), Some(latitude), Some(longitude), Some(distance_m)) => Some(CheckEvent {
                time,
                latitude,
                longitude,
                distance_m,
            }),
            _ => None,
        };
        let status = row.status.parse().unwrap_or(if check_out.is_some() {
            AttendanceStatus::CheckedOut
        } else {
            AttendanceStatus::CheckedIn
        });
        AttendanceRecord {
            employee_id: row.employee_id,
            date: row.date,
            check_in: CheckEvent {
                time: row.check_in_time,
                latitude: row.check_in_latitude,
                longitude: row.check_in_longitude,
                distance_m: row.check_in_distance_m,
            },
            check_out,
            status,
            is_late: row.is_late,
            late_reason: row.late_reason,
            is_early_checkout: row.is_early_checkout,
            early_checkout_reason: row.early_checkout_reason,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ExceptionRow {
    employee_id: i64,
    date: NaiveDate,
    work_start: NaiveTime,
    work_end: NaiveTime,
    reason: String,
    created_by: i64,
    created_at: NaiveDateTime,
}

impl From<ExceptionRow> for ExceptionalSchedule {
    fn from(row: ExceptionRow) -> Self {
        ExceptionalSchedule {
            employee_id: row.employee_id,
            date: row.date,
            hours: WorkHours::new(row.work_start, row.work_end),
            reason: row.reason,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates missing tables on startup, the same shape the bot has always
    /// used, with the (employee_id, date) primary keys the engine relies on.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MySqlStore {
    async fn upsert_employee(&self, employee: NewEmployee) -> Result<Employee, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO employees (employee_id, username, first_name, last_name, phone, is_active)
            VALUES (?, ?, ?, ?, ?, TRUE)
            ON DUPLICATE KEY UPDATE
                username = VALUES(username),
                first_name = VALUES(first_name),
                last_name = VALUES(last_name),
                phone = VALUES(phone),
                is_active = TRUE
            "#,
        )
        .bind(employee.employee_id)
        .bind(&employee.username)
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(&employee.phone)
        .execute(&self.pool)
        .await?;

        let row = self
            .employee(employee.employee_id)
            .await?
            .ok_or(StoreError::NotFound)?;
        Ok(row)
    }

    async fn employee(&self, employee_id: i64) -> Result<Option<Employee>, StoreError> {
        let row = sqlx::query_as::<_, EmployeeRow>(
            "SELECT * FROM employees WHERE employee_id = ?",
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Employee::from))
    }

    async fn active_employees(&self) -> Result<Vec<Employee>, StoreError> {
        let rows = sqlx::query_as::<_, EmployeeRow>(
            "SELECT * FROM employees WHERE is_active = TRUE ORDER BY first_name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Employee::from).collect())
    }

    async fn deactivate_employee(&self, employee_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE employees SET is_active = FALSE WHERE employee_id = ?")
            .bind(employee_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_check_in(&self, record: AttendanceRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO attendance
                (employee_id, date, check_in_time, check_in_latitude, check_in_longitude,
                 check_in_distance_m, status, is_late, late_reason, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.employee_id)
        .bind(record.date)
        .bind(record.check_in.time)
        .bind(record.check_in.latitude)
        .bind(record.check_in.longitude)
        .bind(record.check_in.distance_m)
        .bind(record.status.to_string())
        .bind(record.is_late)
        .bind(&record.late_reason)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn attendance(
        &self,
        employee_id: i64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let row = sqlx::query_as::<_, AttendanceRow>(
            "SELECT * FROM attendance WHERE employee_id = ? AND date = ?",
        )
        .bind(employee_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(AttendanceRecord::from))
    }

    async fn complete_check_out(
        &self,
        employee_id: i64,
        date: NaiveDate,
        check_out: CheckEvent,
        is_early: bool,
        reason: Option<String>,
    ) -> Result<AttendanceRecord, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out_time = ?, check_out_latitude = ?, check_out_longitude = ?,
                check_out_distance_m = ?, status = 'checked_out',
                is_early_checkout = ?, early_checkout_reason = ?
            WHERE employee_id = ? AND date = ? AND status = 'checked_in'
            "#,
        )
        .bind(check_out.time)
        .bind(check_out.latitude)
        .bind(check_out.longitude)
        .bind(check_out.distance_m)
        .bind(is_early)
        .bind(&reason)
        .bind(employee_id)
        .bind(date)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        self.attendance(employee_id, date)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn attendance_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let rows = sqlx::query_as::<_, AttendanceRow>(
            "SELECT * FROM attendance WHERE date = ? ORDER BY employee_id",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(AttendanceRecord::from).collect())
    }

    async fn attendance_history(
        &self,
        employee_id: i64,
        limit: u32,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let rows = sqlx::query_as::<_, AttendanceRow>(
            "SELECT * FROM attendance WHERE employee_id = ? ORDER BY date DESC LIMIT ?",
        )
        .bind(employee_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(AttendanceRecord::from).collect())
    }

    async fn upsert_exception(&self, exception: ExceptionalSchedule) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO exceptional_hours
                (employee_id, date, work_start, work_end, reason, created_by, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                work_start = VALUES(work_start),
                work_end = VALUES(work_end),
                reason = VALUES(reason),
                created_by = VALUES(created_by),
                created_at = VALUES(created_at)
            "#,
        )
        .bind(exception.employee_id)
        .bind(exception.date)
        .bind(exception.hours.start)
        .bind(exception.hours.end)
        .bind(&exception.reason)
        .bind(exception.created_by)
        .bind(exception.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn exception(
        &self,
        employee_id: i64,
        date: NaiveDate,
    ) -> Result<Option<ExceptionalSchedule>, StoreError> {
        let row = sqlx::query_as::<_, ExceptionRow>(
            "SELECT * FROM exceptional_hours WHERE employee_id = ? AND date = ?",
        )
        .bind(employee_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ExceptionalSchedule::from))
    }

    async fn add_admin(&self, employee_id: i64) -> Result<(), StoreError> {
        sqlx::query("INSERT IGNORE INTO admins (employee_id) VALUES (?)")
            .bind(employee_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove_admin(&self, employee_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM admins WHERE employee_id = ?")
            .bind(employee_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn is_admin(&self, employee_id: i64) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM admins WHERE employee_id = ? LIMIT 1)",
        )
        .bind(employee_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn admins(&self) -> Result<Vec<i64>, StoreError> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT employee_id FROM admins ORDER BY employee_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }
}
