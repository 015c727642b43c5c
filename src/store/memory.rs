use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus, CheckEvent};
use crate::model::employee::{Employee, NewEmployee};
use crate::model::schedule::ExceptionalSchedule;
use crate::store::{Store, StoreError};

#[derive(Default)]
struct Tables {
    employees: HashMap<i64, Employee>,
    attendance: HashMap<(i64, NaiveDate), AttendanceRecord>,
    exceptions: HashMap<(i64, NaiveDate), ExceptionalSchedule>,
    admins: HashSet<i64>,
}

/// Single-instance in-process store. All tables live behind one async mutex,
/// so the conditional insert in `insert_check_in` is atomic: the entry check
/// and the write happen under the same lock.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert_employee(&self, employee: NewEmployee) -> Result<Employee, StoreError> {
        let mut tables = self.tables.lock().await;
        let created_at = tables
            .employees
            .get(&employee.employee_id)
            .map(|e| e.created_at)
            .unwrap_or_else(|| Utc::now().naive_utc());
        let row = Employee {
            employee_id: employee.employee_id,
            username: employee.username,
            first_name: employee.first_name,
            last_name: employee.last_name,
            phone: employee.phone,
            is_active: true,
            created_at,
        };
        tables.employees.insert(row.employee_id, row.clone());
        Ok(row)
    }

    async fn employee(&self, employee_id: i64) -> Result<Option<Employee>, StoreError> {
        Ok(self.tables.lock().await.employees.get(&employee_id).cloned())
    }

    async fn active_employees(&self) -> Result<Vec<Employee>, StoreError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<_> = tables
            .employees
            .values()
            .filter(|e| e.is_active)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.first_name.cmp(&b.first_name));
        Ok(rows)
    }

    async fn deactivate_employee(&self, employee_id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        match tables.employees.get_mut(&employee_id) {
            Some(e) => {
                e.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_check_in(&self, record: AttendanceRecord) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let key = (record.employee_id, record.date);
        if tables.attendance.contains_key(&key) {
            return Err(StoreError::DuplicateKey);
        }
        tables.attendance.insert(key, record);
        Ok(())
    }

    async fn attendance(
        &self,
        employee_id: i64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        Ok(self
            .tables
            .lock()
            .await
            .attendance
            .get(&(employee_id, date))
            .cloned())
    }

    async fn complete_check_out(
        &self,
        employee_id: i64,
        date: NaiveDate,
        check_out: CheckEvent,
        is_early: bool,
        reason: Option<String>,
    ) -> Result<AttendanceRecord, StoreError> {
        let mut tables = self.tables.lock().await;
        let record = tables
            .attendance
            .get_mut(&(employee_id, date))
            .filter(|r| r.status == AttendanceStatus::CheckedIn)
            .ok_or(StoreError::NotFound)?;
        record.check_out = Some(check_out);
        record.status = AttendanceStatus::CheckedOut;
        record.is_early_checkout = is_early;
        record.early_checkout_reason = reason;
        Ok(record.clone())
    }

    async fn attendance_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<_> = tables
            .attendance
            .values()
            .filter(|r| r.date == date)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.employee_id);
        Ok(rows)
    }

    async fn attendance_history(
        &self,
        employee_id: i64,
        limit: u32,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<_> = tables
            .attendance
            .values()
            .filter(|r| r.employee_id == employee_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| std::cmp::Reverse(r.date));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn upsert_exception(&self, exception: ExceptionalSchedule) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        tables
            .exceptions
            .insert((exception.employee_id, exception.date), exception);
        Ok(())
    }

    async fn exception(
        &self,
        employee_id: i64,
        date: NaiveDate,
    ) -> Result<Option<ExceptionalSchedule>, StoreError> {
        Ok(self
            .tables
            .lock()
            .await
            .exceptions
            .get(&(employee_id, date))
            .cloned())
    }

    async fn add_admin(&self, employee_id: i64) -> Result<(), StoreError> {
        self.tables.lock().await.admins.insert(employee_id);
        Ok(())
    }

    async fn remove_admin(&self, employee_id: i64) -> Result<bool, StoreError> {
        Ok(self.tables.lock().await.admins.remove(&employee_id))
    }

    async fn is_admin(&self, employee_id: i64) -> Result<bool, StoreError> {
        Ok(self.tables.lock().await.admins.contains(&employee_id))
    }

    async fn admins(&self) -> Result<Vec<i64>, StoreError> {
        let mut ids: Vec<_> = self.tables.lock().await.admins.iter().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
