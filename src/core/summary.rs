use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use utoipa::ToSchema;

use crate::core::schedule::ScheduleResolver;
use crate::error::AttendanceError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::employee::Employee;
use crate::store::Store;

/// Name + time + optional reason, for the late/early detail lists.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReasonEntry {
    pub employee_id: i64,
    pub name: String,
    #[schema(value_type = String, format = "date-time")]
    pub time: NaiveDateTime,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DailySummary {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub total_employees: usize,
    pub checked_in: usize,
    pub checked_out: usize,
    pub still_working: usize,
    pub late: usize,
    pub early_checkout: usize,
    /// checked_in / total_employees * 100, one decimal place.
    pub attendance_rate: f64,
    pub late_arrivals: Vec<ReasonEntry>,
    pub early_departures: Vec<ReasonEntry>,
}

/// An active employee with no record for the day, past their effective start
/// plus the grace threshold. Computed at query time, never stored.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LateAlert {
    pub employee_id: i64,
    pub name: String,
    #[schema(value_type = String, example = "09:00")]
    pub expected_start: NaiveTime,
    pub minutes_overdue: i64,
}

/// Still checked in past the cutoff with no check-out.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MissedCheckout {
    pub employee_id: i64,
    pub name: String,
    #[schema(value_type = String, format = "date-time")]
    pub checked_in_at: NaiveDateTime,
    pub minutes_on_clock: i64,
}

/// One row of the all-employees daily report (absent employees included).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReportRow {
    pub employee_id: i64,
    pub name: String,
    pub username: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_in: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out: Option<NaiveDateTime>,
    pub status: Option<AttendanceStatus>,
    pub is_late: bool,
    pub is_early_checkout: bool,
}

fn name_of(employees: &[Employee], employee_id: i64) -> String {
    employees
        .iter()
        .find(|e| e.employee_id == employee_id)
        .map(Employee::display_name)
        .unwrap_or_else(|| employee_id.to_string())
}

/// Pure derivation of the daily summary from loaded rows. Never mutates
/// anything; the scheduler and the dashboard both call through this.
pub fn daily_summary(
    date: NaiveDate,
    employees: &[Employee],
    records: &[AttendanceRecord],
) -> DailySummary {
    let total_employees = employees.len();
    let checked_in = records.len();
    let checked_out = records
        .iter()
        .filter(|r| r.status == AttendanceStatus::CheckedOut)
        .count();
    let late: Vec<_> = records.iter().filter(|r| r.is_late).collect();
    let early: Vec<_> = records.iter().filter(|r| r.is_early_checkout).collect();

    let attendance_rate = if total_employees == 0 {
        0.0
    } else {
        (checked_in as f64 / total_employees as f64 * 1000.0).round() / 10.0
    };

    DailySummary {
        date,
        total_employees,
        checked_in,
        checked_out,
        still_working: checked_in - checked_out,
        late: late.len(),
        early_checkout: early.len(),
        attendance_rate,
        late_arrivals: late
            .iter()
            .map(|r| ReasonEntry {
                employee_id: r.employee_id,
                name: name_of(employees, r.employee_id),
                time: r.check_in.time,
                reason: r.late_reason.clone(),
            })
            .collect(),
        early_departures: early
            .iter()
            .filter_map(|r| {
                r.check_out.map(|out| ReasonEntry {
                    employee_id: r.employee_id,
                    name: name_of(employees, r.employee_id),
                    time: out.time,
                    reason: r.early_checkout_reason.clone(),
                })
            })
            .collect(),
    }
}

/// Read-only reporting facade over the store. Loads rows, then derives
/// through the pure functions above.
#[derive(Clone)]
pub struct Aggregator {
    store: Arc<dyn Store>,
    resolver: ScheduleResolver,
    grace: chrono::Duration,
    checkout_cutoff: NaiveTime,
}

impl Aggregator {
    pub fn new(
        store: Arc<dyn Store>,
        resolver: ScheduleResolver,
        grace: chrono::Duration,
        checkout_cutoff: NaiveTime,
    ) -> Self {
        Self {
            store,
            resolver,
            grace,
            checkout_cutoff,
        }
    }

    pub async fn daily_summary(&self, date: NaiveDate) -> Result<DailySummary, AttendanceError> {
        let employees = self.store.active_employees().await?;
        let records = self.store.attendance_for_date(date).await?;
        Ok(daily_summary(date, &employees, &records))
    }

    /// Late-arrival candidates as of `now`: active employees who have not
    /// checked in and whose effective start + grace has already passed.
    pub async fn late_alerts(&self, now: NaiveDateTime) -> Result<Vec<LateAlert>, AttendanceError> {
        let employees = self.store.active_employees().await?;
        let records = self.store.attendance_for_date(now.date()).await?;

        let mut alerts = Vec::new();
        for employee in &employees {
            if records.iter().any(|r| r.employee_id == employee.employee_id) {
                continue;
            }
            let hours = self.resolver.effective(employee.employee_id, now.date()).await?;
            let deadline = now.date().and_time(hours.start) + self.grace;
            if now > deadline {
                alerts.push(LateAlert {
                    employee_id: employee.employee_id,
                    name: employee.display_name(),
                    expected_start: hours.start,
                    minutes_overdue: (now - deadline).num_minutes(),
                });
            }
        }
        Ok(alerts)
    }

    /// Employees still on the clock past the configured cutoff.
    pub async fn missed_checkouts(
        &self,
        now: NaiveDateTime,
    ) -> Result<Vec<MissedCheckout>, AttendanceError> {
        if now.time() < self.checkout_cutoff {
            return Ok(Vec::new());
        }
        let employees = self.store.active_employees().await?;
        let records = self.store.attendance_for_date(now.date()).await?;

        Ok(records
            .iter()
            .filter(|r| r.status == AttendanceStatus::CheckedIn)
            .map(|r| MissedCheckout {
                employee_id: r.employee_id,
                name: name_of(&employees, r.employee_id),
                checked_in_at: r.check_in.time,
                minutes_on_clock: r.worked_minutes(now),
            })
            .collect())
    }

    /// One row per active employee for the date, absentees included.
    pub async fn all_employees_report(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<ReportRow>, AttendanceError> {
        let employees = self.store.active_employees().await?;
        let records = self.store.attendance_for_date(date).await?;

        Ok(employees
            .iter()
            .map(|e| {
                let record = records.iter().find(|r| r.employee_id == e.employee_id);
                ReportRow {
                    employee_id: e.employee_id,
                    name: e.display_name(),
                    username: e.username.clone(),
                    check_in: record.map(|r| r.check_in.time),
                    check_out: record.and_then(|r| r.check_out.map(|c| c.time)),
                    status: record.map(|r| r.status),
                    is_late: record.map(|r| r.is_late).unwrap_or(false),
                    is_early_checkout: record.map(|r| r.is_early_checkout).unwrap_or(false),
                }
            })
            .collect())
    }

    /// Recent records for one employee, newest first.
    pub async fn employee_history(
        &self,
        employee_id: i64,
        limit: u32,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        Ok(self.store.attendance_history(employee_id, limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::model::attendance::CheckEvent;
    use crate::model::employee::NewEmployee;
    use crate::model::schedule::WorkHours;
    use crate::store::MemoryStore;

    fn hours(start: &str, end: &str) -> WorkHours {
        WorkHours::new(
            NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
            NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
        )
    }

    fn event(date: NaiveDate, h: u32, m: u32) -> CheckEvent {
        CheckEvent {
            time: date.and_hms_opt(h, m, 0).unwrap(),
            latitude: 31.0417,
            longitude: 31.3778,
            distance_m: 20.0,
        }
    }

    async fn seeded() -> (Arc<MemoryStore>, Aggregator, NaiveDate) {
        let store = Arc::new(MemoryStore::new());
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

        for id in 1..=10 {
            store
                .upsert_employee(NewEmployee {
                    employee_id: id,
                    username: None,
                    first_name: format!("Emp{id}"),
                    last_name: None,
                    phone: None,
                })
                .await
                .unwrap();
        }
        // 8 check-ins, 2 of them late
        for id in 1..=8 {
            let late = id <= 2;
            let check_in = event(date, if late { 9 } else { 8 }, 45);
            let created_at = check_in.time;
            let mut record = AttendanceRecord::open(
                id,
                check_in,
                late,
                late.then(|| "traffic".to_string()),
                created_at,
            );
            if id <= 3 {
                // three full days, one of them early
                record.check_out = Some(event(date, if id == 3 { 15 } else { 17 }, 5));
                record.status = AttendanceStatus::CheckedOut;
                if id == 3 {
                    record.is_early_checkout = true;
                    record.early_checkout_reason = Some("errand".into());
                }
            }
            store.insert_check_in(record).await.unwrap();
        }

        let resolver = ScheduleResolver::new(store.clone(), hours("09:00", "17:00"));
        let aggregator = Aggregator::new(
            store.clone(),
            resolver,
            chrono::Duration::minutes(30),
            NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
        );
        (store, aggregator, date)
    }

    #[tokio::test]
    async fn summary_counts_and_rate() {
        let (_, aggregator, date) = seeded().await;
        let summary = aggregator.daily_summary(date).await.unwrap();

        assert_eq!(summary.total_employees, 10);
        assert_eq!(summary.checked_in, 8);
        assert_eq!(summary.checked_out, 3);
        assert_eq!(summary.still_working, 5);
        assert_eq!(summary.late, 2);
        assert_eq!(summary.early_checkout, 1);
        assert_eq!(summary.attendance_rate, 80.0);
        assert_eq!(summary.late_arrivals.len(), 2);
        assert_eq!(summary.late_arrivals[0].reason.as_deref(), Some("traffic"));
    }

    #[tokio::test]
    async fn summary_of_empty_day() {
        let store = Arc::new(MemoryStore::new());
        let resolver = ScheduleResolver::new(store.clone(), hours("09:00", "17:00"));
        let aggregator = Aggregator::new(
            store,
            resolver,
            chrono::Duration::minutes(30),
            NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
        );
        let summary = aggregator
            .daily_summary(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap())
            .await
            .unwrap();
        assert_eq!(summary.attendance_rate, 0.0);
        assert_eq!(summary.total_employees, 0);
    }

    #[tokio::test]
    async fn late_alerts_cover_absentees_past_grace() {
        let (_, aggregator, date) = seeded().await;

        // 09:45, grace 30min past an 09:00 start: employees 9 and 10 qualify.
        let alerts = aggregator
            .late_alerts(date.and_hms_opt(9, 45, 0).unwrap())
            .await
            .unwrap();
        let mut ids: Vec<_> = alerts.iter().map(|a| a.employee_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![9, 10]);
        assert_eq!(alerts[0].minutes_overdue, 15);

        // Before the grace deadline nobody is flagged.
        let alerts = aggregator
            .late_alerts(date.and_hms_opt(9, 20, 0).unwrap())
            .await
            .unwrap();
        assert!(alerts.is_empty());
    }

    #[tokio::test]
    async fn exceptional_hours_suppress_late_alert() {
        let (store, aggregator, date) = seeded().await;
        store.add_admin(1).await.unwrap();
        store
            .upsert_exception(crate::model::schedule::ExceptionalSchedule {
                employee_id: 9,
                date,
                hours: hours("11:00", "19:00"),
                reason: "late shift".into(),
                created_by: 1,
                created_at: Utc::now().naive_utc(),
            })
            .await
            .unwrap();

        let alerts = aggregator
            .late_alerts(date.and_hms_opt(9, 45, 0).unwrap())
            .await
            .unwrap();
        let ids: Vec<_> = alerts.iter().map(|a| a.employee_id).collect();
        assert_eq!(ids, vec![10]);
    }

    #[tokio::test]
    async fn missed_checkouts_only_after_cutoff() {
        let (_, aggregator, date) = seeded().await;

        let before = aggregator
            .missed_checkouts(date.and_hms_opt(18, 0, 0).unwrap())
            .await
            .unwrap();
        assert!(before.is_empty());

        let after = aggregator
            .missed_checkouts(date.and_hms_opt(20, 30, 0).unwrap())
            .await
            .unwrap();
        // employees 4..=8 never checked out
        assert_eq!(after.len(), 5);
        assert!(after.iter().all(|m| m.minutes_on_clock > 0));
    }

    #[tokio::test]
    async fn report_includes_absent_employees() {
        let (_, aggregator, date) = seeded().await;
        let rows = aggregator.all_employees_report(date).await.unwrap();
        assert_eq!(rows.len(), 10);
        let absent: Vec<_> = rows.iter().filter(|r| r.status.is_none()).collect();
        assert_eq!(absent.len(), 2);
    }
}
