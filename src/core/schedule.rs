use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::info;

use crate::error::AttendanceError;
use crate::model::schedule::{ExceptionalSchedule, WorkHours};
use crate::store::Store;

/// Resolves the working window that applies to an employee on a date:
/// the exact (employee, date) override when one exists, the global default
/// otherwise. Each date resolves independently; nothing carries over.
#[derive(Clone)]
pub struct ScheduleResolver {
    store: Arc<dyn Store>,
    default_hours: WorkHours,
}

impl ScheduleResolver {
    pub fn new(store: Arc<dyn Store>, default_hours: WorkHours) -> Self {
        Self {
            store,
            default_hours,
        }
    }

    pub fn default_hours(&self) -> WorkHours {
        self.default_hours
    }

    pub async fn effective(
        &self,
        employee_id: i64,
        date: NaiveDate,
    ) -> Result<WorkHours, AttendanceError> {
        let exception = self.store.exception(employee_id, date).await?;
        Ok(exception.map(|e| e.hours).unwrap_or(self.default_hours))
    }

    /// Admin-only upsert of exceptional hours; last writer wins.
    pub async fn set_exception(
        &self,
        acting_admin: i64,
        employee_id: i64,
        date: NaiveDate,
        hours: WorkHours,
        reason: String,
        now: NaiveDateTime,
    ) -> Result<(), AttendanceError> {
        if !self.store.is_admin(acting_admin).await? {
            return Err(AttendanceError::UnauthorizedAdminAction);
        }

        self.store
            .upsert_exception(ExceptionalSchedule {
                employee_id,
                date,
                hours,
                reason,
                created_by: acting_admin,
                created_at: now,
            })
            .await?;
        info!(employee_id, %date, admin = acting_admin, "exceptional hours set");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveTime, Utc};

    use super::*;
    use crate::store::MemoryStore;

    fn hours(start: &str, end: &str) -> WorkHours {
        WorkHours::new(
            NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
            NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
        )
    }

    fn resolver() -> (Arc<MemoryStore>, ScheduleResolver) {
        let store = Arc::new(MemoryStore::new());
        let resolver = ScheduleResolver::new(store.clone(), hours("09:00", "17:00"));
        (store, resolver)
    }

    #[tokio::test]
    async fn falls_back_to_default_hours() {
        let (_, resolver) = resolver();
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(resolver.effective(7, date).await.unwrap(), hours("09:00", "17:00"));
    }

    #[tokio::test]
    async fn override_applies_to_its_date_only() {
        let (store, resolver) = resolver();
        store.add_admin(1).await.unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

        resolver
            .set_exception(1, 7, date, hours("10:00", "18:00"), "site visit".into(), Utc::now().naive_utc())
            .await
            .unwrap();

        assert_eq!(resolver.effective(7, date).await.unwrap(), hours("10:00", "18:00"));
        assert_eq!(
            resolver.effective(7, date.succ_opt().unwrap()).await.unwrap(),
            hours("09:00", "17:00")
        );
        // scoped to the employee as well
        assert_eq!(resolver.effective(8, date).await.unwrap(), hours("09:00", "17:00"));
    }

    #[tokio::test]
    async fn non_admin_cannot_set_exception() {
        let (_, resolver) = resolver();
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let err = resolver
            .set_exception(99, 7, date, hours("10:00", "18:00"), "x".into(), Utc::now().naive_utc())
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::UnauthorizedAdminAction));
    }
}
