use std::sync::Arc;

use chrono::{Duration, NaiveDateTime, NaiveTime};
use tracing::{debug, info};

use crate::core::conversation::{ConversationTracker, PendingEvent, PendingFlow};
use crate::core::geofence::{self, Coordinate};
use crate::core::schedule::ScheduleResolver;
use crate::error::AttendanceError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, CheckEvent};
use crate::store::{Store, StoreError};

/// What an accepted check-in/check-out attempt produced: either a finalized
/// record, or a pending sub-state that needs a reason before anything is
/// written.
#[derive(Debug)]
pub enum CheckOutcome {
    CheckedIn(AttendanceRecord),
    CheckedOut(AttendanceRecord),
    LateReasonRequired {
        expected_start: NaiveTime,
        /// Description of a previously pending flow this attempt replaced.
        replaced: Option<&'static str>,
    },
    EarlyCheckoutReasonRequired {
        expected_end: NaiveTime,
        replaced: Option<&'static str>,
    },
}

/// The attendance state machine. Per (employee, date):
/// `Absent -> CheckedIn -> CheckedOut`, checked-out terminal for the day.
/// Every attempt is geofenced first; late arrivals and early departures pass
/// through a pending-reason sub-state held by the conversation tracker.
pub struct AttendanceEngine {
    store: Arc<dyn Store>,
    tracker: ConversationTracker,
    resolver: ScheduleResolver,
    office: Coordinate,
    radius_m: f64,
    /// Check-out timestamps may precede the stored check-in by up to this
    /// much before the attempt is rejected as out of order.
    skew_tolerance: Duration,
}

impl AttendanceEngine {
    pub fn new(
        store: Arc<dyn Store>,
        tracker: ConversationTracker,
        resolver: ScheduleResolver,
        office: Coordinate,
        radius_m: f64,
        skew_tolerance: Duration,
    ) -> Self {
        Self {
            store,
            tracker,
            resolver,
            office,
            radius_m,
            skew_tolerance,
        }
    }

    pub fn resolver(&self) -> &ScheduleResolver {
        &self.resolver
    }

    async fn geofence(&self, point: Coordinate) -> Result<f64, AttendanceError> {
        let check = geofence::validate(point, self.office, self.radius_m)?;
        if !check.accepted {
            return Err(AttendanceError::OutOfRange {
                distance_m: check.distance_m,
                radius_m: self.radius_m,
            });
        }
        Ok(check.distance_m)
    }

    async fn require_active(&self, employee_id: i64) -> Result<(), AttendanceError> {
        match self.store.employee(employee_id).await? {
            Some(e) if e.is_active => Ok(()),
            _ => Err(AttendanceError::UnknownEmployee(employee_id)),
        }
    }

    /// `Absent -> CheckedIn`, or into the awaiting-late-reason sub-state.
    pub async fn check_in(
        &self,
        employee_id: i64,
        at: NaiveDateTime,
        point: Coordinate,
    ) -> Result<CheckOutcome, AttendanceError> {
        let distance_m = self.geofence(point).await?;
        self.require_active(employee_id).await?;

        // One record per day, and checked-out is terminal: any existing row
        // rejects the attempt.
        if self.store.attendance(employee_id, at.date()).await?.is_some() {
            return Err(AttendanceError::DuplicateCheckIn);
        }

        let hours = self.resolver.effective(employee_id, at.date()).await?;
        let event = PendingEvent {
            time: at,
            point,
            distance_m,
        };

        if at.time() > hours.start {
            let replaced = self
                .tracker
                .begin(employee_id, PendingFlow::AwaitingLateReason(event))
                .await;
            debug!(employee_id, %at, "late check-in, awaiting reason");
            return Ok(CheckOutcome::LateReasonRequired {
                expected_start: hours.start,
                replaced: replaced.as_ref().map(PendingFlow::describe),
            });
        }

        let record = self
            .finalize_check_in(employee_id, event, false, None, at)
            .await?;
        Ok(CheckOutcome::CheckedIn(record))
    }

    /// `CheckedIn -> CheckedOut`, or into the awaiting-early-reason sub-state.
    pub async fn check_out(
        &self,
        employee_id: i64,
        at: NaiveDateTime,
        point: Coordinate,
    ) -> Result<CheckOutcome, AttendanceError> {
        let distance_m = self.geofence(point).await?;
        self.require_active(employee_id).await?;

        let record = self
            .store
            .attendance(employee_id, at.date())
            .await?
            .ok_or(AttendanceError::CheckOutWithoutCheckIn)?;
        if record.status == AttendanceStatus::CheckedOut {
            return Err(AttendanceError::CheckOutWithoutCheckIn);
        }
        if at + self.skew_tolerance < record.check_in.time {
            return Err(AttendanceError::InvalidOrder);
        }
        // A tolerated skew is clamped so the stored check-out never precedes
        // the stored check-in.
        let at = at.max(record.check_in.time);

        let hours = self.resolver.effective(employee_id, at.date()).await?;
        let event = PendingEvent {
            time: at,
            point,
            distance_m,
        };

        if at.time() < hours.end {
            let replaced = self
                .tracker
                .begin(employee_id, PendingFlow::AwaitingEarlyCheckoutReason(event))
                .await;
            debug!(employee_id, %at, "early check-out, awaiting reason");
            return Ok(CheckOutcome::EarlyCheckoutReasonRequired {
                expected_end: hours.end,
                replaced: replaced.as_ref().map(PendingFlow::describe),
            });
        }

        let record = self
            .finalize_check_out(employee_id, event, false, None)
            .await?;
        Ok(CheckOutcome::CheckedOut(record))
    }

    /// Consumes the pending flow for this employee, finalizing whichever
    /// transition it was holding open. A blank reason is rejected and the
    /// flow stays pending; `now` becomes the record's creation time.
    pub async fn submit_reason(
        &self,
        employee_id: i64,
        reason: &str,
        now: NaiveDateTime,
    ) -> Result<CheckOutcome, AttendanceError> {
        let reason = reason.trim();
        if reason.is_empty() {
            // Checked before take() so the prompt is still live afterwards.
            return match self.tracker.peek(employee_id).await {
                Some(_) => Err(AttendanceError::EmptyReason),
                None => Err(AttendanceError::NoPendingReason),
            };
        }
        let flow = self
            .tracker
            .take(employee_id)
            .await
            .ok_or(AttendanceError::NoPendingReason)?;
        let reason = reason.to_owned();

        match flow {
            PendingFlow::AwaitingLateReason(event) => {
                let record = self
                    .finalize_check_in(employee_id, event, true, Some(reason), now)
                    .await?;
                Ok(CheckOutcome::CheckedIn(record))
            }
            PendingFlow::AwaitingEarlyCheckoutReason(event) => {
                let record = self
                    .finalize_check_out(employee_id, event, true, Some(reason))
                    .await?;
                Ok(CheckOutcome::CheckedOut(record))
            }
        }
    }

    /// Pending flow for this employee, if any.
    pub async fn pending(&self, employee_id: i64) -> Option<PendingFlow> {
        self.tracker.peek(employee_id).await
    }

    /// Drops the pending flow, reporting what was dropped.
    pub async fn cancel_pending(&self, employee_id: i64) -> Option<PendingFlow> {
        let cancelled = self.tracker.cancel(employee_id).await;
        if let Some(flow) = &cancelled {
            info!(employee_id, flow = flow.describe(), "pending flow cancelled");
        }
        cancelled
    }

    pub async fn record_for(
        &self,
        employee_id: i64,
        date: chrono::NaiveDate,
    ) -> Result<Option<AttendanceRecord>, AttendanceError> {
        Ok(self.store.attendance(employee_id, date).await?)
    }

    async fn finalize_check_in(
        &self,
        employee_id: i64,
        event: PendingEvent,
        is_late: bool,
        late_reason: Option<String>,
        created_at: NaiveDateTime,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let record = AttendanceRecord::open(
            employee_id,
            CheckEvent::new(event.time, event.point, event.distance_m),
            is_late,
            late_reason,
            created_at,
        );
        self.store.insert_check_in(record.clone()).await?;
        info!(employee_id, time = %event.time, is_late, "check-in recorded");
        Ok(record)
    }

    async fn finalize_check_out(
        &self,
        employee_id: i64,
        event: PendingEvent,
        is_early: bool,
        reason: Option<String>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let check_out = CheckEvent::new(event.time, event.point, event.distance_m);
        let record = self
            .store
            .complete_check_out(employee_id, event.time.date(), check_out, is_early, reason)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => AttendanceError::CheckOutWithoutCheckIn,
                other => AttendanceError::from(other),
            })?;
        info!(employee_id, time = %event.time, is_early, "check-out recorded");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::model::employee::NewEmployee;
    use crate::model::schedule::WorkHours;
    use crate::store::MemoryStore;

    const OFFICE: Coordinate = Coordinate {
        latitude: 31.0417,
        longitude: 31.3778,
    };
    const FAR_AWAY: Coordinate = Coordinate {
        latitude: 31.2001,
        longitude: 31.3778,
    };

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn hours(start: &str, end: &str) -> WorkHours {
        WorkHours::new(
            NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
            NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
        )
    }

    async fn engine() -> (Arc<MemoryStore>, AttendanceEngine) {
        let store = Arc::new(MemoryStore::new());
        store
            .upsert_employee(NewEmployee {
                employee_id: 7,
                username: Some("jdoe".into()),
                first_name: "John".into(),
                last_name: Some("Doe".into()),
                phone: None,
            })
            .await
            .unwrap();
        let resolver = ScheduleResolver::new(store.clone(), hours("09:00", "17:00"));
        let engine = AttendanceEngine::new(
            store.clone(),
            ConversationTracker::new(std::time::Duration::from_secs(600)),
            resolver,
            OFFICE,
            100.0,
            Duration::seconds(5),
        );
        (store, engine)
    }

    #[tokio::test]
    async fn on_time_check_in_completes() {
        let (_, engine) = engine().await;
        let outcome = engine.check_in(7, at(8, 55), OFFICE).await.unwrap();
        match outcome {
            CheckOutcome::CheckedIn(record) => {
                assert!(!record.is_late);
                assert_eq!(record.status, AttendanceStatus::CheckedIn);
                assert!(record.check_in.distance_m <= 100.0);
            }
            other => panic!("expected CheckedIn, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn out_of_range_check_in_rejected_with_distance() {
        let (_, engine) = engine().await;
        let err = engine.check_in(7, at(8, 55), FAR_AWAY).await.unwrap_err();
        match err {
            AttendanceError::OutOfRange { distance_m, radius_m } => {
                assert!(distance_m > radius_m);
            }
            other => panic!("expected OutOfRange, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unregistered_employee_rejected() {
        let (_, engine) = engine().await;
        let err = engine.check_in(999, at(8, 55), OFFICE).await.unwrap_err();
        assert!(matches!(err, AttendanceError::UnknownEmployee(999)));
    }

    #[tokio::test]
    async fn late_check_in_requires_reason_before_record_exists() {
        let (store, engine) = engine().await;

        let outcome = engine.check_in(7, at(9, 30), OFFICE).await.unwrap();
        assert!(matches!(
            outcome,
            CheckOutcome::LateReasonRequired { expected_start, .. }
                if expected_start == NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        ));

        // Nothing written until the reason arrives.
        assert!(
            store
                .attendance(7, at(9, 30).date())
                .await
                .unwrap()
                .is_none()
        );

        let outcome = engine
            .submit_reason(7, "traffic on the bridge", at(9, 33))
            .await
            .unwrap();
        match outcome {
            CheckOutcome::CheckedIn(record) => {
                assert!(record.is_late);
                assert_eq!(record.late_reason.as_deref(), Some("traffic on the bridge"));
                // The check-in keeps the event time; the row records when it
                // was actually written.
                assert_eq!(record.check_in.time, at(9, 30));
                assert_eq!(record.created_at, at(9, 33));
            }
            other => panic!("expected CheckedIn, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_reason_rejected_and_prompt_stays_live() {
        let (store, engine) = engine().await;
        engine.check_in(7, at(9, 30), OFFICE).await.unwrap();

        let err = engine.submit_reason(7, "   ", at(9, 31)).await.unwrap_err();
        assert!(matches!(err, AttendanceError::EmptyReason));

        // Still pending, still nothing written.
        assert!(engine.pending(7).await.is_some());
        assert!(
            store
                .attendance(7, at(9, 30).date())
                .await
                .unwrap()
                .is_none()
        );

        // A real reason still goes through.
        let outcome = engine.submit_reason(7, "overslept", at(9, 32)).await.unwrap();
        assert!(matches!(outcome, CheckOutcome::CheckedIn(_)));
    }

    #[tokio::test]
    async fn exceptional_schedule_makes_early_arrival_on_time() {
        let (store, engine) = engine().await;
        store.add_admin(1).await.unwrap();
        engine
            .resolver()
            .set_exception(
                1,
                7,
                at(9, 45).date(),
                hours("10:00", "18:00"),
                "late shift".into(),
                Utc::now().naive_utc(),
            )
            .await
            .unwrap();

        // 09:45 against an overridden 10:00 start is not late.
        let outcome = engine.check_in(7, at(9, 45), OFFICE).await.unwrap();
        assert!(matches!(outcome, CheckOutcome::CheckedIn(ref r) if !r.is_late));
    }

    #[tokio::test]
    async fn second_check_in_is_duplicate() {
        let (_, engine) = engine().await;
        engine.check_in(7, at(8, 55), OFFICE).await.unwrap();
        let err = engine.check_in(7, at(9, 5), OFFICE).await.unwrap_err();
        assert!(matches!(err, AttendanceError::DuplicateCheckIn));
    }

    #[tokio::test]
    async fn check_in_after_checkout_is_duplicate() {
        let (_, engine) = engine().await;
        engine.check_in(7, at(8, 55), OFFICE).await.unwrap();
        engine.check_out(7, at(17, 10), OFFICE).await.unwrap();
        // The day is terminal once checked out.
        let err = engine.check_in(7, at(17, 30), OFFICE).await.unwrap_err();
        assert!(matches!(err, AttendanceError::DuplicateCheckIn));
    }

    #[tokio::test]
    async fn check_out_without_check_in_rejected() {
        let (_, engine) = engine().await;
        let err = engine.check_out(7, at(17, 10), OFFICE).await.unwrap_err();
        assert!(matches!(err, AttendanceError::CheckOutWithoutCheckIn));
    }

    #[tokio::test]
    async fn check_out_before_check_in_rejected() {
        let (_, engine) = engine().await;
        engine.check_in(7, at(8, 55), OFFICE).await.unwrap();
        let err = engine.check_out(7, at(8, 40), OFFICE).await.unwrap_err();
        assert!(matches!(err, AttendanceError::InvalidOrder));
    }

    #[tokio::test]
    async fn small_clock_skew_is_tolerated() {
        let (_, engine) = engine().await;
        engine.check_in(7, at(17, 10), OFFICE).await.unwrap(); // late, goes pending
        engine
            .submit_reason(7, "afternoon shift", at(17, 10))
            .await
            .unwrap();

        // Two seconds behind the stored check-in, within the tolerance.
        let skewed = at(17, 10) - Duration::seconds(2);
        let outcome = engine.check_out(7, skewed, OFFICE).await;
        assert!(outcome.is_ok());
    }

    #[tokio::test]
    async fn tolerated_skew_is_clamped_to_check_in_time() {
        let (store, engine) = engine().await;
        engine.check_in(7, at(17, 10), OFFICE).await.unwrap();
        engine
            .submit_reason(7, "afternoon shift", at(17, 10))
            .await
            .unwrap();

        let skewed = at(17, 10) - Duration::seconds(2);
        engine.check_out(7, skewed, OFFICE).await.unwrap();

        // The stored check-out never precedes the stored check-in.
        let record = store
            .attendance(7, at(17, 10).date())
            .await
            .unwrap()
            .unwrap();
        let check_out = record.check_out.unwrap();
        assert_eq!(check_out.time, record.check_in.time);
        assert_eq!(record.worked_minutes(check_out.time), 0);
    }

    #[tokio::test]
    async fn early_check_out_requires_reason() {
        let (store, engine) = engine().await;
        engine.check_in(7, at(8, 55), OFFICE).await.unwrap();

        let outcome = engine.check_out(7, at(15, 0), OFFICE).await.unwrap();
        assert!(matches!(
            outcome,
            CheckOutcome::EarlyCheckoutReasonRequired { expected_end, .. }
                if expected_end == NaiveTime::from_hms_opt(17, 0, 0).unwrap()
        ));

        // Still open until the reason lands.
        let record = store.attendance(7, at(15, 0).date()).await.unwrap().unwrap();
        assert_eq!(record.status, AttendanceStatus::CheckedIn);

        let outcome = engine
            .submit_reason(7, "doctor appointment", at(15, 2))
            .await
            .unwrap();
        match outcome {
            CheckOutcome::CheckedOut(record) => {
                assert!(record.is_early_checkout);
                assert_eq!(
                    record.early_checkout_reason.as_deref(),
                    Some("doctor appointment")
                );
                assert!(record.check_out.unwrap().time >= record.check_in.time);
            }
            other => panic!("expected CheckedOut, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reason_without_pending_flow_rejected() {
        let (_, engine) = engine().await;
        let err = engine
            .submit_reason(7, "whatever", at(10, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::NoPendingReason));
    }

    #[tokio::test]
    async fn deactivated_employee_rejected() {
        let (store, engine) = engine().await;
        store.deactivate_employee(7).await.unwrap();
        let err = engine.check_in(7, at(8, 55), OFFICE).await.unwrap_err();
        assert!(matches!(err, AttendanceError::UnknownEmployee(7)));
    }

    #[tokio::test]
    async fn new_flow_overwrites_pending_and_reports_it() {
        let (_, engine) = engine().await;

        engine.check_in(7, at(9, 30), OFFICE).await.unwrap();
        let outcome = engine.check_in(7, at(9, 40), OFFICE).await.unwrap();
        match outcome {
            CheckOutcome::LateReasonRequired { replaced, .. } => {
                assert_eq!(replaced, Some("late check-in reason"));
            }
            other => panic!("expected LateReasonRequired, got {other:?}"),
        }

        // The reason finalizes the most recent attempt.
        let outcome = engine.submit_reason(7, "overslept", at(9, 41)).await.unwrap();
        match outcome {
            CheckOutcome::CheckedIn(record) => {
                assert_eq!(record.check_in.time, at(9, 40));
            }
            other => panic!("expected CheckedIn, got {other:?}"),
        }
    }
}
