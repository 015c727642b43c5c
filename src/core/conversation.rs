use std::time::Duration;

use chrono::NaiveDateTime;
use moka::future::Cache;

use crate::core::geofence::Coordinate;

/// The already-validated event a pending-reason flow is holding open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingEvent {
    pub time: NaiveDateTime,
    pub point: Coordinate,
    pub distance_m: f64,
}

/// One pending follow-up per employee. Nothing here is persisted: an
/// abandoned prompt simply ages out of the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingFlow {
    AwaitingLateReason(PendingEvent),
    AwaitingEarlyCheckoutReason(PendingEvent),
}

impl PendingFlow {
    pub fn describe(&self) -> &'static str {
        match self {
            PendingFlow::AwaitingLateReason(_) => "late check-in reason",
            PendingFlow::AwaitingEarlyCheckoutReason(_) => "early check-out reason",
        }
    }
}

/// Per-employee conversation state for multi-step interactions, backed by a
/// TTL cache so an unanswered prompt cannot linger forever.
pub struct ConversationTracker {
    pending: Cache<i64, PendingFlow>,
}

impl ConversationTracker {
    pub fn new(ttl: Duration) -> Self {
        Self {
            pending: Cache::builder()
                .max_capacity(100_000)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Starts (or overwrites) the pending flow for an employee, returning the
    /// flow that was replaced, if any. Overwrites are never silent: the
    /// caller reports the replacement to the user.
    pub async fn begin(&self, employee_id: i64, flow: PendingFlow) -> Option<PendingFlow> {
        let previous = self.pending.get(&employee_id).await;
        self.pending.insert(employee_id, flow).await;
        previous
    }

    /// Consumes the pending flow, completing it.
    pub async fn take(&self, employee_id: i64) -> Option<PendingFlow> {
        self.pending.remove(&employee_id).await
    }

    pub async fn peek(&self, employee_id: i64) -> Option<PendingFlow> {
        self.pending.get(&employee_id).await
    }

    /// Explicit cancellation; returns what was cancelled.
    pub async fn cancel(&self, employee_id: i64) -> Option<PendingFlow> {
        self.pending.remove(&employee_id).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn event(h: u32, m: u32) -> PendingEvent {
        PendingEvent {
            time: NaiveDate::from_ymd_opt(2025, 3, 10)
                .unwrap()
                .and_hms_opt(h, m, 0)
                .unwrap(),
            point: Coordinate {
                latitude: 31.0417,
                longitude: 31.3778,
            },
            distance_m: 15.0,
        }
    }

    #[tokio::test]
    async fn take_consumes_the_flow() {
        let tracker = ConversationTracker::new(Duration::from_secs(600));
        tracker
            .begin(7, PendingFlow::AwaitingLateReason(event(9, 30)))
            .await;

        assert!(tracker.take(7).await.is_some());
        assert!(tracker.take(7).await.is_none());
    }

    #[tokio::test]
    async fn begin_reports_the_overwritten_flow() {
        let tracker = ConversationTracker::new(Duration::from_secs(600));
        assert!(
            tracker
                .begin(7, PendingFlow::AwaitingLateReason(event(9, 30)))
                .await
                .is_none()
        );

        let replaced = tracker
            .begin(7, PendingFlow::AwaitingEarlyCheckoutReason(event(15, 0)))
            .await;
        assert_eq!(replaced, Some(PendingFlow::AwaitingLateReason(event(9, 30))));
    }

    #[tokio::test]
    async fn flows_are_isolated_per_employee() {
        let tracker = ConversationTracker::new(Duration::from_secs(600));
        tracker
            .begin(7, PendingFlow::AwaitingLateReason(event(9, 30)))
            .await;

        assert!(tracker.peek(8).await.is_none());
        assert!(tracker.peek(7).await.is_some());
    }

    #[tokio::test]
    async fn pending_flow_expires_after_ttl() {
        let tracker = ConversationTracker::new(Duration::from_millis(50));
        tracker
            .begin(7, PendingFlow::AwaitingLateReason(event(9, 30)))
            .await;

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(tracker.take(7).await.is_none());
    }
}
