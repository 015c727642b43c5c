pub mod admin;
pub mod event;
pub mod messages;
pub mod transport;

use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::warn;

use crate::core::state::{AttendanceEngine, CheckOutcome};
use crate::core::summary::Aggregator;
use crate::error::AttendanceError;
use crate::model::attendance::AttendanceStatus;
use crate::model::employee::NewEmployee;
use crate::store::Store;
use event::{BotEvent, BotReply};

const HISTORY_DAYS: u32 = 7;

/// Chat front end: routes `(employee_id, BotEvent)` pairs into the engine and
/// turns results into plain-text replies. Timestamps arrive already localized
/// from the caller; this layer never reads the wall clock itself.
#[derive(Clone)]
pub struct Bot {
    pub(crate) engine: Arc<AttendanceEngine>,
    pub(crate) aggregator: Aggregator,
    pub(crate) store: Arc<dyn Store>,
    pub(crate) radius_m: f64,
}

impl Bot {
    pub fn new(
        engine: Arc<AttendanceEngine>,
        aggregator: Aggregator,
        store: Arc<dyn Store>,
        radius_m: f64,
    ) -> Self {
        Self {
            engine,
            aggregator,
            store,
            radius_m,
        }
    }

    pub async fn handle(
        &self,
        employee_id: i64,
        event: BotEvent,
        now: NaiveDateTime,
    ) -> Vec<BotReply> {
        match event {
            BotEvent::Contact {
                phone,
                first_name,
                last_name,
                username,
            } => {
                self.register(
                    NewEmployee {
                        employee_id,
                        username,
                        first_name,
                        last_name,
                        phone: Some(phone),
                    },
                )
                .await
            }
            BotEvent::Location {
                latitude,
                longitude,
            } => self.location(employee_id, latitude, longitude, now).await,
            BotEvent::Text { text } => self.text(employee_id, &text, now).await,
            BotEvent::Command { name, args } => {
                let mut replies = Vec::new();
                // A command while a reason prompt is pending cancels the
                // pending flow, and the user is told so. Never absorbed.
                if name != "cancel" {
                    if let Some(flow) = self.engine.cancel_pending(employee_id).await {
                        replies.push(BotReply::new(messages::pending_cancelled(flow.describe())));
                    }
                }
                replies.extend(self.command(employee_id, &name, &args, now).await);
                replies
            }
        }
    }

    async fn register(&self, employee: NewEmployee) -> Vec<BotReply> {
        let first_name = employee.first_name.clone();
        match self.store.upsert_employee(employee).await {
            Ok(_) => vec![BotReply::new(messages::registered(&first_name))],
            Err(e) => {
                warn!(error = %e, "registration failed");
                vec![BotReply::new(messages::rejection(&AttendanceError::from(e)))]
            }
        }
    }

    /// A shared location is a check-in when no record exists, a check-out
    /// while checked in. The engine owns every validity decision.
    async fn location(
        &self,
        employee_id: i64,
        latitude: f64,
        longitude: f64,
        now: NaiveDateTime,
    ) -> Vec<BotReply> {
        let point = match crate::core::geofence::Coordinate::new(latitude, longitude) {
            Ok(p) => p,
            Err(e) => return vec![BotReply::new(messages::rejection(&e))],
        };

        let current = match self.engine.record_for(employee_id, now.date()).await {
            Ok(record) => record,
            Err(e) => return vec![BotReply::new(messages::rejection(&e))],
        };

        let attempt = match current.map(|r| r.status) {
            None | Some(AttendanceStatus::CheckedOut) => {
                self.engine.check_in(employee_id, now, point).await
            }
            Some(AttendanceStatus::CheckedIn) => {
                self.engine.check_out(employee_id, now, point).await
            }
        };

        match attempt {
            Ok(outcome) => self.outcome_replies(employee_id, outcome, now).await,
            Err(e) => vec![BotReply::new(messages::rejection(&e))],
        }
    }

    async fn outcome_replies(
        &self,
        employee_id: i64,
        outcome: CheckOutcome,
        now: NaiveDateTime,
    ) -> Vec<BotReply> {
        match outcome {
            CheckOutcome::CheckedIn(record) => {
                // A completed transition makes any leftover prompt stale.
                let mut replies = Vec::new();
                if let Some(flow) = self.engine.cancel_pending(employee_id).await {
                    replies.push(BotReply::new(messages::pending_cancelled(flow.describe())));
                }
                replies.push(BotReply::new(messages::checked_in(&record)));
                replies
            }
            CheckOutcome::CheckedOut(record) => {
                let mut replies = Vec::new();
                if let Some(flow) = self.engine.cancel_pending(employee_id).await {
                    replies.push(BotReply::new(messages::pending_cancelled(flow.describe())));
                }
                replies.push(BotReply::new(messages::checked_out(&record, now)));
                replies
            }
            CheckOutcome::LateReasonRequired {
                expected_start,
                replaced,
            } => {
                let mut replies = Vec::new();
                if let Some(described) = replaced {
                    replies.push(BotReply::new(messages::pending_replaced(described)));
                }
                replies.push(BotReply::new(messages::late_reason_prompt(expected_start, now)));
                replies
            }
            CheckOutcome::EarlyCheckoutReasonRequired {
                expected_end,
                replaced,
            } => {
                let mut replies = Vec::new();
                if let Some(described) = replaced {
                    replies.push(BotReply::new(messages::pending_replaced(described)));
                }
                replies.push(BotReply::new(messages::early_reason_prompt(expected_end, now)));
                replies
            }
        }
    }

    /// Plain text is a reason while a prompt is pending; anything else gets
    /// the generic hint from the `NoPendingReason` rejection.
    async fn text(&self, employee_id: i64, text: &str, now: NaiveDateTime) -> Vec<BotReply> {
        match self.engine.submit_reason(employee_id, text, now).await {
            Ok(outcome) => self.outcome_replies(employee_id, outcome, now).await,
            Err(e) => vec![BotReply::new(messages::rejection(&e))],
        }
    }

    async fn command(
        &self,
        employee_id: i64,
        name: &str,
        args: &[String],
        now: NaiveDateTime,
    ) -> Vec<BotReply> {
        match name {
            "start" => self.start(employee_id, now).await,
            "register" => vec![BotReply::new(
                "Share your contact card to complete registration.",
            )],
            "status" => self.status(employee_id, now).await,
            "report" => self.report(employee_id).await,
            "cancel" => match self.engine.cancel_pending(employee_id).await {
                Some(flow) => vec![BotReply::new(messages::pending_cancelled(flow.describe()))],
                None => vec![BotReply::new("Nothing to cancel.")],
            },
            "help" => {
                let is_admin = self.store.is_admin(employee_id).await.unwrap_or(false);
                vec![BotReply::new(messages::help(is_admin))]
            }
            "summary" | "all_report" | "set_hours" | "add_admin" | "remove_admin"
            | "late_alerts" => self.admin_command(employee_id, name, args, now).await,
            _ => vec![BotReply::new("Unknown command. Use /help.")],
        }
    }

    async fn start(&self, employee_id: i64, now: NaiveDateTime) -> Vec<BotReply> {
        let employee = match self.store.employee(employee_id).await {
            Ok(Some(e)) if e.is_active => e,
            Ok(_) => return vec![BotReply::new(messages::registration_needed())],
            Err(e) => {
                return vec![BotReply::new(messages::rejection(&AttendanceError::from(e)))];
            }
        };
        match self
            .engine
            .resolver()
            .effective(employee_id, now.date())
            .await
        {
            Ok(hours) => vec![BotReply::new(messages::welcome(
                &employee.first_name,
                hours,
                self.radius_m,
            ))],
            Err(e) => vec![BotReply::new(messages::rejection(&e))],
        }
    }

    async fn status(&self, employee_id: i64, now: NaiveDateTime) -> Vec<BotReply> {
        let record = match self.engine.record_for(employee_id, now.date()).await {
            Ok(r) => r,
            Err(e) => return vec![BotReply::new(messages::rejection(&e))],
        };
        let hours = match self
            .engine
            .resolver()
            .effective(employee_id, now.date())
            .await
        {
            Ok(h) => h,
            Err(e) => return vec![BotReply::new(messages::rejection(&e))],
        };
        vec![BotReply::new(messages::status(record.as_ref(), hours, now))]
    }

    async fn report(&self, employee_id: i64) -> Vec<BotReply> {
        match self
            .aggregator
            .employee_history(employee_id, HISTORY_DAYS)
            .await
        {
            Ok(records) => vec![BotReply::new(messages::history(&records))],
            Err(e) => vec![BotReply::new(messages::rejection(&e))],
        }
    }
}
