//! Admin chat commands: summaries, reports, exceptional hours, and admin
//! grants. All of them gate on the admins table first.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::bot::event::BotReply;
use crate::bot::{Bot, messages};
use crate::error::AttendanceError;
use crate::model::schedule::WorkHours;

impl Bot {
    pub(crate) async fn admin_command(
        &self,
        employee_id: i64,
        name: &str,
        args: &[String],
        now: NaiveDateTime,
    ) -> Vec<BotReply> {
        match self.store.is_admin(employee_id).await {
            Ok(true) => {}
            Ok(false) => {
                return vec![BotReply::new(messages::rejection(
                    &AttendanceError::UnauthorizedAdminAction,
                ))];
            }
            Err(e) => {
                return vec![BotReply::new(messages::rejection(&AttendanceError::from(e)))];
            }
        }

        match name {
            "summary" => self.summary(now).await,
            "all_report" => self.all_report(now).await,
            "late_alerts" => self.late_alerts(now).await,
            "set_hours" => self.set_hours(employee_id, args, now).await,
            "add_admin" => self.grant_admin(args).await,
            "remove_admin" => self.revoke_admin(args).await,
            _ => vec![BotReply::new("Unknown admin command. Use /help.")],
        }
    }

    async fn summary(&self, now: NaiveDateTime) -> Vec<BotReply> {
        match self.aggregator.daily_summary(now.date()).await {
            Ok(summary) => vec![BotReply::new(messages::summary(&summary))],
            Err(e) => vec![BotReply::new(messages::rejection(&e))],
        }
    }

    async fn all_report(&self, now: NaiveDateTime) -> Vec<BotReply> {
        let rows = match self.aggregator.all_employees_report(now.date()).await {
            Ok(rows) => rows,
            Err(e) => return vec![BotReply::new(messages::rejection(&e))],
        };
        if rows.is_empty() {
            return vec![BotReply::new("No employees registered.")];
        }

        let mut text = format!("All employees, {}\n", now.date());
        for row in rows {
            let check_in = row
                .check_in
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_else(|| "-".into());
            let check_out = row
                .check_out
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_else(|| "-".into());
            let status = row
                .status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "absent".into());
            text.push_str(&format!(
                "{}: in {check_in} | out {check_out} | {status}\n",
                row.name
            ));
        }
        vec![BotReply::new(text)]
    }

    async fn late_alerts(&self, now: NaiveDateTime) -> Vec<BotReply> {
        let alerts = match self.aggregator.late_alerts(now).await {
            Ok(alerts) => alerts,
            Err(e) => return vec![BotReply::new(messages::rejection(&e))],
        };
        if alerts.is_empty() {
            return vec![BotReply::new("Nobody is overdue right now.")];
        }
        let mut text = String::from("Overdue check-ins:\n");
        for alert in alerts {
            text.push_str(&format!(
                "{}: expected {}, overdue by {} minutes\n",
                alert.name,
                alert.expected_start.format("%H:%M"),
                alert.minutes_overdue,
            ));
        }
        vec![BotReply::new(text)]
    }

    /// `/set_hours <employee_id> <YYYY-MM-DD> <HH:MM> <HH:MM> <reason...>`
    async fn set_hours(
        &self,
        acting_admin: i64,
        args: &[String],
        now: NaiveDateTime,
    ) -> Vec<BotReply> {
        const USAGE: &str = "Usage: /set_hours <employee_id> <YYYY-MM-DD> <start HH:MM> <end HH:MM> <reason>";
        if args.len() < 5 {
            return vec![BotReply::new(USAGE)];
        }
        let parsed = (
            args[0].parse::<i64>(),
            NaiveDate::parse_from_str(&args[1], "%Y-%m-%d"),
            NaiveTime::parse_from_str(&args[2], "%H:%M"),
            NaiveTime::parse_from_str(&args[3], "%H:%M"),
        );
        let (Ok(target), Ok(date), Ok(start), Ok(end)) = parsed else {
            return vec![BotReply::new(USAGE)];
        };
        if end <= start {
            return vec![BotReply::new("End time must be after the start time.")];
        }
        let reason = args[4..].join(" ");

        match self
            .engine
            .resolver()
            .set_exception(acting_admin, target, date, WorkHours::new(start, end), reason, now)
            .await
        {
            Ok(()) => vec![BotReply::new(format!(
                "Exceptional hours for {target} on {date}: {} - {}.",
                start.format("%H:%M"),
                end.format("%H:%M"),
            ))],
            Err(e) => vec![BotReply::new(messages::rejection(&e))],
        }
    }

    async fn grant_admin(&self, args: &[String]) -> Vec<BotReply> {
        let Some(Ok(target)) = args.first().map(|a| a.parse::<i64>()) else {
            return vec![BotReply::new("Usage: /add_admin <employee_id>")];
        };
        match self.store.add_admin(target).await {
            Ok(()) => vec![BotReply::new(format!("{target} is now an admin."))],
            Err(e) => vec![BotReply::new(messages::rejection(&AttendanceError::from(e)))],
        }
    }

    /// No minimum-admin floor: revoking the last admin is allowed.
    async fn revoke_admin(&self, args: &[String]) -> Vec<BotReply> {
        let Some(Ok(target)) = args.first().map(|a| a.parse::<i64>()) else {
            return vec![BotReply::new("Usage: /remove_admin <employee_id>")];
        };
        match self.store.remove_admin(target).await {
            Ok(true) => vec![BotReply::new(format!("{target} is no longer an admin."))],
            Ok(false) => vec![BotReply::new(format!("{target} was not an admin."))],
            Err(e) => vec![BotReply::new(messages::rejection(&AttendanceError::from(e)))],
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, NaiveDate};

    use super::*;
    use crate::bot::event::BotEvent;
    use crate::core::conversation::ConversationTracker;
    use crate::core::geofence::Coordinate;
    use crate::core::schedule::ScheduleResolver;
    use crate::core::state::AttendanceEngine;
    use crate::core::summary::Aggregator;
    use crate::model::employee::NewEmployee;
    use crate::store::{MemoryStore, Store};

    const OFFICE: Coordinate = Coordinate {
        latitude: 31.0417,
        longitude: 31.3778,
    };

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn command(name: &str, args: &[&str]) -> BotEvent {
        BotEvent::Command {
            name: name.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    async fn bot_with_admin() -> (Arc<MemoryStore>, Bot) {
        let store = Arc::new(MemoryStore::new());
        store
            .upsert_employee(NewEmployee {
                employee_id: 1,
                username: None,
                first_name: "Ada".into(),
                last_name: None,
                phone: None,
            })
            .await
            .unwrap();
        store.add_admin(1).await.unwrap();

        let hours = WorkHours::new(
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        );
        let resolver = ScheduleResolver::new(store.clone(), hours);
        let engine = Arc::new(AttendanceEngine::new(
            store.clone(),
            ConversationTracker::new(std::time::Duration::from_secs(600)),
            resolver.clone(),
            OFFICE,
            100.0,
            Duration::seconds(5),
        ));
        let aggregator = Aggregator::new(
            store.clone(),
            resolver,
            Duration::minutes(30),
            NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
        );
        let bot = Bot::new(engine, aggregator, store.clone(), 100.0);
        (store, bot)
    }

    #[tokio::test]
    async fn non_admin_is_refused() {
        let (store, bot) = bot_with_admin().await;
        store
            .upsert_employee(NewEmployee {
                employee_id: 2,
                username: None,
                first_name: "Bob".into(),
                last_name: None,
                phone: None,
            })
            .await
            .unwrap();

        let replies = bot.handle(2, command("summary", &[]), at(10, 0)).await;
        assert!(replies[0].text.contains("admin privileges"));
    }

    #[tokio::test]
    async fn set_hours_creates_override() {
        let (store, bot) = bot_with_admin().await;
        let replies = bot
            .handle(
                1,
                command("set_hours", &["7", "2025-03-10", "10:00", "18:00", "site", "visit"]),
                at(8, 0),
            )
            .await;
        assert!(replies[0].text.contains("Exceptional hours"));

        let stored = store
            .exception(7, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.reason, "site visit");
        assert_eq!(stored.created_by, 1);
    }

    #[tokio::test]
    async fn set_hours_rejects_malformed_args() {
        let (_, bot) = bot_with_admin().await;
        let replies = bot
            .handle(
                1,
                command("set_hours", &["7", "March-10", "10:00", "18:00", "x"]),
                at(8, 0),
            )
            .await;
        assert!(replies[0].text.starts_with("Usage:"));
    }

    #[tokio::test]
    async fn admin_can_be_granted_and_revoked() {
        let (store, bot) = bot_with_admin().await;

        bot.handle(1, command("add_admin", &["2"]), at(8, 0)).await;
        assert!(store.is_admin(2).await.unwrap());

        let replies = bot.handle(1, command("remove_admin", &["2"]), at(8, 1)).await;
        assert!(replies[0].text.contains("no longer"));
        assert!(!store.is_admin(2).await.unwrap());

        // no floor: the last admin can revoke themselves
        bot.handle(1, command("remove_admin", &["1"]), at(8, 2)).await;
        assert!(!store.is_admin(1).await.unwrap());
    }

    #[tokio::test]
    async fn summary_command_reports_rate() {
        let (_, bot) = bot_with_admin().await;
        // Ada checks in on time
        bot.handle(
            1,
            BotEvent::Location {
                latitude: OFFICE.latitude,
                longitude: OFFICE.longitude,
            },
            at(8, 55),
        )
        .await;

        let replies = bot.handle(1, command("summary", &[]), at(10, 0)).await;
        assert!(replies[0].text.contains("Attendance rate: 100.0%"));
    }
}
