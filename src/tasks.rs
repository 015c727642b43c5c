use std::sync::Arc;

use chrono::NaiveTime;
use chrono_tz::Tz;
use tokio::time::{Duration, sleep};
use tracing::{error, info, warn};

use crate::bot::event::BotReply;
use crate::bot::messages;
use crate::bot::transport::ChatTransport;
use crate::core::summary::Aggregator;
use crate::store::Store;
use crate::utils::time;

/// Pushes the daily summary to every chat admin at `at` local time.
pub fn spawn_daily_summary(
    aggregator: Aggregator,
    store: Arc<dyn Store>,
    transport: Arc<dyn ChatTransport>,
    tz: Tz,
    at: NaiveTime,
) {
    tokio::spawn(async move {
        loop {
            let now = time::now_local(tz);
            let next = time::next_occurrence(now, at);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            sleep(wait).await;

            let today = time::now_local(tz).date();
            match aggregator.daily_summary(today).await {
                Ok(summary) => {
                    let text = messages::summary(&summary);
                    match store.admins().await {
                        Ok(admins) if admins.is_empty() => {
                            warn!(%today, "daily summary ready but no admins to notify");
                        }
                        Ok(admins) => {
                            info!(%today, recipients = admins.len(), "pushing daily summary");
                            for admin in admins {
                                transport.send(admin, BotReply::new(text.clone())).await;
                            }
                        }
                        Err(e) => error!(error = %e, "failed to list admins for daily summary"),
                    }
                }
                Err(e) => error!(error = %e, %today, "failed to build daily summary"),
            }

            // Skip past the fire instant so a fast loop cannot double-send.
            sleep(Duration::from_secs(1)).await;
        }
    });
}

/// Periodic self-ping so free-tier hosts do not idle the instance out.
pub fn spawn_keep_alive(url: String, interval_secs: u64) {
    tokio::spawn(async move {
        let client = reqwest::Client::new();
        let interval = Duration::from_secs(interval_secs);
        loop {
            sleep(interval).await;
            match client.get(&url).send().await {
                Ok(resp) => info!(status = %resp.status(), "keep-alive ping"),
                Err(e) => warn!(error = %e, "keep-alive ping failed"),
            }
        }
    });
}
