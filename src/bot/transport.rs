use async_trait::async_trait;
use tracing::info;

use crate::bot::event::BotReply;

/// Outbound push seam. The real chat transport lives outside this crate;
/// the scheduler and alerting paths only ever talk to this trait.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, employee_id: i64, reply: BotReply);
}

/// Default transport: writes outbound messages to the log. Useful standalone
/// and in tests; a deployment wires a real adapter in its place.
pub struct LogTransport;

#[async_trait]
impl ChatTransport for LogTransport {
    async fn send(&self, employee_id: i64, reply: BotReply) {
        info!(employee_id, text = %reply.text, "outbound message");
    }
}
