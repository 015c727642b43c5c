use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Inbound chat event, already stripped of any transport-library types:
/// the transport adapter delivers `(employee_id, BotEvent)` pairs.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BotEvent {
    /// `/command arg arg ...`
    Command { name: String, args: Vec<String> },
    /// Plain text; consumed as a reason while a prompt is pending.
    Text { text: String },
    /// A shared GPS location.
    Location { latitude: f64, longitude: f64 },
    /// A shared contact card, used for registration.
    Contact {
        phone: String,
        first_name: String,
        last_name: Option<String>,
        username: Option<String>,
    },
}

/// Outbound reply; plain text only, rendering is the transport's problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BotReply {
    pub text: String,
}

impl BotReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
