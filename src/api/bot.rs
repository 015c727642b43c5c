use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::bot::Bot;
use crate::bot::event::{BotEvent, BotReply};
use crate::config::Config;
use crate::utils::time;

/// Envelope the chat-transport adapter posts for every inbound update.
#[derive(Debug, Deserialize, ToSchema)]
pub struct InboundEvent {
    pub employee_id: i64,
    pub event: BotEvent,
}

/// Chat webhook: the transport adapter delivers stripped-down events here
/// and relays the returned replies back to the user.
#[utoipa::path(
    post,
    path = "/bot/event",
    request_body = InboundEvent,
    responses(
        (status = 200, description = "Replies to relay", body = [BotReply]),
    ),
    tag = "Bot"
)]
pub async fn bot_event(
    payload: web::Json<InboundEvent>,
    bot: web::Data<Bot>,
    config: web::Data<Config>,
) -> impl Responder {
    let InboundEvent { employee_id, event } = payload.into_inner();
    let now = time::now_local(config.timezone);
    let replies = bot.handle(employee_id, event, now).await;
    HttpResponse::Ok().json(replies)
}
