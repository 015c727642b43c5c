use std::sync::Arc;
use std::time::Duration;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use dotenvy::dotenv;

mod api;
mod auth;
mod bot;
mod config;
mod core;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod store;
mod tasks;
mod utils;

use config::Config;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::bot::Bot;
use crate::bot::transport::{ChatTransport, LogTransport};
use crate::core::conversation::ConversationTracker;
use crate::core::geofence::Coordinate;
use crate::core::schedule::ScheduleResolver;
use crate::core::state::AttendanceEngine;
use crate::core::summary::Aggregator;
use crate::docs::ApiDoc;
use crate::model::schedule::WorkHours;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let store = db::init_store(&config).await.unwrap_or_else(|e| {
        eprintln!("Failed to initialize store: {e}");
        std::process::exit(1);
    });

    let office = Coordinate::new(config.office_latitude, config.office_longitude)
        .expect("validated office coordinate");
    let default_hours = WorkHours::new(config.work_start, config.work_end);
    let resolver = ScheduleResolver::new(store.clone(), default_hours);
    let tracker = ConversationTracker::new(Duration::from_secs(config.pending_reason_ttl_secs));
    let engine = Arc::new(AttendanceEngine::new(
        store.clone(),
        tracker,
        resolver.clone(),
        office,
        config.office_radius_m,
        chrono::Duration::seconds(config.clock_skew_secs),
    ));
    let aggregator = Aggregator::new(
        store.clone(),
        resolver.clone(),
        chrono::Duration::minutes(config.late_grace_minutes),
        config.checkout_cutoff,
    );
    let bot = Bot::new(
        engine.clone(),
        aggregator.clone(),
        store.clone(),
        config.office_radius_m,
    );

    let transport: Arc<dyn ChatTransport> = Arc::new(LogTransport);
    tasks::spawn_daily_summary(
        aggregator.clone(),
        store.clone(),
        transport,
        config.timezone,
        config.daily_summary_time,
    );
    if let Some(url) = config.wake_up_url.clone() {
        tasks::spawn_keep_alive(url, config.wake_up_interval_secs);
    }

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(config.clone()))
            .app_data(Data::new(store.clone()))
            .app_data(Data::new(bot.clone()))
            .app_data(Data::new(aggregator.clone()))
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
