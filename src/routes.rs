use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

use crate::{
    api::{bot, dashboard, health},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let bot_limiter = Arc::new(build_limiter(config.rate_bot_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(web::resource("/health").route(web::get().to(health::health)));
    cfg.service(
        web::scope("/auth").service(
            web::resource("/login")
                .wrap(login_limiter.clone())
                .route(web::post().to(handlers::login)),
        ),
    );
    cfg.service(
        web::scope("/bot").service(
            web::resource("/event")
                .wrap(bot_limiter.clone())
                .route(web::post().to(bot::bot_event)),
        ),
    );

    // Protected dashboard routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(protected_limiter) // rate limiting
            .service(web::resource("/summary").route(web::get().to(dashboard::summary)))
            .service(web::resource("/report").route(web::get().to(dashboard::report)))
            .service(
                web::scope("/alerts")
                    .service(web::resource("/late").route(web::get().to(dashboard::late_alerts)))
                    .service(
                        web::resource("/missed-checkout")
                            .route(web::get().to(dashboard::missed_checkouts)),
                    ),
            )
            .service(
                web::scope("/employees")
                    // /employees
                    .service(web::resource("").route(web::get().to(dashboard::list_employees)))
                    // /employees/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::delete().to(dashboard::deactivate_employee)),
                    )
                    // /employees/{id}/hours
                    .service(
                        web::resource("/{id}/hours").route(web::put().to(dashboard::set_hours)),
                    )
                    // /employees/{id}/history
                    .service(
                        web::resource("/{id}/history")
                            .route(web::get().to(dashboard::employee_history)),
                    ),
            )
            .service(
                web::scope("/admins")
                    .service(web::resource("").route(web::get().to(dashboard::list_admins)))
                    .service(
                        web::resource("/{id}")
                            .route(web::post().to(dashboard::grant_admin))
                            .route(web::delete().to(dashboard::revoke_admin)),
                    ),
            ),
    );
}
