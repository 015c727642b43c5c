use std::env;

use chrono::NaiveTime;
use chrono_tz::Tz;
use dotenvy::dotenv;

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    /// When unset the bot runs on the in-memory store (single instance).
    pub database_url: Option<String>,

    // Office geofence
    pub office_latitude: f64,
    pub office_longitude: f64,
    pub office_radius_m: f64,

    // Schedules and alerting
    pub timezone: Tz,
    pub work_start: NaiveTime,
    pub work_end: NaiveTime,
    pub late_grace_minutes: i64,
    pub checkout_cutoff: NaiveTime,
    pub pending_reason_ttl_secs: u64,
    pub clock_skew_secs: i64,

    // Periodic tasks
    pub daily_summary_time: NaiveTime,
    pub wake_up_url: Option<String>,
    pub wake_up_interval_secs: u64,

    // Dashboard auth
    pub jwt_secret: String,
    pub access_token_ttl: usize,
    pub dashboard_username: String,
    pub dashboard_password_hash: String,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_bot_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: var_or("SERVER_ADDR", "0.0.0.0:8080"),
            database_url: env::var("DATABASE_URL").ok(),

            // 29R3+7Q El Mansoura, the default office
            office_latitude: var_or("OFFICE_LATITUDE", "31.0417").parse().unwrap(),
            office_longitude: var_or("OFFICE_LONGITUDE", "31.3778").parse().unwrap(),
            office_radius_m: var_or("OFFICE_RADIUS", "100").parse().unwrap(),

            timezone: var_or("TIMEZONE", "Africa/Cairo").parse().unwrap(),
            work_start: NaiveTime::parse_from_str(&var_or("WORK_START", "09:00"), "%H:%M")
                .unwrap(),
            work_end: NaiveTime::parse_from_str(&var_or("WORK_END", "17:00"), "%H:%M").unwrap(),
            late_grace_minutes: var_or("LATE_GRACE_MINUTES", "30").parse().unwrap(),
            checkout_cutoff: NaiveTime::parse_from_str(
                &var_or("CHECKOUT_CUTOFF", "20:00"),
                "%H:%M",
            )
            .unwrap(),
            pending_reason_ttl_secs: var_or("PENDING_REASON_TTL_SECS", "600").parse().unwrap(),
            clock_skew_secs: var_or("CLOCK_SKEW_SECS", "5").parse().unwrap(),

            daily_summary_time: NaiveTime::parse_from_str(
                &var_or("DAILY_SUMMARY_TIME", "20:00"),
                "%H:%M",
            )
            .unwrap(),
            wake_up_url: env::var("WAKE_UP_URL").ok(),
            // 14 minutes: free-tier hosts sleep after 15 idle minutes
            wake_up_interval_secs: var_or("WAKE_UP_INTERVAL_SECS", "840").parse().unwrap(),

            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            access_token_ttl: var_or("ACCESS_TOKEN_TTL", "900").parse().unwrap(),
            dashboard_username: var_or("DASHBOARD_USERNAME", "admin"),
            // A pre-computed PHC hash is preferred; a plaintext
            // DASHBOARD_PASSWORD is hashed at boot as a convenience.
            dashboard_password_hash: env::var("DASHBOARD_PASSWORD_HASH").unwrap_or_else(|_| {
                let plain = env::var("DASHBOARD_PASSWORD")
                    .expect("DASHBOARD_PASSWORD_HASH or DASHBOARD_PASSWORD must be set");
                crate::auth::password::hash_password(&plain)
                    .expect("failed to hash DASHBOARD_PASSWORD")
            }),

            rate_login_per_min: var_or("RATE_LOGIN_PER_MIN", "30").parse().unwrap(),
            rate_bot_per_min: var_or("RATE_BOT_PER_MIN", "600").parse().unwrap(),
            rate_protected_per_min: var_or("RATE_PROTECTED_PER_MIN", "1000").parse().unwrap(),

            api_prefix: var_or("API_PREFIX", "/api"),
        }
    }

    /// Startup sanity checks; the process refuses to boot on nonsense.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(-90.0..=90.0).contains(&self.office_latitude) {
            anyhow::bail!("OFFICE_LATITUDE must be between -90 and 90");
        }
        if !(-180.0..=180.0).contains(&self.office_longitude) {
            anyhow::bail!("OFFICE_LONGITUDE must be between -180 and 180");
        }
        if self.office_radius_m < 1.0 {
            anyhow::bail!("OFFICE_RADIUS must be at least 1 meter");
        }
        if self.work_end <= self.work_start {
            anyhow::bail!("WORK_END must be after WORK_START");
        }
        Ok(())
    }
}
