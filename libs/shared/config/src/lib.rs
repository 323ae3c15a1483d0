use std::env;
use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub catalog_base_url: String,
    pub payment_base_url: String,
    /// IANA zone used for calendar days when a request names none.
    pub default_timezone: Tz,
    pub default_consultation_price: u32,
    pub phone_country_prefix: String,
    pub snapshot_dir: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub session_idle_minutes: u64,
    pub server_port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            catalog_base_url: env::var("CATALOG_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("CATALOG_BASE_URL not set, using empty value");
                    String::new()
                }),
            payment_base_url: env::var("PAYMENT_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("PAYMENT_BASE_URL not set, using empty value");
                    String::new()
                }),
            default_timezone: parse_or_default("BOOKING_TIMEZONE", Tz::America__Santiago),
            default_consultation_price: parse_or_default("DEFAULT_CONSULTATION_PRICE", 25_000),
            phone_country_prefix: env::var("PHONE_COUNTRY_PREFIX")
                .unwrap_or_else(|_| {
                    warn!("PHONE_COUNTRY_PREFIX not set, using default");
                    "+56".to_string()
                }),
            snapshot_dir: env::var("SNAPSHOT_DIR").ok().map(PathBuf::from),
            request_timeout_secs: parse_or_default("COLLABORATOR_TIMEOUT_SECS", 10),
            session_idle_minutes: parse_or_default("SESSION_IDLE_MINUTES", 30),
            server_port: parse_or_default("SERVER_PORT", 3000),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing collaborator URLs");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.catalog_base_url.is_empty()
            && !self.payment_base_url.is_empty()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_minutes.saturating_mul(60))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_base_url: String::new(),
            payment_base_url: String::new(),
            default_timezone: Tz::America__Santiago,
            default_consultation_price: 25_000,
            phone_country_prefix: "+56".to_string(),
            snapshot_dir: None,
            request_timeout_secs: 10,
            session_idle_minutes: 30,
            server_port: 3000,
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => {
            warn!("{} not set, using default {}", key, default);
            default
        }
    }
}
