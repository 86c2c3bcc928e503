//! Engine configuration.
//!
//! All settings can be overridden through environment variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | DATABASE_PATH | ./coffeebean.db | SQLite database file |
//! | DELIVERY_SWEEP_TIME | 14:00 | Daily delivery sweep trigger (local HH:MM) |
//! | LOG_LEVEL | info | Log filter level |

use chrono::NaiveTime;

use crate::utils::time::parse_sweep_time;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file path.
    pub database_path: String,
    /// Local time of day the delivery scheduler fires.
    pub delivery_sweep_time: NaiveTime,
    /// Log filter level: trace | debug | info | warn | error.
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables, using defaults for
    /// anything unset.
    pub fn from_env() -> Self {
        Self {
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./coffeebean.db".into()),
            delivery_sweep_time: parse_sweep_time(
                &std::env::var("DELIVERY_SWEEP_TIME").unwrap_or_else(|_| "14:00".into()),
            ),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "./coffeebean.db".into(),
            delivery_sweep_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            log_level: "info".into(),
        }
    }
}
