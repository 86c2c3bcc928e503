//! Time utilities — injectable clock and sweep-trigger arithmetic.
//!
//! Business logic never reads the ambient wall clock directly: order
//! timestamps, the review window and the daily sweep all go through
//! [`Clock`], so tests can pin "now".

use chrono::{DateTime, Duration, Local, NaiveTime, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Injectable time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current timestamp in Unix millis (the repository convention).
    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// Wall-clock implementation used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for deterministic tests.
#[derive(Debug)]
pub struct FixedClock {
    millis: AtomicI64,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(at.timestamp_millis()),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.millis.store(at.timestamp_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.millis
            .fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let ms = self.millis.load(Ordering::SeqCst);
        // Stored value always originates from a valid DateTime.
        DateTime::<Utc>::from_timestamp_millis(ms).expect("FixedClock holds a valid timestamp")
    }
}

/// Parse a sweep trigger time string (HH:MM), falling back to 14:00.
pub fn parse_sweep_time(value: &str) -> NaiveTime {
    NaiveTime::parse_from_str(value, "%H:%M").unwrap_or_else(|e| {
        tracing::warn!(
            "Failed to parse sweep time '{}': {}, falling back to 14:00",
            value,
            e
        );
        NaiveTime::from_hms_opt(14, 0, 0).unwrap()
    })
}

/// Duration from `now` until the next occurrence of `trigger` local time.
///
/// If today's trigger has already passed, the next one is tomorrow's.
pub fn duration_until_next_trigger(now: DateTime<Local>, trigger: NaiveTime) -> std::time::Duration {
    let today = now.date_naive();
    let target_date = if now.time() >= trigger {
        today + Duration::days(1)
    } else {
        today
    };

    let target = target_date
        .and_time(trigger)
        .and_local_timezone(Local)
        .latest()
        .unwrap_or_else(|| {
            // DST gap: shift one hour and take whatever resolves
            Local
                .from_utc_datetime(&(target_date.and_time(trigger) + Duration::hours(1)))
        });

    let until = target.signed_duration_since(now);
    if until.num_seconds() <= 0 {
        // Should not happen; one-minute backstop to avoid a hot loop
        std::time::Duration::from_secs(60)
    } else {
        until.to_std().unwrap_or(std::time::Duration::from_secs(60))
    }
}
