//! Clocks and timestamp handling.
//!
//! Freshness depends on wall-clock time, so "now" is injected through the
//! [`Clock`] trait. Production uses [`SystemClock`]; deterministic runs pin
//! the instant with [`FixedClock`].

use std::fmt;

use chrono::{DateTime, Utc};

/// Seconds in one day, as used for fractional age.
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Source of the current instant.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant.
///
/// # Examples
///
/// ```
/// use ownership_reconcile::time::{Clock, FixedClock};
/// use chrono::{TimeZone, Utc};
///
/// let at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
/// let clock = FixedClock::new(at);
/// assert_eq!(clock.now(), at);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    /// Creates a clock pinned at `at`.
    #[must_use]
    pub const fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Parses an RFC 3339 timestamp into UTC.
///
/// Returns `None` for anything chrono rejects, including the empty string.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Fractional days elapsed between `then` and `now`.
///
/// Negative when `then` lies in the future.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn age_in_days(then: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let elapsed = now.signed_duration_since(then);
    let millis = elapsed.num_milliseconds();
    millis as f64 / 1000.0 / SECONDS_PER_DAY
}
