use chrono::{DateTime, Utc};
use std::fmt;

/// Source of "now" for timestamps, expiry checks, and window cutoffs.
///
/// Production code uses [`SystemClock`]; tests inject a manual clock so
/// windows and timeouts are deterministic.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
