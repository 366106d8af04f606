//! Time source used by every expiry and "in the past" comparison.
//!
//! Services never call `Utc::now()` directly. They receive a [`Clock`]
//! through the booking context so tests can pin or advance time.

use chrono::{DateTime, Utc};

/// Abstracts "now" for testability.
pub trait Clock: Send + Sync {
    /// Current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
