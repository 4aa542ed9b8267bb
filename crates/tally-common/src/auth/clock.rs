//! Time source abstraction
//!
//! Token issuance and the expiry check read the time through [`Clock`], so
//! tests can drive token lifetimes without sleeping.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

/// Abstraction over the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock with second resolution
///
/// Clones share the same underlying time, so a clock handed to a service can
/// still be advanced by the test that created it.
#[derive(Clone)]
pub struct ManualClock {
    unix_seconds: Arc<AtomicI64>,
}

impl ManualClock {
    /// Create a clock frozen at the given time
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            unix_seconds: Arc::new(AtomicI64::new(start.timestamp())),
        }
    }

    /// Create a clock frozen at the current wall-clock second
    #[must_use]
    pub fn starting_now() -> Self {
        Self::new(Utc::now())
    }

    /// Move the clock forward (or backward, for a negative duration)
    ///
    /// Saturates at the ends of the representable range.
    pub fn advance(&self, by: Duration) {
        let step = by.num_seconds();
        let _ = self
            .unix_seconds
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |secs| {
                Some(clamp_seconds(secs.saturating_add(step)))
            });
    }

    pub fn set(&self, to: DateTime<Utc>) {
        self.unix_seconds.store(to.timestamp(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let secs = self.unix_seconds.load(Ordering::SeqCst);
        match Utc.timestamp_opt(secs, 0).single() {
            Some(now) => now,
            None if secs < 0 => DateTime::<Utc>::MIN_UTC,
            None => DateTime::<Utc>::MAX_UTC,
        }
    }
}

fn clamp_seconds(secs: i64) -> i64 {
    secs.clamp(
        DateTime::<Utc>::MIN_UTC.timestamp(),
        DateTime::<Utc>::MAX_UTC.timestamp(),
    )
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualClock")
            .field("now", &self.now())
            .finish()
    }
}
