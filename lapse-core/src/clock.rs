//! Time sources.
//!
//! Caches never read the system time directly. They ask a [`Clock`], which
//! lets tests move time forward without sleeping.

use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

/// A wall-clock instant as observed by a [`Clock`].
///
/// Readings from [`SystemClock`] are not guaranteed to be monotonic; the
/// caches only ever compare a reading against a stored expiry.
pub type ClockReading = DateTime<Utc>;

/// Abstraction over the current time.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> ClockReading;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> ClockReading {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now(&self) -> ClockReading {
        (**self).now()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SYSTEM CLOCK
// ═══════════════════════════════════════════════════════════════════════════════

/// The real wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> ClockReading {
        Utc::now()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLOSURE CLOCK
// ═══════════════════════════════════════════════════════════════════════════════

/// A clock whose reading comes from a caller-supplied closure.
///
/// ```rust
/// use lapse_core::{Clock, FnClock};
/// use chrono::{TimeZone, Utc};
///
/// let fixed = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let clock = FnClock::new(move || fixed);
/// assert_eq!(clock.now(), fixed);
/// ```
pub struct FnClock<F> {
    read: F,
}

impl<F> FnClock<F>
where
    F: Fn() -> ClockReading + Send + Sync,
{
    /// Wraps `read` as a clock.
    pub fn new(read: F) -> Self {
        Self { read }
    }
}

impl<F> Clock for FnClock<F>
where
    F: Fn() -> ClockReading + Send + Sync,
{
    fn now(&self) -> ClockReading {
        (self.read)()
    }
}

impl<F> std::fmt::Debug for FnClock<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnClock").finish_non_exhaustive()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MANUAL CLOCK
// ═══════════════════════════════════════════════════════════════════════════════

/// A test clock that only moves when told to.
///
/// Clones share the same reading, so one handle can be given to a cache
/// while the test keeps another to advance time.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Arc<RwLock<ClockReading>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    pub fn new(start: ClockReading) -> Self {
        Self {
            now: Arc::new(RwLock::new(start)),
        }
    }

    /// Sets the current reading.
    pub fn set(&self, now: ClockReading) {
        *self.now.write() = now;
    }

    /// Moves the clock forward by `by`.
    ///
    /// An advance that would overflow the representable range leaves the
    /// clock unchanged.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write();
        if let Some(next) = chrono::Duration::from_std(by)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
        {
            *now = next;
        }
    }
}

impl Default for ManualClock {
    /// Starts at the Unix epoch.
    fn default() -> Self {
        Self::new(DateTime::<Utc>::from(UNIX_EPOCH))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> ClockReading {
        *self.now.read()
    }
}
