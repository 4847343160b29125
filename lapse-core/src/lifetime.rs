//! Entry lifetime and the freshness rule.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::clock::ClockReading;
use crate::error::{LapseError, Result};

/// Fixed duration an entry stays fresh after it is loaded.
///
/// Expiry is always computed from the instant an entry was installed and is
/// never extended by reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lifetime {
    std: Duration,
    delta: chrono::Duration,
}

impl Lifetime {
    /// Creates a lifetime, rejecting durations chrono cannot represent.
    pub fn new(duration: Duration) -> Result<Self> {
        let delta = chrono::Duration::from_std(duration).map_err(|e| {
            LapseError::InvalidLifetime {
                millis: duration.as_millis(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            std: duration,
            delta,
        })
    }

    /// Creates a lifetime from whole milliseconds.
    pub fn from_millis(millis: u64) -> Result<Self> {
        Self::new(Duration::from_millis(millis))
    }

    /// The lifetime as a `std` duration.
    pub fn as_duration(&self) -> Duration {
        self.std
    }

    /// Expiry for an entry installed at `now`.
    ///
    /// Saturates at the latest representable instant.
    pub fn expires_at(&self, now: ClockReading) -> ClockReading {
        now.checked_add_signed(self.delta)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// True while `now` is strictly before `expires_at`.
    pub fn is_fresh(expires_at: ClockReading, now: ClockReading) -> bool {
        now < expires_at
    }
}
