//! The cached value and its expiry.

use lapse_core::{ClockReading, Lifetime};

/// One installed value.
///
/// Immutable once installed; a refresh replaces the whole entry.
#[derive(Debug)]
pub(crate) struct CacheEntry<T> {
    pub(crate) value: T,
    pub(crate) expires_at: ClockReading,
}

impl<T> CacheEntry<T> {
    pub(crate) fn new(value: T, installed_at: ClockReading, lifetime: &Lifetime) -> Self {
        Self {
            value,
            expires_at: lifetime.expires_at(installed_at),
        }
    }

    pub(crate) fn is_fresh(&self, now: ClockReading) -> bool {
        Lifetime::is_fresh(self.expires_at, now)
    }
}
