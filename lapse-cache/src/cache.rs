//! Synchronous single-value expiring cache.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, instrument, warn};

use lapse_core::{Clock, ClockReading, Lifetime, MemoStore, SystemClock};

use crate::config::CacheConfig;
use crate::entry::CacheEntry;
use crate::stats::{CacheStats, Counters};

/// Zero-argument loader producing a fresh value or failing.
pub type Loader<T, E> = Box<dyn Fn() -> Result<T, E> + Send + Sync>;

/// A single value, reloaded lazily after its lifetime passes.
///
/// # Concurrency
///
/// At most one loader invocation runs at a time for a given cache. Callers
/// that miss while a refresh is in progress block until it finishes, then
/// return the freshly installed value without loading again.
///
/// A fresh hit only takes a shared read guard long enough to clone the
/// entry handle. It never waits on a running loader.
///
/// [`put`](Self::put) and [`invalidate`](Self::invalidate) take the same
/// lock as a refresh, so they wait for a running loader and land after its
/// entry. A loader must not call them on its own cache.
///
/// # Failures
///
/// A failed load installs nothing. The previous entry, expired or not, is
/// kept and the next call tries the loader again.
pub struct ExpiringCache<T, E> {
    entry: RwLock<Option<Arc<CacheEntry<T>>>>,
    refresh: Mutex<()>,
    loader: Loader<T, E>,
    clock: Arc<dyn Clock>,
    lifetime: Lifetime,
    counters: Counters,
}

impl<T, E> ExpiringCache<T, E>
where
    T: Clone,
{
    /// Creates a cache driven by the system clock.
    pub fn new<F>(lifetime: Lifetime, loader: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
    {
        Self::with_clock(lifetime, loader, SystemClock)
    }

    /// Creates a cache driven by `clock`.
    pub fn with_clock<F, C>(lifetime: Lifetime, loader: F, clock: C) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        C: Clock + 'static,
    {
        Self {
            entry: RwLock::new(None),
            refresh: Mutex::new(()),
            loader: Box::new(loader),
            clock: Arc::new(clock),
            lifetime,
            counters: Counters::default(),
        }
    }

    /// Creates a cache from configuration.
    pub fn from_config<F, C>(config: &CacheConfig, loader: F, clock: C) -> lapse_core::Result<Self>
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        C: Clock + 'static,
    {
        Ok(Self::with_clock(config.lifetime()?, loader, clock))
    }

    /// Returns the cached value, loading it if absent or expired.
    pub fn get(&self) -> Result<T, E> {
        if let Some(value) = self.peek() {
            self.counters.hit();
            debug!("Cache hit");
            return Ok(value);
        }
        self.counters.miss();
        debug!("Cache miss, loading");
        self.refresh()
    }

    #[instrument(skip_all, fields(lifetime_ms = self.lifetime.as_duration().as_millis() as u64))]
    fn refresh(&self) -> Result<T, E> {
        let _guard = self.refresh.lock();

        // Another caller may have refreshed while we waited.
        if let Some(value) = self.peek() {
            debug!("Entry refreshed while waiting");
            return Ok(value);
        }

        let value = match (self.loader)() {
            Ok(value) => value,
            Err(e) => {
                self.counters.load_failed();
                warn!(kept_previous = self.entry.read().is_some(), "Loader failed");
                return Err(e);
            }
        };
        self.counters.loaded();

        let expires_at = self.install(value.clone());
        debug!(%expires_at, "Installed fresh entry");
        Ok(value)
    }

    /// Returns the cached value if it is still fresh, without loading.
    pub fn peek(&self) -> Option<T> {
        let entry = self.entry.read().clone()?;
        entry
            .is_fresh(self.clock.now())
            .then(|| entry.value.clone())
    }

    /// Installs `value` directly, as if it had just been loaded.
    ///
    /// Waits for a running refresh to finish first.
    pub fn put(&self, value: T) {
        let _guard = self.refresh.lock();
        let expires_at = self.install(value);
        debug!(%expires_at, "Stored entry");
    }

    /// Drops the current entry so the next `get` loads.
    ///
    /// Waits for a running refresh to finish first.
    pub fn invalidate(&self) {
        let _guard = self.refresh.lock();
        *self.entry.write() = None;
    }

    /// Expiry of the current entry, fresh or not.
    pub fn expires_at(&self) -> Option<ClockReading> {
        self.entry.read().as_ref().map(|e| e.expires_at)
    }

    /// The configured lifetime.
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Returns retrieval statistics.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    // Expiry is read after the value exists, so load time never eats into
    // the lifetime.
    fn install(&self, value: T) -> ClockReading {
        let entry = CacheEntry::new(value, self.clock.now(), &self.lifetime);
        let expires_at = entry.expires_at;
        *self.entry.write() = Some(Arc::new(entry));
        expires_at
    }
}

impl<T, E> MemoStore<(), T> for ExpiringCache<T, E>
where
    T: Clone + Send + Sync,
{
    fn lookup(&self, _key: &()) -> Option<T> {
        self.peek()
    }

    fn store(&self, _key: (), value: T) {
        self.put(value)
    }
}

impl<T, E> std::fmt::Debug for ExpiringCache<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("lifetime", &self.lifetime)
            .field("expires_at", &self.entry.read().as_ref().map(|e| e.expires_at))
            .finish_non_exhaustive()
    }
}
