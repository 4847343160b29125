//! Asynchronous single-value expiring cache.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use parking_lot::RwLock;
use tracing::{debug, instrument, warn};

use lapse_core::{AsyncMemoStore, CacheError, Clock, ClockReading, Lifetime, SystemClock};

use crate::config::{CacheConfig, RefreshPolicy};
use crate::entry::CacheEntry;
use crate::stats::{CacheStats, Counters};

/// Zero-argument loader that suspends, then produces a value or fails.
pub type AsyncLoader<T, E> = Box<dyn Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// A single value, reloaded lazily by an async loader.
///
/// # Concurrency
///
/// With the default [`RefreshPolicy::Concurrent`] there is no mutual
/// exclusion around the loader. Every caller that misses before a fresh
/// entry has been installed runs the loader itself, and each one installs
/// its own result; whichever write lands last is what later callers see.
/// Loaders used this way must be safe to run more than once at a time.
///
/// Once no refresh is in flight and the entry is fresh, every reader sees
/// the same value.
///
/// [`RefreshPolicy::Serialized`] puts misses behind an async mutex with a
/// re-check, giving the same one-loader-at-a-time behavior as
/// [`ExpiringCache`](crate::ExpiringCache).
///
/// [`put`](Self::put) and [`invalidate`](Self::invalidate) never wait on a
/// loader under either policy. A loader already in flight still installs its
/// result afterwards, and that later write wins.
///
/// # Cancellation
///
/// Dropping a `get` future, or cancelling it through
/// [`get_cancellable`](Self::get_cancellable), before the loader completes
/// installs nothing. The previous entry stays authoritative.
pub struct AsyncExpiringCache<T, E> {
    entry: RwLock<Option<Arc<CacheEntry<T>>>>,
    refresh: Option<tokio::sync::Mutex<()>>,
    loader: AsyncLoader<T, E>,
    clock: Arc<dyn Clock>,
    lifetime: Lifetime,
    counters: Counters,
}

impl<T, E> AsyncExpiringCache<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    /// Creates a cache driven by the system clock.
    pub fn new<F, Fut>(lifetime: Lifetime, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::with_clock(lifetime, loader, SystemClock)
    }

    /// Creates a cache driven by `clock`.
    pub fn with_clock<F, Fut, C>(lifetime: Lifetime, loader: F, clock: C) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        C: Clock + 'static,
    {
        Self {
            entry: RwLock::new(None),
            refresh: None,
            loader: Box::new(move || loader().boxed()),
            clock: Arc::new(clock),
            lifetime,
            counters: Counters::default(),
        }
    }

    /// Creates a cache from configuration, honoring its refresh policy.
    pub fn from_config<F, Fut, C>(
        config: &CacheConfig,
        loader: F,
        clock: C,
    ) -> lapse_core::Result<Self>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        C: Clock + 'static,
    {
        Ok(Self::with_clock(config.lifetime()?, loader, clock).with_policy(config.refresh))
    }

    /// Sets the refresh policy.
    pub fn with_policy(mut self, policy: RefreshPolicy) -> Self {
        self.refresh = match policy {
            RefreshPolicy::Concurrent => None,
            RefreshPolicy::Serialized => Some(tokio::sync::Mutex::new(())),
        };
        self
    }

    /// The active refresh policy.
    pub fn policy(&self) -> RefreshPolicy {
        match self.refresh {
            Some(_) => RefreshPolicy::Serialized,
            None => RefreshPolicy::Concurrent,
        }
    }

    /// Returns the cached value, loading it if absent or expired.
    pub async fn get(&self) -> Result<T, E> {
        if let Some(value) = self.peek() {
            self.counters.hit();
            debug!("Cache hit");
            return Ok(value);
        }
        self.counters.miss();
        debug!("Cache miss, loading");
        self.refresh().await
    }

    /// Like [`get`](Self::get), but gives up with
    /// [`CacheError::Cancelled`] as soon as `cancel` completes.
    ///
    /// A signal that is already complete wins over a fresh hit.
    pub async fn get_cancellable<S>(&self, cancel: S) -> Result<T, CacheError<E>>
    where
        S: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = cancel => {
                debug!("Retrieval cancelled");
                Err(CacheError::Cancelled)
            }
            result = self.get() => result.map_err(CacheError::Load),
        }
    }

    #[instrument(skip_all, fields(policy = ?self.policy()))]
    async fn refresh(&self) -> Result<T, E> {
        let _guard = match &self.refresh {
            Some(lock) => {
                let guard = lock.lock().await;
                if let Some(value) = self.peek() {
                    debug!("Entry refreshed while waiting");
                    return Ok(value);
                }
                Some(guard)
            }
            None => None,
        };

        let value = match (self.loader)().await {
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
    pub fn put(&self, value: T) {
        let expires_at = self.install(value);
        debug!(%expires_at, "Stored entry");
    }

    /// Drops the current entry so the next `get` loads.
    pub fn invalidate(&self) {
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

    // Unordered with respect to other installs: last write wins.
    fn install(&self, value: T) -> ClockReading {
        let entry = CacheEntry::new(value, self.clock.now(), &self.lifetime);
        let expires_at = entry.expires_at;
        *self.entry.write() = Some(Arc::new(entry));
        expires_at
    }
}

#[async_trait]
impl<T, E> AsyncMemoStore<(), T> for AsyncExpiringCache<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    async fn lookup(&self, _key: &()) -> Option<T> {
        self.peek()
    }

    async fn store(&self, _key: (), value: T) {
        self.put(value)
    }
}

impl<T, E> std::fmt::Debug for AsyncExpiringCache<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncExpiringCache")
            .field("lifetime", &self.lifetime)
            .field("serialized", &self.refresh.is_some())
            .field("expires_at", &self.entry.read().as_ref().map(|e| e.expires_at))
            .finish_non_exhaustive()
    }
}
