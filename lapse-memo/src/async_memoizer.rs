//! Asynchronous keyed memoization.

use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tracing::debug;

use lapse_core::AsyncMemoStore;

use crate::store::MapStore;

/// Key → value loader that suspends, then produces a value or fails.
pub type AsyncKeyLoader<K, V, E> = Box<dyn Fn(K) -> BoxFuture<'static, Result<V, E>> + Send + Sync>;

/// An async loader memoized over an async lookup/store pair.
///
/// Lookup, load, and store are awaited strictly in that order. Concurrent
/// calls for the same key are not deduplicated; each one that misses runs
/// the loader and stores its own result.
pub struct AsyncMemoizer<K, V, E, S> {
    loader: AsyncKeyLoader<K, V, E>,
    store: S,
}

impl<K, V, E, S> AsyncMemoizer<K, V, E, S>
where
    K: Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + 'static,
    E: Send + 'static,
    S: AsyncMemoStore<K, V>,
{
    /// Memoizes `loader` over `store`.
    pub fn new<F, Fut>(loader: F, store: S) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        Self {
            loader: Box::new(move |key| loader(key).boxed()),
            store,
        }
    }

    /// Returns the memoized value for `key`, loading it on a miss.
    pub async fn call(&self, key: K) -> Result<V, E> {
        if let Some(value) = self.store.lookup(&key).await {
            debug!(key = ?key, "Memo hit");
            return Ok(value);
        }

        debug!(key = ?key, "Memo miss, loading");
        let value = (self.loader)(key.clone()).await?;
        self.store.store(key, value.clone()).await;
        Ok(value)
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<K, V, E> AsyncMemoizer<K, V, E, MapStore<K, V>>
where
    K: Clone + Debug + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    /// Memoizes `loader` over a fresh, owned [`MapStore`].
    pub fn in_memory<F, Fut>(loader: F) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        Self::new(loader, MapStore::new())
    }
}

impl<K, V, E, S: std::fmt::Debug> std::fmt::Debug for AsyncMemoizer<K, V, E, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncMemoizer")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

/// Memoizes an async `loader` over `store` and returns the memoized
/// function.
pub fn memoize_async<K, V, E, F, Fut, S>(
    loader: F,
    store: S,
) -> impl Fn(K) -> BoxFuture<'static, Result<V, E>>
where
    K: Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + 'static,
    E: Send + 'static,
    F: Fn(K) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
    S: AsyncMemoStore<K, V> + 'static,
{
    let memoizer = Arc::new(AsyncMemoizer::new(loader, store));
    move |key| {
        let memoizer = memoizer.clone();
        async move { memoizer.call(key).await }.boxed()
    }
}
