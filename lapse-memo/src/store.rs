//! Ready-made lookup/store implementations.

use std::future::Future;
use std::hash::Hash;

use async_trait::async_trait;
use dashmap::DashMap;

use lapse_core::{AsyncMemoStore, MemoStore};

// ═══════════════════════════════════════════════════════════════════════════════
// MAP STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Owned, never-expiring key → value map.
///
/// Lives as long as whoever owns it, typically the memoizer it backs.
#[derive(Debug)]
pub struct MapStore<K, V>
where
    K: Eq + Hash,
{
    entries: DashMap<K, V>,
}

impl<K, V> MapStore<K, V>
where
    K: Eq + Hash,
{
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Creates a store with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(capacity),
        }
    }

    /// Returns the number of stored values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if `key` has a stored value.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Removes every stored value.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl<K, V> Default for MapStore<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> MemoStore<K, V> for MapStore<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn lookup(&self, key: &K) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn store(&self, key: K, value: V) {
        self.entries.insert(key, value);
    }
}

#[async_trait]
impl<K, V> AsyncMemoStore<K, V> for MapStore<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn lookup(&self, key: &K) -> Option<V> {
        MemoStore::lookup(self, key)
    }

    async fn store(&self, key: K, value: V) {
        MemoStore::store(self, key, value)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLOSURE STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// A lookup closure and a store closure used together as a [`MemoStore`].
pub struct FnStore<L, S> {
    lookup: L,
    store: S,
}

impl<L, S> FnStore<L, S> {
    /// Pairs `lookup` with `store`.
    pub fn new(lookup: L, store: S) -> Self {
        Self { lookup, store }
    }
}

impl<K, V, L, S> MemoStore<K, V> for FnStore<L, S>
where
    L: Fn(&K) -> Option<V> + Send + Sync,
    S: Fn(K, V) + Send + Sync,
{
    fn lookup(&self, key: &K) -> Option<V> {
        (self.lookup)(key)
    }

    fn store(&self, key: K, value: V) {
        (self.store)(key, value)
    }
}

impl<L, S> std::fmt::Debug for FnStore<L, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStore").finish_non_exhaustive()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ASYNC CLOSURE STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// A suspending lookup closure and a suspending store closure used together
/// as an [`AsyncMemoStore`].
///
/// `lookup` receives an owned copy of the key so the future it returns does
/// not borrow from the caller.
pub struct AsyncFnStore<L, S> {
    lookup: L,
    store: S,
}

impl<L, S> AsyncFnStore<L, S> {
    /// Pairs `lookup` with `store`.
    pub fn new(lookup: L, store: S) -> Self {
        Self { lookup, store }
    }
}

#[async_trait]
impl<K, V, L, LFut, S, SFut> AsyncMemoStore<K, V> for AsyncFnStore<L, S>
where
    K: Clone + Send + Sync + 'static,
    V: Send + 'static,
    L: Fn(K) -> LFut + Send + Sync,
    LFut: Future<Output = Option<V>> + Send + 'static,
    S: Fn(K, V) -> SFut + Send + Sync,
    SFut: Future<Output = ()> + Send + 'static,
{
    async fn lookup(&self, key: &K) -> Option<V> {
        (self.lookup)(key.clone()).await
    }

    async fn store(&self, key: K, value: V) {
        (self.store)(key, value).await
    }
}

impl<L, S> std::fmt::Debug for AsyncFnStore<L, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncFnStore").finish_non_exhaustive()
    }
}
