//! Lookup/store capabilities.
//!
//! A memoizer owns no entries. It runs on any type that can look a key up
//! and store a value for it: a plain map, a closure pair, or a single-value
//! expiring cache keyed by `()`.

use async_trait::async_trait;

// ═══════════════════════════════════════════════════════════════════════════════
// SYNCHRONOUS STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Key/value lookup and store used by a synchronous memoizer.
pub trait MemoStore<K, V>: Send + Sync {
    /// Returns the stored value for `key`, if any.
    fn lookup(&self, key: &K) -> Option<V>;

    /// Stores `value` under `key`.
    fn store(&self, key: K, value: V);
}

impl<K, V, S> MemoStore<K, V> for std::sync::Arc<S>
where
    S: MemoStore<K, V> + ?Sized,
{
    fn lookup(&self, key: &K) -> Option<V> {
        (**self).lookup(key)
    }

    fn store(&self, key: K, value: V) {
        (**self).store(key, value)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ASYNCHRONOUS STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Key/value lookup and store used by an asynchronous memoizer.
///
/// Both operations may suspend.
#[async_trait]
pub trait AsyncMemoStore<K, V>: Send + Sync
where
    K: Send + Sync + 'static,
    V: Send + 'static,
{
    /// Returns the stored value for `key`, if any.
    async fn lookup(&self, key: &K) -> Option<V>;

    /// Stores `value` under `key`.
    async fn store(&self, key: K, value: V);
}

#[async_trait]
impl<K, V, S> AsyncMemoStore<K, V> for std::sync::Arc<S>
where
    K: Send + Sync + 'static,
    V: Send + 'static,
    S: AsyncMemoStore<K, V> + ?Sized,
{
    async fn lookup(&self, key: &K) -> Option<V> {
        (**self).lookup(key).await
    }

    async fn store(&self, key: K, value: V) {
        (**self).store(key, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use parking_lot::Mutex;

    #[derive(Default)]
    struct VecStore(Mutex<HashMap<u32, String>>);

    impl MemoStore<u32, String> for VecStore {
        fn lookup(&self, key: &u32) -> Option<String> {
            self.0.lock().get(key).cloned()
        }

        fn store(&self, key: u32, value: String) {
            self.0.lock().insert(key, value);
        }
    }

    #[async_trait]
    impl AsyncMemoStore<u32, String> for VecStore {
        async fn lookup(&self, key: &u32) -> Option<String> {
            self.0.lock().get(key).cloned()
        }

        async fn store(&self, key: u32, value: String) {
            self.0.lock().insert(key, value);
        }
    }

    #[test]
    fn test_arc_store_delegates() {
        let store = Arc::new(VecStore::default());
        MemoStore::store(&store, 1u32, "one".to_string());
        assert_eq!(MemoStore::lookup(&store, &1u32).as_deref(), Some("one"));
        assert!(MemoStore::lookup(&store, &2u32).is_none());
    }

    #[test]
    fn test_arc_async_store_delegates() {
        let store = Arc::new(VecStore::default());
        tokio_test::block_on(async {
            AsyncMemoStore::store(&store, 7u32, "seven".to_string()).await;
            assert_eq!(
                AsyncMemoStore::lookup(&store, &7u32).await.as_deref(),
                Some("seven")
            );
        });
    }
}
