//! Synchronous keyed memoization.

use std::fmt::Debug;
use std::hash::Hash;

use tracing::debug;

use lapse_core::MemoStore;

use crate::store::MapStore;

/// Key → value loader that may fail.
pub type KeyLoader<K, V, E> = Box<dyn Fn(&K) -> Result<V, E> + Send + Sync>;

/// A loader memoized over a lookup/store pair.
///
/// Each call looks the key up first. On a hit the stored value is returned
/// unchanged. On a miss the loader runs, and only a successful result is
/// stored before being returned.
///
/// No locking happens here: two callers missing the same key at once both
/// run the loader. Back the memoizer with a store that has its own
/// concurrency contract if that matters.
pub struct Memoizer<K, V, E, S> {
    loader: KeyLoader<K, V, E>,
    store: S,
}

impl<K, V, E, S> Memoizer<K, V, E, S>
where
    K: Debug,
    V: Clone,
    S: MemoStore<K, V>,
{
    /// Memoizes `loader` over `store`.
    pub fn new<F>(loader: F, store: S) -> Self
    where
        F: Fn(&K) -> Result<V, E> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            store,
        }
    }

    /// Returns the memoized value for `key`, loading it on a miss.
    pub fn call(&self, key: K) -> Result<V, E> {
        if let Some(value) = self.store.lookup(&key) {
            debug!(key = ?key, "Memo hit");
            return Ok(value);
        }

        debug!(key = ?key, "Memo miss, loading");
        let value = (self.loader)(&key)?;
        self.store.store(key, value.clone());
        Ok(value)
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the memoizer and returns its store.
    pub fn into_store(self) -> S {
        self.store
    }
}

impl<K, V, E> Memoizer<K, V, E, MapStore<K, V>>
where
    K: Debug + Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    /// Memoizes `loader` over a fresh, owned [`MapStore`].
    ///
    /// Values are kept for the memoizer's lifetime and never expire.
    pub fn in_memory<F>(loader: F) -> Self
    where
        F: Fn(&K) -> Result<V, E> + Send + Sync + 'static,
    {
        Self::new(loader, MapStore::new())
    }
}

impl<K, V, E, S: std::fmt::Debug> std::fmt::Debug for Memoizer<K, V, E, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memoizer")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

/// Memoizes `loader` over `store` and returns the memoized function.
///
/// ```rust
/// use lapse_memo::{memoize, MapStore};
///
/// let len = memoize(|s: &String| Ok::<_, ()>(s.len()), MapStore::new());
/// assert_eq!(len("hello".to_string()), Ok(5));
/// ```
pub fn memoize<K, V, E, F, S>(loader: F, store: S) -> impl Fn(K) -> Result<V, E>
where
    K: Debug,
    V: Clone,
    F: Fn(&K) -> Result<V, E> + Send + Sync + 'static,
    S: MemoStore<K, V>,
{
    let memoizer = Memoizer::new(loader, store);
    move |key| memoizer.call(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use parking_lot::Mutex;
    use test_case::test_case;

    use crate::store::FnStore;
    use crate::test_support::EventCapture;

    fn counting_loader(
        calls: Arc<AtomicUsize>,
    ) -> impl Fn(&String) -> Result<String, String> + Send + Sync + 'static {
        move |key: &String| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(key.to_uppercase())
        }
    }

    #[test]
    fn test_hit_miss_accounting() {
        let calls = Arc::new(AtomicUsize::new(0));
        let memo = Memoizer::in_memory(counting_loader(calls.clone()));

        assert_eq!(memo.call("k".to_string()).unwrap(), "K");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(memo.store().contains(&"k".to_string()));

        assert_eq!(memo.call("k".to_string()).unwrap(), "K");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(memo.call("k2".to_string()).unwrap(), "K2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(memo.store().len(), 2);
    }

    #[test]
    fn test_failed_load_is_not_stored() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let memo = Memoizer::in_memory(move |key: &u32| {
            match counter.fetch_add(1, Ordering::SeqCst) {
                0 => Err("transient"),
                _ => Ok(key * 10),
            }
        });

        assert_eq!(memo.call(4), Err("transient"));
        assert!(memo.store().is_empty());
        assert_eq!(memo.call(4), Ok(40));
        assert_eq!(memo.store().len(), 1);
    }

    #[test]
    fn test_stored_value_returned_unchanged() {
        let store = MapStore::new();
        MemoStore::store(&store, 1u8, "preset".to_string());
        let memo = Memoizer::new(|_: &u8| Ok::<_, ()>("loaded".to_string()), store);

        assert_eq!(memo.call(1).unwrap(), "preset");
        assert_eq!(memo.call(2).unwrap(), "loaded");
    }

    #[test]
    fn test_store_only_after_lookup_miss() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let backing = Arc::new(Mutex::new(HashMap::new()));
        let (lookup_log, store_log) = (log.clone(), log.clone());
        let (reader, writer) = (backing.clone(), backing.clone());

        let store = FnStore::new(
            move |k: &u8| {
                lookup_log.lock().push(format!("lookup {k}"));
                reader.lock().get(k).copied()
            },
            move |k: u8, v: u16| {
                store_log.lock().push(format!("store {k}"));
                writer.lock().insert(k, v);
            },
        );
        let memo = Memoizer::new(|k: &u8| Ok::<_, ()>(u16::from(*k) * 2), store);

        memo.call(3).unwrap();
        memo.call(3).unwrap();

        assert_eq!(*log.lock(), vec!["lookup 3", "store 3", "lookup 3"]);
    }

    #[test_case(0, 0)]
    #[test_case(7, 49)]
    #[test_case(12, 144)]
    fn test_memoize_fn(input: u64, expected: u64) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let square = memoize(
            move |n: &u64| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>(n * n)
            },
            MapStore::new(),
        );

        assert_eq!(square(input), Ok(expected));
        assert_eq!(square(input), Ok(expected));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_logs_hit_and_miss_with_key() {
        let capture = EventCapture::default();
        let memo = Memoizer::in_memory(|n: &u32| Ok::<_, ()>(n + 1));

        tracing::subscriber::with_default(capture.subscriber(), || {
            memo.call(3).unwrap();
            memo.call(3).unwrap();
        });

        let misses = capture.find("Memo miss, loading");
        let hits = capture.find("Memo hit");
        assert_eq!(misses.len(), 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(misses[0].field("key"), Some("3"));
        assert_eq!(hits[0].field("key"), Some("3"));
        assert_eq!(hits[0].level, tracing::Level::DEBUG);
    }

    #[test]
    fn test_into_store() {
        let memo = Memoizer::in_memory(|n: &i32| Ok::<_, ()>(-n));
        memo.call(5).unwrap();
        let store = memo.into_store();
        assert_eq!(MemoStore::lookup(&store, &5), Some(-5));
    }
}
