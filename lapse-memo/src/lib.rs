//! # Lapse Memo
//!
//! Turns a key → value loader into a memoized function over any
//! lookup/store pair.
//!
//! The memoizer owns no entries and no lock. Whatever the store does about
//! expiry or exclusivity is what the memoized function gets: a [`MapStore`]
//! remembers forever, while a `lapse_cache` cache keyed by `()` forgets
//! when its lifetime passes.
//!
//! ## Example
//!
//! ```rust
//! use lapse_memo::Memoizer;
//!
//! let square = Memoizer::in_memory(|n: &u64| Ok::<_, std::convert::Infallible>(n * n));
//! assert_eq!(square.call(12).unwrap(), 144);
//! assert_eq!(square.store().len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod async_memoizer;
mod memoizer;
mod store;
#[cfg(test)]
mod test_support;

pub use async_memoizer::{memoize_async, AsyncKeyLoader, AsyncMemoizer};
pub use lapse_core::{AsyncMemoStore, MemoStore};
pub use memoizer::{memoize, KeyLoader, Memoizer};
pub use store::{AsyncFnStore, FnStore, MapStore};
