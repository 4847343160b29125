//! # Lapse Cache
//!
//! Single-value caches that reload lazily once their entry expires.
//!
//! Two variants with different concurrency contracts:
//!
//! - [`ExpiringCache`]: synchronous. At most one loader runs at a time;
//!   callers arriving during a refresh block and then see the new value.
//! - [`AsyncExpiringCache`]: asynchronous. By default concurrent callers that
//!   all miss may each run the loader, and the last entry written wins.
//!   [`RefreshPolicy::Serialized`] opts into one loader at a time.
//!
//! Expiry is driven by an injected [`lapse_core::Clock`].

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod async_cache;
mod cache;
mod config;
mod entry;
mod stats;
#[cfg(test)]
mod test_support;

pub use async_cache::{AsyncExpiringCache, AsyncLoader};
pub use cache::{ExpiringCache, Loader};
pub use config::{CacheConfig, RefreshPolicy, ENV_LIFETIME_MS, ENV_REFRESH};
pub use stats::CacheStats;
