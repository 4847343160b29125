//! # Lapse Core
//!
//! Foundational pieces shared by the lapse caches and memoizers.
//!
//! - **Clock**: injectable time source, real or test-driven
//! - **Lifetime**: fixed entry lifetime and the freshness rule
//! - **Errors**: configuration errors and the per-call `CacheError`
//! - **Traits**: the lookup/store capability memoizers run on
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use lapse_core::{Clock, Lifetime, ManualClock};
//!
//! let clock = ManualClock::default();
//! let lifetime = Lifetime::new(Duration::from_secs(5)).unwrap();
//! let expires_at = lifetime.expires_at(clock.now());
//!
//! clock.advance(Duration::from_secs(4));
//! assert!(Lifetime::is_fresh(expires_at, clock.now()));
//! clock.advance(Duration::from_secs(1));
//! assert!(!Lifetime::is_fresh(expires_at, clock.now()));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod clock;
pub mod error;
pub mod lifetime;
pub mod traits;

// Re-export commonly used items at crate root
pub use clock::{Clock, ClockReading, FnClock, ManualClock, SystemClock};
pub use error::{CacheError, LapseError, Result};
pub use lifetime::Lifetime;
pub use traits::*;
