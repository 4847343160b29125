//! Error types for lapse.
//!
//! Configuration problems surface as [`LapseError`]. Failures of a single
//! cache or memoizer call surface as the loader's own error, or as
//! [`CacheError`] when the call can also be cancelled. Neither is ever
//! stored in a cache entry.

use thiserror::Error;

/// Result type alias using `LapseError`.
pub type Result<T> = std::result::Result<T, LapseError>;

/// Construction and configuration errors.
#[derive(Debug, Error)]
pub enum LapseError {
    /// The requested lifetime cannot be represented.
    #[error("Invalid lifetime of {millis}ms: {reason}")]
    InvalidLifetime {
        /// Requested lifetime in milliseconds
        millis: u128,
        /// Why it was rejected
        reason: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Failure of one retrieval call.
///
/// Local to the call that produced it; the cache is left exactly as it was
/// before the call.
#[derive(Debug, Error)]
pub enum CacheError<E> {
    /// The loader returned an error.
    #[error("Loader failed: {0}")]
    Load(E),

    /// The call was cancelled before the loader completed.
    #[error("Cancelled before the loader completed")]
    Cancelled,
}

impl<E> CacheError<E> {
    /// Returns true if the call was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CacheError::Cancelled)
    }

    /// Returns the loader error, if this was a load failure.
    pub fn into_load(self) -> Option<E> {
        match self {
            CacheError::Load(e) => Some(e),
            CacheError::Cancelled => None,
        }
    }
}
