//! Cache configuration.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use lapse_core::{LapseError, Lifetime, Result};

/// Environment variable holding the entry lifetime in milliseconds.
pub const ENV_LIFETIME_MS: &str = "LAPSE_CACHE_LIFETIME_MS";

/// Environment variable holding the async refresh policy.
pub const ENV_REFRESH: &str = "LAPSE_CACHE_REFRESH";

const DEFAULT_LIFETIME_MS: u64 = 60_000;

/// How an [`AsyncExpiringCache`](crate::AsyncExpiringCache) handles
/// concurrent misses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// Every caller that misses runs the loader; the last entry written wins.
    #[default]
    Concurrent,
    /// Misses queue on an async mutex so one loader runs at a time.
    Serialized,
}

impl FromStr for RefreshPolicy {
    type Err = LapseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "concurrent" => Ok(RefreshPolicy::Concurrent),
            "serialized" => Ok(RefreshPolicy::Serialized),
            other => Err(LapseError::ConfigError(format!(
                "unknown refresh policy '{other}'"
            ))),
        }
    }
}

/// Cache configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry lifetime in milliseconds
    pub lifetime_ms: u64,
    /// Async refresh policy (ignored by the synchronous cache)
    pub refresh: RefreshPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            lifetime_ms: DEFAULT_LIFETIME_MS,
            refresh: RefreshPolicy::Concurrent,
        }
    }
}

impl CacheConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the entry lifetime.
    pub fn with_lifetime(mut self, lifetime: std::time::Duration) -> Self {
        self.lifetime_ms = u64::try_from(lifetime.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Serializes async refreshes.
    pub fn serialized(mut self) -> Self {
        self.refresh = RefreshPolicy::Serialized;
        self
    }

    /// Validated lifetime.
    pub fn lifetime(&self) -> Result<Lifetime> {
        Lifetime::from_millis(self.lifetime_ms)
    }

    /// Reads `LAPSE_CACHE_LIFETIME_MS` and `LAPSE_CACHE_REFRESH`.
    ///
    /// Unset variables keep their defaults; malformed ones are an error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_LIFETIME_MS) {
            config.lifetime_ms = raw.trim().parse().map_err(|e| {
                LapseError::ConfigError(format!("{ENV_LIFETIME_MS}='{raw}': {e}"))
            })?;
        }
        if let Some(raw) = lookup(ENV_REFRESH) {
            config.refresh = raw.parse()?;
        }

        config.lifetime()?;
        Ok(config)
    }
}
