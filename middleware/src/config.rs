//! Middleware configuration.

use std::time::Duration;

/// Default cache lifetime: 600 000 ms (ten minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(600_000);

/// Environment variable overriding the cache TTL, in milliseconds.
pub const CACHE_TTL_ENV: &str = "NETCACHE_CACHE_TTL_MS";

/// Configuration for [`NetworkCacheMiddleware`](crate::NetworkCacheMiddleware)
/// instances.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use netcache_middleware::MiddlewareConfig;
///
/// let config = MiddlewareConfig::default()
///     .with_cache_ttl(Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiddlewareConfig {
    /// How long a cached success stays fresh
    pub cache_ttl: Duration,
}

impl MiddlewareConfig {
    /// Set the cache TTL
    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Build a configuration from the environment.
    ///
    /// Reads [`CACHE_TTL_ENV`] as milliseconds; an unset or non-numeric
    /// value falls back to [`DEFAULT_CACHE_TTL`].
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_ttl_override(std::env::var(CACHE_TTL_ENV).ok().as_deref())
    }

    /// Build a configuration from a raw TTL override.
    ///
    /// `None` or anything that fails to parse as milliseconds falls back to
    /// [`DEFAULT_CACHE_TTL`].
    #[must_use]
    pub fn from_ttl_override(raw: Option<&str>) -> Self {
        let cache_ttl = raw
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .map_or(DEFAULT_CACHE_TTL, Duration::from_millis);

        Self { cache_ttl }
    }
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}
