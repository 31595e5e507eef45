//! Cache configuration with per-field fallback. Construction never fails:
//! an out-of-range field falls back to its default with a warning, so a
//! misconfigured caller still gets a working cache.

use std::time::Duration;

/// Tuning knobs for one cache instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Upper bound on resident entries. Must be positive.
    pub max_size: usize,
    /// Expiration applied when `set` is called without a TTL. Must be positive.
    pub default_ttl: Duration,
    /// How often the background task sweeps expired entries. Must be positive.
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            max_size: 1000,
            default_ttl: Duration::from_secs(5 * 60),
            cleanup_interval: Duration::from_secs(30),
        }
    }
}

impl CacheConfig {
    /// Replace out-of-range fields with their defaults, warning per field.
    pub(crate) fn normalized(self) -> CacheConfig {
        let defaults = CacheConfig::default();
        let mut config = self;

        if config.max_size == 0 {
            tracing::warn!(
                "cache config: max_size must be positive, falling back to {}",
                defaults.max_size
            );
            config.max_size = defaults.max_size;
        }
        if config.default_ttl.is_zero() {
            tracing::warn!(
                "cache config: default_ttl must be positive, falling back to {:?}",
                defaults.default_ttl
            );
            config.default_ttl = defaults.default_ttl;
        }
        if config.cleanup_interval.is_zero() {
            tracing::warn!(
                "cache config: cleanup_interval must be positive, falling back to {:?}",
                defaults.cleanup_interval
            );
            config.cleanup_interval = defaults.cleanup_interval;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Defaults match the documented values.
    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.max_size, 1000);
        assert_eq!(config.default_ttl, Duration::from_secs(300));
        assert_eq!(config.cleanup_interval, Duration::from_secs(30));
    }

    /// Each invalid field falls back independently.
    #[test]
    fn test_normalized_fallback() {
        let config = CacheConfig {
            max_size: 0,
            default_ttl: Duration::ZERO,
            cleanup_interval: Duration::from_secs(7),
        }
        .normalized();

        assert_eq!(config.max_size, 1000);
        assert_eq!(config.default_ttl, Duration::from_secs(300));
        assert_eq!(config.cleanup_interval, Duration::from_secs(7));
    }

    /// Valid values pass through untouched.
    #[test]
    fn test_normalized_passthrough() {
        let config = CacheConfig {
            max_size: 3,
            default_ttl: Duration::from_millis(50),
            cleanup_interval: Duration::from_millis(10),
        };
        assert_eq!(config.clone().normalized(), config);
    }
}
