use std::time::Duration;

use crate::EvictionPolicy;

/// Default time-to-live, in seconds, used by [`CacheConfig::default`] and by
/// the `#[cached]` attribute when no `ttl` is given.
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Configuration for a single cache instance. Plain data, no behavior.
///
/// # Recognized options
///
/// * `ttl` - maximum age of an entry. A TTL of zero disables caching
///   entirely: every call runs the producer and nothing is ever stored.
/// * `max_size` - maximum number of entries; `0` means unbounded. The limit
///   only takes effect together with an eviction policy other than `NONE`.
/// * `policy` - victim selection strategy, see [`EvictionPolicy`].
/// * `coalesce` - deduplicate concurrent productions of the same key
///   (single-flight).
///
/// # Examples
///
/// ```
/// use memoflight_core::{CacheConfig, EvictionPolicy};
/// use std::time::Duration;
///
/// let config = CacheConfig::new(Duration::from_secs(60))
///     .with_max_size(100)
///     .with_policy(EvictionPolicy::LRU)
///     .with_coalescing(true);
///
/// assert_eq!(config.max_size, 100);
/// assert!(config.coalesce);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub max_size: usize,
    pub policy: EvictionPolicy,
    pub coalesce: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TTL_SECS))
    }
}

impl CacheConfig {
    /// Creates a configuration with the given TTL, no size limit, no
    /// eviction policy, and coalescing disabled.
    pub const fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            max_size: 0,
            policy: EvictionPolicy::NONE,
            coalesce: false,
        }
    }

    /// Sets the maximum number of entries. `0` means unbounded.
    #[must_use]
    pub const fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Sets the eviction policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: EvictionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Enables or disables single-flight coalescing.
    #[must_use]
    pub const fn with_coalescing(mut self, coalesce: bool) -> Self {
        self.coalesce = coalesce;
        self
    }

    /// True when the configuration disables caching outright (zero TTL).
    pub fn caching_disabled(&self) -> bool {
        self.ttl.is_zero()
    }

    /// True when a size limit is in force (nonzero limit and a real policy).
    pub fn bounded(&self) -> bool {
        self.max_size > 0 && self.policy != EvictionPolicy::NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_unbounded() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(DEFAULT_TTL_SECS));
        assert_eq!(config.max_size, 0);
        assert_eq!(config.policy, EvictionPolicy::NONE);
        assert!(!config.coalesce);
        assert!(!config.bounded());
    }

    #[test]
    fn zero_ttl_disables_caching() {
        let config = CacheConfig::new(Duration::ZERO);
        assert!(config.caching_disabled());
    }

    #[test]
    fn limit_without_policy_is_not_bounded() {
        let config = CacheConfig::new(Duration::from_secs(1)).with_max_size(10);
        assert!(!config.bounded());

        let config = config.with_policy(EvictionPolicy::FIFO);
        assert!(config.bounded());
    }
}
