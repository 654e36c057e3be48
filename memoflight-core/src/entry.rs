use std::time::{Duration, Instant};

/// Immutable pairing of a cached value and its creation time.
///
/// Each value stored in an [`crate::AsyncCache`] is wrapped in a `CacheEntry`
/// which records the creation timestamp using `Instant::now()`. Entries are
/// replaced wholesale on reload and never mutated in place.
///
/// # Examples
///
/// ```
/// use memoflight_core::CacheEntry;
/// use std::time::Duration;
///
/// let entry = CacheEntry::new(42);
/// assert_eq!(entry.value, 42);
///
/// // A fresh entry is well within a one-minute TTL.
/// assert!(!entry.is_expired(Duration::from_secs(60)));
/// ```
#[derive(Clone, Debug)]
pub struct CacheEntry<V> {
    pub value: V,
    created_at: Instant,
}

impl<V> CacheEntry<V> {
    /// Wraps a value with the current timestamp.
    pub fn new(value: V) -> Self {
        Self {
            value,
            created_at: Instant::now(),
        }
    }

    /// Returns true iff the entry is older than `ttl`.
    ///
    /// The comparison is strict: an entry aged exactly `ttl` is still fresh.
    /// A TTL of zero is never evaluated here; the engine bypasses caching
    /// entirely in that configuration.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }

    /// Time elapsed since this entry was created.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}
