//! Named-cache registry.
//!
//! Maps a string name to a lazily-created cache instance with first-writer-
//! wins semantics: the first `get_or_create` for a name fixes the instance
//! and its configuration; later calls return that instance and silently
//! ignore any configuration they pass.
//!
//! The registry is an explicit object so tests and applications can own
//! their lifecycle; [`global`] exposes the process-wide instance that the
//! `#[cached]` attribute delegates to.

use std::any::Any;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::debug;

use crate::cache::AsyncCache;
use crate::config::CacheConfig;

/// A process-scoped map from cache name to cache instance.
///
/// Instances of different key/value/error types can live side by side; each
/// name is bound to the concrete types of its first creation. Requesting an
/// existing name with different type parameters is a programmer error and
/// panics.
///
/// # Examples
///
/// ```
/// use memoflight_core::{CacheConfig, CacheRegistry};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let registry = CacheRegistry::new();
///
/// let users = registry.get_or_create::<u64, String, std::convert::Infallible>(
///     "users",
///     CacheConfig::new(Duration::from_secs(60)),
/// );
/// let name = users.get_or_put(7, || async { "ada".to_string() }).await;
/// assert_eq!(name, "ada");
///
/// // Same name, different config: the original instance wins.
/// let again = registry.get_or_create::<u64, String, std::convert::Infallible>(
///     "users",
///     CacheConfig::new(Duration::from_secs(1)),
/// );
/// assert_eq!(again.config().ttl, Duration::from_secs(60));
/// # }
/// ```
pub struct CacheRegistry {
    caches: RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self {
            caches: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cache registered under `name`, creating it with `config`
    /// on first use. Later callers get the original instance; their `config`
    /// is ignored (first-writer-wins).
    ///
    /// # Panics
    ///
    /// Panics if `name` is already bound to a cache with different
    /// key/value/error types.
    pub fn get_or_create<K, V, E>(&self, name: &str, config: CacheConfig) -> Arc<AsyncCache<K, V, E>>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        if let Some(existing) = self.caches.read().get(name) {
            return Self::downcast(name, existing);
        }

        let mut caches = self.caches.write();
        // Another task may have created the instance between the read and
        // the write lock; the first writer wins.
        if let Some(existing) = caches.get(name) {
            return Self::downcast(name, existing);
        }

        let cache = Arc::new(AsyncCache::<K, V, E>::new(config));
        caches.insert(name.to_string(), cache.clone());
        debug!(name, "created named cache");
        cache
    }

    /// Discards every named instance. Callers holding an `Arc` to a cache
    /// keep using it; the names are simply unbound.
    pub fn clear_all(&self) {
        self.caches.write().clear();
        debug!("registry cleared");
    }

    /// Number of named instances currently registered.
    pub fn len(&self) -> usize {
        self.caches.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.read().is_empty()
    }

    fn downcast<K, V, E>(name: &str, cache: &Arc<dyn Any + Send + Sync>) -> Arc<AsyncCache<K, V, E>>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        cache.clone().downcast::<AsyncCache<K, V, E>>().unwrap_or_else(|_| {
            panic!("named cache `{name}` already exists with different key/value/error types")
        })
    }
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_REGISTRY: Lazy<CacheRegistry> = Lazy::new(CacheRegistry::new);

/// The process-wide registry used by wrappers generated with `#[cached]`.
///
/// Prefer an explicitly owned [`CacheRegistry`] where lifecycle or test
/// isolation matters.
pub fn global() -> &'static CacheRegistry {
    &GLOBAL_REGISTRY
}
