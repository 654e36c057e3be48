//! # Memoflight
//!
//! An in-process, concurrency-safe cache for results of asynchronous
//! computations, with time-based expiration, optional bounded size with
//! FIFO/LRU eviction, and single-flight coalescing of concurrent identical
//! requests.
//!
//! ## Features
//!
//! - **TTL expiration**: entries expire lazily after a configured age; no
//!   background sweeper, no timers
//! - **Bounded size**: optional entry limit with FIFO or LRU victim
//!   selection
//! - **Single-flight coalescing**: concurrent calls for the same key share
//!   one producer invocation; the outcome, success or failure, reaches
//!   every waiter
//! - **Failures are never cached**: a producer error propagates unchanged
//!   and the next call runs the producer again
//! - **Named caches**: a registry maps names to lazily-created instances
//!   (first-writer-wins configuration)
//! - **`#[cached]` attribute**: declarative caching for async functions,
//!   delegating to the registry
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use memoflight::cached;
//!
//! #[cached(ttl = 60, max_size = 100, policy = "lru", coalesce = true)]
//! async fn fetch_weather(city: String) -> Weather {
//!     api::get_weather(&city).await
//! }
//! ```
//!
//! ## Using the engine directly
//!
//! ```
//! use memoflight::{AsyncCache, CacheConfig};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cache: AsyncCache<String, u32> =
//!     AsyncCache::new(CacheConfig::new(Duration::from_secs(60)));
//!
//! let value = cache.get_or_put("key".to_string(), || async { 42 }).await;
//! assert_eq!(value, 42);
//! # }
//! ```

// Re-export the attribute macro.
pub use memoflight_macros::cached;

// Re-export the core engine surface.
pub use memoflight_core::registry;
pub use memoflight_core::{
    AsyncCache, CacheConfig, CacheEntry, CacheRegistry, EvictionOrder, EvictionPolicy,
    DEFAULT_TTL_SECS,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::cached;
    pub use crate::{AsyncCache, CacheConfig, CacheRegistry, EvictionPolicy};
}
