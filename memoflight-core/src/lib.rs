//! # Memoflight Core
//!
//! Core engine for the memoflight caching library: an in-process,
//! concurrency-safe cache for results of asynchronous computations.
//!
//! ## Features
//!
//! - **TTL expiration**: entries go stale after a configured age; expiry is
//!   purely lazy, checked on access, with no background sweeper
//! - **Bounded size**: optional entry limit with FIFO or LRU eviction
//! - **Single-flight coalescing**: concurrent requests for the same key
//!   share one producer invocation, success or failure alike
//! - **Named caches**: a registry mapping names to lazily-created instances
//!   with first-writer-wins configuration
//!
//! ## Module Organization
//!
//! - [`entry`](CacheEntry) - a cached value paired with its creation time
//! - [`policy`](EvictionPolicy) - NONE/FIFO/LRU policies and the eviction
//!   order tracker
//! - [`cache`](AsyncCache) - the engine orchestrating store, expiration,
//!   eviction, and coalescing under one lock per instance
//! - [`registry`] - the named-cache registry
//!
//! Most users want the `memoflight` facade crate and its `#[cached]`
//! attribute rather than this crate directly.

mod cache;
mod config;
mod entry;
mod in_flight;
mod policy;
pub mod registry;

pub use cache::AsyncCache;
pub use config::{CacheConfig, DEFAULT_TTL_SECS};
pub use entry::CacheEntry;
pub use policy::{EvictionOrder, EvictionPolicy};
pub use registry::CacheRegistry;
