//! A bounded cache with LRU eviction, driven through the engine directly.
//!
//! Run with: `cargo run --example lru_eviction`

use std::time::Duration;

use memoflight::{AsyncCache, CacheConfig, EvictionPolicy};

#[tokio::main]
async fn main() {
    let cache: AsyncCache<&str, String> = AsyncCache::new(
        CacheConfig::new(Duration::from_secs(60))
            .with_max_size(2)
            .with_policy(EvictionPolicy::LRU),
    );

    cache
        .get_or_put("alpha", || async { "first".to_string() })
        .await;
    cache
        .get_or_put("beta", || async { "second".to_string() })
        .await;

    // Touch "alpha" so "beta" becomes the least recently used entry.
    println!("alpha = {:?}", cache.get(&"alpha"));

    cache
        .get_or_put("gamma", || async { "third".to_string() })
        .await;

    println!("after inserting gamma (capacity 2):");
    println!("  alpha = {:?}", cache.get(&"alpha"));
    println!("  beta  = {:?}", cache.get(&"beta"));
    println!("  gamma = {:?}", cache.get(&"gamma"));
    println!("  size  = {}", cache.len());
}
