//! Basic time-based caching with the `#[cached]` attribute.
//!
//! Run with: `cargo run --example basic_ttl`

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use memoflight::cached;
use tokio::time::sleep;

static CALLS: AtomicUsize = AtomicUsize::new(0);

#[cached(ttl = 2)]
async fn fetch_quote(symbol: String) -> f64 {
    CALLS.fetch_add(1, Ordering::SeqCst);
    // Stand-in for a remote call.
    sleep(Duration::from_millis(200)).await;
    match symbol.as_str() {
        "ACME" => 123.45,
        _ => 0.0,
    }
}

#[tokio::main]
async fn main() {
    println!("first call (miss): {}", fetch_quote("ACME".into()).await);
    println!("second call (hit): {}", fetch_quote("ACME".into()).await);
    println!("body ran {} time(s)", CALLS.load(Ordering::SeqCst));

    println!("waiting for the entry to expire...");
    sleep(Duration::from_secs(3)).await;

    println!("third call (expired): {}", fetch_quote("ACME".into()).await);
    println!("body ran {} time(s)", CALLS.load(Ordering::SeqCst));
}
