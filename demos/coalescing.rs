//! Single-flight coalescing: ten concurrent callers, one execution.
//!
//! Run with: `cargo run --example coalescing`

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use memoflight::cached;
use tokio::time::sleep;

static CALLS: AtomicUsize = AtomicUsize::new(0);

#[cached(ttl = 30, coalesce = true)]
async fn load_profile(user_id: u64) -> String {
    CALLS.fetch_add(1, Ordering::SeqCst);
    // A slow backend call; every concurrent caller for the same id waits
    // for this one execution instead of issuing its own.
    sleep(Duration::from_millis(300)).await;
    format!("profile-{user_id}")
}

#[tokio::main]
async fn main() {
    let tasks: Vec<_> = (0..10)
        .map(|i| {
            tokio::spawn(async move {
                let profile = load_profile(42).await;
                println!("caller {i:2} got {profile}");
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }

    println!("body executed {} time(s)", CALLS.load(Ordering::SeqCst));
}
