use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use memoflight_core::{AsyncCache, CacheConfig};
use tokio::sync::{Barrier, Notify};
use tokio::time::sleep;

fn coalescing_config() -> CacheConfig {
    CacheConfig::new(Duration::from_secs(60)).with_coalescing(true)
}

#[tokio::test]
async fn concurrent_callers_share_one_production() {
    let cache = Arc::new(AsyncCache::<u32, u32>::new(coalescing_config()));
    let calls = Arc::new(AtomicUsize::new(0));
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());

    let leader = {
        let cache = Arc::clone(&cache);
        let calls = Arc::clone(&calls);
        let started = Arc::clone(&started);
        let release = Arc::clone(&release);
        tokio::spawn(async move {
            cache
                .get_or_put(1, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    started.notify_one();
                    release.notified().await;
                    42
                })
                .await
        })
    };

    // Wait until the leader is inside its producer, then pile on waiters.
    started.notified().await;
    let mut waiters = Vec::new();
    for _ in 0..4 {
        let cache = Arc::clone(&cache);
        let calls = Arc::clone(&calls);
        waiters.push(tokio::spawn(async move {
            cache
                .get_or_put(1, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    0
                })
                .await
        }));
    }

    sleep(Duration::from_millis(50)).await;
    release.notify_one();

    assert_eq!(leader.await.unwrap(), 42);
    for waiter in waiters {
        assert_eq!(waiter.await.unwrap(), 42);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    // Only the leader wrote to the store.
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn distinct_keys_fly_independently() {
    let cache = Arc::new(AsyncCache::<u32, u32>::new(coalescing_config()));
    let barrier = Arc::new(Barrier::new(2));

    let mut tasks = Vec::new();
    for key in [1u32, 2u32] {
        let cache = Arc::clone(&cache);
        let barrier = Arc::clone(&barrier);
        tasks.push(tokio::spawn(async move {
            cache
                .get_or_put(key, move || async move {
                    // Both productions must be in flight at once, which can
                    // only happen if the flights do not share a channel.
                    barrier.wait().await;
                    key * 10
                })
                .await
        }));
    }

    let results: Vec<u32> = futures_join(tasks).await;
    assert_eq!(results, vec![10, 20]);
}

async fn futures_join(tasks: Vec<tokio::task::JoinHandle<u32>>) -> Vec<u32> {
    let mut out = Vec::with_capacity(tasks.len());
    for task in tasks {
        out.push(task.await.unwrap());
    }
    out
}

#[tokio::test]
async fn coalesced_failure_reaches_every_waiter() {
    let cache = Arc::new(AsyncCache::<u32, u32, String>::new(coalescing_config()));
    let calls = Arc::new(AtomicUsize::new(0));
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());

    let leader = {
        let cache = Arc::clone(&cache);
        let calls = Arc::clone(&calls);
        let started = Arc::clone(&started);
        let release = Arc::clone(&release);
        tokio::spawn(async move {
            cache
                .try_get_or_put(1, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    started.notify_one();
                    release.notified().await;
                    Err("boom".to_string())
                })
                .await
        })
    };

    started.notified().await;
    let mut waiters = Vec::new();
    for _ in 0..3 {
        let cache = Arc::clone(&cache);
        let calls = Arc::clone(&calls);
        waiters.push(tokio::spawn(async move {
            cache
                .try_get_or_put(1, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(0)
                })
                .await
        }));
    }

    sleep(Duration::from_millis(50)).await;
    release.notify_one();

    assert_eq!(leader.await.unwrap(), Err("boom".to_string()));
    for waiter in waiters {
        assert_eq!(waiter.await.unwrap(), Err("boom".to_string()));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 0);

    // The failure was not cached, so the next call runs the producer again.
    let retried = cache
        .try_get_or_put(1, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(7) }
        })
        .await;
    assert_eq!(retried, Ok(7));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn aborted_waiter_leaves_the_flight_intact() {
    let cache = Arc::new(AsyncCache::<u32, u32>::new(coalescing_config()));
    let calls = Arc::new(AtomicUsize::new(0));
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());

    let leader = {
        let cache = Arc::clone(&cache);
        let calls = Arc::clone(&calls);
        let started = Arc::clone(&started);
        let release = Arc::clone(&release);
        tokio::spawn(async move {
            cache
                .get_or_put(1, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    started.notify_one();
                    release.notified().await;
                    42
                })
                .await
        })
    };

    started.notified().await;
    let spawn_waiter = |cache: Arc<AsyncCache<u32, u32>>, calls: Arc<AtomicUsize>| {
        tokio::spawn(async move {
            cache
                .get_or_put(1, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    0
                })
                .await
        })
    };
    let doomed = spawn_waiter(Arc::clone(&cache), Arc::clone(&calls));
    let survivor = spawn_waiter(Arc::clone(&cache), Arc::clone(&calls));

    sleep(Duration::from_millis(50)).await;
    doomed.abort();
    assert!(doomed.await.unwrap_err().is_cancelled());

    release.notify_one();
    assert_eq!(leader.await.unwrap(), 42);
    assert_eq!(survivor.await.unwrap(), 42);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn aborted_leader_hands_off_to_a_waiter() {
    let cache = Arc::new(AsyncCache::<u32, u32>::new(coalescing_config()));
    let calls = Arc::new(AtomicUsize::new(0));
    let started = Arc::new(Notify::new());
    let stall = Arc::new(Notify::new());

    let leader = {
        let cache = Arc::clone(&cache);
        let calls = Arc::clone(&calls);
        let started = Arc::clone(&started);
        let stall = Arc::clone(&stall);
        tokio::spawn(async move {
            cache
                .get_or_put(1, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    started.notify_one();
                    // Never released: this production only ends by abort.
                    stall.notified().await;
                    1
                })
                .await
        })
    };

    started.notified().await;
    let waiter = {
        let cache = Arc::clone(&cache);
        let calls = Arc::clone(&calls);
        tokio::spawn(async move {
            cache
                .get_or_put(1, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    2
                })
                .await
        })
    };

    sleep(Duration::from_millis(50)).await;
    leader.abort();
    assert!(leader.await.unwrap_err().is_cancelled());

    // The waiter observes the closed channel, retries, and leads the next
    // production itself.
    assert_eq!(waiter.await.unwrap(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.get(&1), Some(2));
}

#[tokio::test]
async fn without_coalescing_each_caller_produces() {
    let cache = Arc::new(AsyncCache::<u32, u32>::new(CacheConfig::new(
        Duration::from_secs(60),
    )));
    let calls = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(2));

    let mut tasks = Vec::new();
    for _ in 0..2 {
        let cache = Arc::clone(&cache);
        let calls = Arc::clone(&calls);
        let barrier = Arc::clone(&barrier);
        tasks.push(tokio::spawn(async move {
            cache
                .get_or_put(1, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    // Both producers run concurrently when coalescing is off.
                    barrier.wait().await;
                    9
                })
                .await
        }));
    }

    for task in tasks {
        assert_eq!(task.await.unwrap(), 9);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.len(), 1);
}
