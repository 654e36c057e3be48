use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::future::Future;
use std::hash::Hash;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::config::CacheConfig;
use crate::entry::CacheEntry;
use crate::in_flight::{FlightTicket, InFlightRegistry};
use crate::policy::{EvictionOrder, EvictionPolicy};

/// A concurrency-safe cache for results of asynchronous computations, with
/// time-based expiration, optional bounded size with eviction, and optional
/// deduplication of concurrent identical requests (single-flight).
///
/// # Type Parameters
///
/// * `K` - The key type. Must implement `Eq + Hash + Clone`.
/// * `V` - The cached value type. Must implement `Clone`.
/// * `E` - The producer's error type, defaulting to [`Infallible`] for
///   producers that cannot fail. Must implement `Clone` so a single failure
///   can be handed to every coalesced waiter verbatim.
///
/// # Exclusion domain
///
/// The entry store, the in-flight registry, and the loaded-history set are
/// guarded together by one `parking_lot::Mutex` per cache instance. The lock
/// is held only for bookkeeping, never across a producer invocation or a
/// coalesced wait, so one slow producer cannot block fast-path reads of
/// unrelated keys.
///
/// # Expiration
///
/// Expiration is purely lazy: there is no background sweeper, and an expired
/// entry may linger in the store until the next read or write of its key.
/// A TTL of zero disables caching entirely; every call runs the producer.
///
/// # One-shot caching under bounded policies
///
/// With an eviction policy other than `NONE`, a key is written into the
/// store only the first time it is ever produced. If it later leaves the
/// store (eviction or expiry), a reproduction returns the fresh value to the
/// caller but does not re-insert it. [`AsyncCache::clear`] resets this
/// history along with everything else.
///
/// # Examples
///
/// ```
/// use memoflight_core::{AsyncCache, CacheConfig};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cache: AsyncCache<String, u32> =
///     AsyncCache::new(CacheConfig::new(Duration::from_secs(60)));
///
/// let value = cache.get_or_put("answer".to_string(), || async { 42 }).await;
/// assert_eq!(value, 42);
///
/// // Served from the cache; the producer does not run again.
/// let value = cache.get_or_put("answer".to_string(), || async { 0 }).await;
/// assert_eq!(value, 42);
/// # }
/// ```
pub struct AsyncCache<K, V, E = Infallible> {
    config: CacheConfig,
    state: Mutex<CacheState<K, V, E>>,
}

/// The triple guarded by the cache's single lock, plus the loaded-history
/// set that gates one-shot caching under bounded policies.
struct CacheState<K, V, E> {
    store: HashMap<K, CacheEntry<V>>,
    order: EvictionOrder<K>,
    in_flight: InFlightRegistry<K, V, E>,
    loaded: HashSet<K>,
}

impl<K, V, E> AsyncCache<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    /// Creates an empty cache with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            state: Mutex::new(CacheState {
                store: HashMap::new(),
                order: EvictionOrder::new(config.policy),
                in_flight: InFlightRegistry::new(),
                loaded: HashSet::new(),
            }),
        }
    }

    /// The configuration this instance was created with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the cached value for `key`, or produces it with `producer`.
    ///
    /// * A fresh cached value is returned without invoking the producer
    ///   (an LRU touch applies).
    /// * On a miss the producer runs outside the lock; a success is stored
    ///   (subject to the one-shot rule under bounded policies) and a failure
    ///   propagates unchanged, with nothing written anywhere.
    /// * With coalescing enabled, concurrent callers for the same key share
    ///   a single production: the leader invokes the producer and broadcasts
    ///   the outcome, success or failure, to every waiter. A waiter that is
    ///   cancelled affects nobody else; if the leader itself is cancelled
    ///   before settling, the key is released and the remaining waiters
    ///   start a fresh cycle.
    ///
    /// Failures are never cached, retried, or wrapped.
    ///
    /// # Examples
    ///
    /// ```
    /// use memoflight_core::{AsyncCache, CacheConfig};
    /// use std::time::Duration;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let cache: AsyncCache<u32, String, String> =
    ///     AsyncCache::new(CacheConfig::new(Duration::from_secs(60)));
    ///
    /// let err = cache
    ///     .try_get_or_put(1, || async { Err("boom".to_string()) })
    ///     .await;
    /// assert_eq!(err, Err("boom".to_string()));
    ///
    /// // The failure was not cached.
    /// assert_eq!(cache.get(&1), None);
    /// # }
    /// ```
    pub async fn try_get_or_put<F, Fut>(&self, key: K, producer: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        // Zero TTL bypasses the cache wholesale: no read, no write, no
        // coalescing.
        if self.config.caching_disabled() {
            return producer().await;
        }

        // The producer is consumed by at most one path below; joiners that
        // restart after a vanished leader keep it available for the retry.
        let mut producer = Some(producer);

        loop {
            let ticket = {
                let mut state = self.state.lock();
                if let Some(value) = state.lookup(&key, &self.config) {
                    trace!("cache hit");
                    return Ok(value);
                }
                trace!("cache miss");
                if self.config.coalesce {
                    Some(state.in_flight.acquire_or_join(&key))
                } else {
                    None
                }
            };

            match ticket {
                // Coalescing disabled: every concurrent miss produces
                // independently; writes are serialized, last one wins.
                None => {
                    let producer = producer.take().expect("producer consumed twice");
                    let value = producer().await?;
                    self.state
                        .lock()
                        .store_produced(&key, value.clone(), &self.config);
                    return Ok(value);
                }
                Some(FlightTicket::Join(mut rx)) => {
                    match rx.recv().await {
                        Ok(outcome) => return outcome,
                        // The leader vanished without settling (its task was
                        // cancelled). Start over; one of the former joiners
                        // becomes the next leader.
                        Err(_) => continue,
                    }
                }
                Some(FlightTicket::Lead(lease)) => {
                    let producer = producer.take().expect("producer consumed twice");

                    // Should this task be cancelled inside the producer, the
                    // guard releases the in-flight entry so the key is not
                    // left pending forever; the closed channel sends every
                    // joiner into a fresh cycle.
                    let mut guard = FlightGuard {
                        state: &self.state,
                        flight_id: lease.id,
                        key: Some(key.clone()),
                    };

                    let outcome = producer().await;

                    {
                        let mut state = self.state.lock();
                        state.in_flight.release(&key, lease.id);
                        if let Ok(value) = &outcome {
                            state.store_produced(&key, value.clone(), &self.config);
                        }
                    }
                    guard.key = None; // settled; nothing left to clean up

                    // Joiners may all have gone away; a send error is fine.
                    let _ = lease.tx.send(outcome.clone());
                    trace!("flight settled");
                    return outcome;
                }
            }
        }
    }

    /// Read-only lookup: the value if present and fresh, `None` otherwise.
    ///
    /// An expired entry found here is removed from the store and the
    /// eviction order. Never triggers a production and never fails.
    pub fn get(&self, key: &K) -> Option<V> {
        self.state.lock().lookup(key, &self.config)
    }

    /// Removes a single entry, if present. The loaded-history set is left
    /// untouched, exactly as if the entry had been evicted.
    pub fn invalidate(&self, key: &K) {
        let mut state = self.state.lock();
        if state.store.remove(key).is_some() {
            state.order.remove(key);
            trace!("entry invalidated");
        }
    }

    /// Empties the store, the in-flight registry, and the loaded-history
    /// set. A production already underway still settles its own waiters;
    /// every call after the clear starts a fresh cycle.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.store.clear();
        state.order.clear();
        state.in_flight.clear();
        state.loaded.clear();
        debug!("cache cleared");
    }

    /// Current store cardinality. Expired-but-unvisited entries still count.
    pub fn len(&self) -> usize {
        self.state.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().store.is_empty()
    }
}

impl<K, V> AsyncCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// [`AsyncCache::try_get_or_put`] for producers that cannot fail.
    ///
    /// # Examples
    ///
    /// ```
    /// use memoflight_core::{AsyncCache, CacheConfig};
    /// use std::time::Duration;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let cache: AsyncCache<u32, u32> =
    ///     AsyncCache::new(CacheConfig::new(Duration::from_secs(60)));
    /// assert_eq!(cache.get_or_put(2, || async { 4 }).await, 4);
    /// # }
    /// ```
    pub async fn get_or_put<F, Fut>(&self, key: K, producer: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        match self
            .try_get_or_put(key, || async move { Ok::<_, Infallible>(producer().await) })
            .await
        {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }
}

impl<K, V, E> CacheState<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    /// Fast path: a fresh entry's value, with the LRU touch applied. An
    /// expired entry is dropped from the store and the order on the spot.
    fn lookup(&mut self, key: &K, config: &CacheConfig) -> Option<V> {
        let entry = self.store.get(key)?;
        if entry.is_expired(config.ttl) {
            self.store.remove(key);
            self.order.remove(key);
            trace!("expired entry dropped");
            return None;
        }
        let value = entry.value.clone();
        self.order.record_access(key);
        Some(value)
    }

    /// Records a successful production: writes the entry (subject to the
    /// one-shot rule), updates the eviction order, enforces the size limit,
    /// and marks the key as loaded. All under the caller-held lock, so the
    /// insertion and the eviction it may trigger are atomic.
    fn store_produced(&mut self, key: &K, value: V, config: &CacheConfig) {
        let first_time = self.loaded.insert(key.clone());

        // Under a bounded policy a key is written only on its first-ever
        // successful production; a reproduction after eviction or expiry is
        // handed to the caller without re-entering the store.
        if config.policy == EvictionPolicy::NONE || first_time {
            self.store.insert(key.clone(), CacheEntry::new(value));
            self.order.record_insert(key);
            self.enforce_size_limit(config);
        }
    }

    /// Removes victims oldest-first until the store fits the limit again.
    fn enforce_size_limit(&mut self, config: &CacheConfig) {
        if !config.bounded() {
            return;
        }
        while self.store.len() > config.max_size {
            match self.order.pick_victim() {
                Some(victim) => {
                    self.store.remove(&victim);
                    debug!(size = self.store.len(), "evicted entry over size limit");
                }
                None => break,
            }
        }
    }
}

/// Cleans up after a leader whose task never reached settlement: removes the
/// in-flight entry so a later call for the key starts a fresh cycle. The
/// leader's settlement channel closes when its sender is dropped with the
/// task, which releases all joiners.
struct FlightGuard<'a, K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    state: &'a Mutex<CacheState<K, V, E>>,
    flight_id: u64,
    key: Option<K>,
}

impl<K, V, E> Drop for FlightGuard<'_, K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.state.lock().in_flight.release(&key, self.flight_id);
            debug!("unsettled flight released");
        }
    }
}
