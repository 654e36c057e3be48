use std::collections::VecDeque;

/// Strategy for choosing a victim when a bounded cache exceeds its capacity.
///
/// # Variants
///
/// * `NONE` - no eviction; only TTL governs removal and the cache size is
///   unbounded regardless of any configured limit.
/// * `FIFO` - **First In, First Out**: entries are evicted in insertion
///   order and reads never reorder them.
/// * `LRU` - **Least Recently Used**: every successful read or write moves
///   the key to the most-recently-used position; the least recently touched
///   key is evicted first.
///
/// # Examples
///
/// ```
/// use memoflight_core::EvictionPolicy;
///
/// assert_eq!(EvictionPolicy::default(), EvictionPolicy::NONE);
///
/// let policy: EvictionPolicy = "lru".into();
/// assert_eq!(policy, EvictionPolicy::LRU);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    #[default]
    NONE,
    FIFO,
    LRU,
}

/// Converts a string slice to an `EvictionPolicy`.
///
/// The conversion is case-insensitive and defaults to `NONE` for
/// unrecognized values.
impl From<&str> for EvictionPolicy {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "fifo" => EvictionPolicy::FIFO,
            "lru" => EvictionPolicy::LRU,
            _ => EvictionPolicy::NONE,
        }
    }
}

/// Maintains the key ordering needed to pick an eviction victim.
///
/// The tracker is a thin queue over the configured [`EvictionPolicy`]:
///
/// * `NONE` - inert; nothing is recorded and no victim is ever picked.
/// * `FIFO` - insertion order only; [`EvictionOrder::record_access`] is a
///   no-op.
/// * `LRU` - access order; reads and writes both move the key to the
///   most-recent position.
///
/// The tracker holds keys only. The cache engine is responsible for removing
/// the picked victim from its store so the two stay consistent; both updates
/// happen under the engine's single lock.
#[derive(Debug)]
pub struct EvictionOrder<K> {
    policy: EvictionPolicy,
    order: VecDeque<K>,
}

impl<K: PartialEq + Clone> EvictionOrder<K> {
    pub fn new(policy: EvictionPolicy) -> Self {
        Self {
            policy,
            order: VecDeque::new(),
        }
    }

    /// Records a successful read-hit. Reorders the key to the
    /// most-recently-used position under LRU; a no-op otherwise.
    pub fn record_access(&mut self, key: &K) {
        if self.policy == EvictionPolicy::LRU {
            self.move_to_back(key);
        }
    }

    /// Records an insertion, ranking the key as newest. Inert under `NONE`.
    pub fn record_insert(&mut self, key: &K) {
        if self.policy == EvictionPolicy::NONE {
            return;
        }
        self.move_to_back(key);
    }

    /// Picks the current victim: the oldest key by the active ordering.
    /// Never picks under `NONE`.
    pub fn pick_victim(&mut self) -> Option<K> {
        if self.policy == EvictionPolicy::NONE {
            return None;
        }
        self.order.pop_front()
    }

    /// Drops a key from the ordering, if present.
    pub fn remove(&mut self, key: &K) {
        self.order.retain(|k| k != key);
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn move_to_back(&mut self, key: &K) {
        self.order.retain(|k| k != key);
        self.order.push_back(key.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_from_str_is_case_insensitive() {
        assert_eq!(EvictionPolicy::from("FIFO"), EvictionPolicy::FIFO);
        assert_eq!(EvictionPolicy::from("Lru"), EvictionPolicy::LRU);
        assert_eq!(EvictionPolicy::from("none"), EvictionPolicy::NONE);
        assert_eq!(EvictionPolicy::from("random"), EvictionPolicy::NONE);
    }

    #[test]
    fn fifo_victim_is_insertion_order() {
        let mut order = EvictionOrder::new(EvictionPolicy::FIFO);
        order.record_insert(&1);
        order.record_insert(&2);
        order.record_insert(&3);
        // Reads never reorder under FIFO.
        order.record_access(&1);
        assert_eq!(order.pick_victim(), Some(1));
        assert_eq!(order.pick_victim(), Some(2));
    }

    #[test]
    fn lru_access_reorders() {
        let mut order = EvictionOrder::new(EvictionPolicy::LRU);
        order.record_insert(&"a");
        order.record_insert(&"b");
        order.record_access(&"a");
        assert_eq!(order.pick_victim(), Some("b"));
        assert_eq!(order.pick_victim(), Some("a"));
    }

    #[test]
    fn none_policy_is_inert() {
        let mut order = EvictionOrder::new(EvictionPolicy::NONE);
        order.record_insert(&1);
        order.record_access(&1);
        assert!(order.is_empty());
        assert_eq!(order.pick_victim(), None);
    }

    #[test]
    fn remove_drops_key() {
        let mut order = EvictionOrder::new(EvictionPolicy::FIFO);
        order.record_insert(&1);
        order.record_insert(&2);
        order.remove(&1);
        assert_eq!(order.pick_victim(), Some(2));
        assert_eq!(order.pick_victim(), None);
    }
}
