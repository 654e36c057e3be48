use std::collections::HashMap;
use std::hash::Hash;

use tokio::sync::broadcast;

/// Outcome of one production cycle, broadcast to every waiter.
pub(crate) type Outcome<V, E> = Result<V, E>;

/// What `acquire_or_join` handed the caller.
pub(crate) enum FlightTicket<V, E> {
    /// No production was underway for the key. The caller is the leader: it
    /// must invoke the producer and settle the channel exactly once.
    Lead(FlightLease<V, E>),
    /// Another caller is already producing. Await the settlement on the
    /// receiver; dropping it affects nobody else.
    Join(broadcast::Receiver<Outcome<V, E>>),
}

/// The leader's half of a flight: the settlement sender plus the cycle id
/// that scopes its release.
pub(crate) struct FlightLease<V, E> {
    pub(crate) id: u64,
    pub(crate) tx: broadcast::Sender<Outcome<V, E>>,
}

struct Flight<V, E> {
    id: u64,
    tx: broadcast::Sender<Outcome<V, E>>,
}

/// Registry of pending productions: at most one settlement channel per key.
///
/// The channel is a write-once settlement cell: the leader sends a single
/// `Outcome` and every receiver subscribed before the send observes it. The
/// leader removes the registry entry *before* sending, both under the cache's
/// single lock, so a receiver can only exist for a channel that will still be
/// settled (or closed, if the leader's task went away).
///
/// Each flight carries a cycle id. Release is scoped to the id, so a leader
/// that settles after `clear` (or after its entry was otherwise replaced)
/// cannot tear down a newer flight for the same key.
///
/// This type holds no lock of its own. The cache engine embeds it in the
/// state guarded by its per-instance mutex, which is what decides the
/// leader/joiner race.
pub(crate) struct InFlightRegistry<K, V, E> {
    flights: HashMap<K, Flight<V, E>>,
    next_id: u64,
}

impl<K, V, E> InFlightRegistry<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            flights: HashMap::new(),
            next_id: 0,
        }
    }

    /// Returns the existing channel for `key` as a joiner, or creates one
    /// and returns its lease as the leader.
    pub(crate) fn acquire_or_join(&mut self, key: &K) -> FlightTicket<V, E> {
        if let Some(flight) = self.flights.get(key) {
            return FlightTicket::Join(flight.tx.subscribe());
        }
        // Capacity 1: the channel only ever carries the single settlement.
        let (tx, _rx) = broadcast::channel(1);
        let id = self.next_id;
        self.next_id += 1;
        self.flights.insert(key.clone(), Flight { id, tx: tx.clone() });
        FlightTicket::Lead(FlightLease { id, tx })
    }

    /// Removes the pending channel for `key` if it still belongs to cycle
    /// `id`. Called once the production settles, succeeds or fails alike.
    pub(crate) fn release(&mut self, key: &K, id: u64) {
        if self.flights.get(key).is_some_and(|flight| flight.id == id) {
            self.flights.remove(key);
        }
    }

    /// Drops every pending channel entry. In-progress leaders still settle
    /// their own waiters; later calls start fresh cycles.
    pub(crate) fn clear(&mut self) {
        self.flights.clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.flights.len()
    }
}
