//! Last-request-wins bookkeeping for repeated resolutions.
//!
//! Callers resolve again on every edit of a record, and responses can arrive
//! out of order. Each call takes a [`Ticket`] for the record it serves; when
//! the response lands, it is applied only if no newer ticket was issued for
//! the same record since.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Generation token for one call on one record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ticket<K> {
    key: K,
    generation: u64,
}

impl<K> Ticket<K> {
    /// The record this ticket belongs to.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Generation number; never reused within one tracker.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Issues tickets per record key and filters stale responses.
///
/// # Examples
///
/// ```
/// use catalog_resolve::RequestTracker;
///
/// let tracker = RequestTracker::new();
/// let first = tracker.begin(3usize);
/// let second = tracker.begin(3usize);
///
/// assert_eq!(tracker.accept(&first, "stale"), None);
/// assert_eq!(tracker.accept(&second, "fresh"), Some("fresh"));
/// ```
#[derive(Debug)]
pub struct RequestTracker<K> {
    state: Mutex<TrackerState<K>>,
}

#[derive(Debug)]
struct TrackerState<K> {
    next: u64,
    latest: HashMap<K, u64>,
}

impl<K> Default for RequestTracker<K> {
    fn default() -> Self {
        Self {
            state: Mutex::new(TrackerState {
                next: 0,
                latest: HashMap::new(),
            }),
        }
    }
}

impl<K: Eq + Hash + Clone> RequestTracker<K> {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new call for `key`, superseding every earlier ticket for it.
    pub fn begin(&self, key: K) -> Ticket<K> {
        let mut state = self.lock();
        state.next += 1;
        let generation = state.next;
        state.latest.insert(key.clone(), generation);
        Ticket { key, generation }
    }

    /// Returns true if `ticket` is still the newest for its record.
    pub fn is_current(&self, ticket: &Ticket<K>) -> bool {
        self.lock().latest.get(&ticket.key) == Some(&ticket.generation)
    }

    /// Passes `value` through only if `ticket` is still current.
    pub fn accept<V>(&self, ticket: &Ticket<K>, value: V) -> Option<V> {
        self.is_current(ticket).then_some(value)
    }

    /// Forgets a record, invalidating its outstanding tickets.
    pub fn forget(&self, key: &K) {
        self.lock().latest.remove(key);
    }

    // The map stays consistent even if a holder panicked mid-update.
    fn lock(&self) -> MutexGuard<'_, TrackerState<K>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
