use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use super::metrics::{QueueMetrics, QueueMetricsSnapshot};
use super::types::{DedupItem, PushOutcome, QueuedEntry};

struct Slot<T> {
    position: u64,
    generation: u64,
    item: T,
}

struct QueueState<T> {
    /// position -> key, iterated in ascending order for FIFO replay
    order: BTreeMap<u64, String>,
    entries: HashMap<String, Slot<T>>,
    sequence_counter: u64,
}

impl<T> QueueState<T> {
    fn next_sequence(&mut self) -> u64 {
        let seq = self.sequence_counter;
        self.sequence_counter += 1;
        seq
    }

    fn is_current(&self, key: &str, generation: u64) -> bool {
        self.entries.get(key).is_some_and(|slot| slot.generation == generation)
    }

    fn take(&mut self, key: &str) -> Option<T> {
        let slot = self.entries.remove(key)?;
        self.order.remove(&slot.position);
        Some(slot.item)
    }
}

/// Keyed FIFO queue holding at most one entry per dedup key
///
/// ## Ordering
///
/// Entries replay in insertion order. A push whose key collides with a queued
/// entry overwrites that entry in place (same position, new generation).
/// [`requeue`](Self::requeue) moves an entry to the back.
///
/// ## Thread Safety
///
/// State lives behind a `parking_lot::Mutex`; no lock is held across an
/// `.await` by any method. Clones share the same underlying queue.
pub struct DedupQueue<T> {
    state: Arc<Mutex<QueueState<T>>>,
    metrics: Arc<QueueMetrics>,
}

impl<T: DedupItem + Clone> DedupQueue<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                order: BTreeMap::new(),
                entries: HashMap::new(),
                sequence_counter: 0,
            })),
            metrics: Arc::new(QueueMetrics::new()),
        }
    }

    /// Insert an item, replacing any queued item with the same key
    pub fn push(&self, item: T) -> PushOutcome {
        let key = item.dedup_key().to_string();
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let generation = state.next_sequence();

        let outcome = if let Some(slot) = state.entries.get_mut(&key) {
            slot.generation = generation;
            slot.item = item;
            self.metrics.record_replacement();
            PushOutcome::Replaced
        } else {
            state.order.insert(generation, key.clone());
            state.entries.insert(key.clone(), Slot { position: generation, generation, item });
            self.metrics.record_enqueue();
            PushOutcome::Inserted
        };

        self.metrics.update_size(state.entries.len());
        debug!(key = %key, generation, outcome = %outcome, "Item queued");
        outcome
    }

    /// Copy every entry in replay order
    pub fn snapshot(&self) -> Vec<QueuedEntry<T>> {
        let state = self.state.lock();
        state
            .order
            .values()
            .filter_map(|key| {
                state.entries.get(key).map(|slot| QueuedEntry {
                    key: key.clone(),
                    generation: slot.generation,
                    item: slot.item.clone(),
                })
            })
            .collect()
    }

    /// Remove an entry after it was delivered
    ///
    /// Returns `false` (and leaves the queue untouched) when the entry was
    /// replaced or removed since `generation` was observed.
    pub fn mark_completed(&self, key: &str, generation: u64) -> bool {
        let removed = self.remove_if_current(key, generation);
        if removed {
            self.metrics.record_replay();
        }
        removed
    }

    /// Remove an entry that can never be delivered
    pub fn mark_dropped(&self, key: &str, generation: u64) -> bool {
        let removed = self.remove_if_current(key, generation);
        if removed {
            self.metrics.record_drop();
        }
        removed
    }

    /// Move an entry to the back of the queue
    pub fn requeue(&self, key: &str, generation: u64) -> bool {
        let mut state = self.state.lock();
        if !state.is_current(key, generation) {
            debug!(key = %key, generation, "Skipping requeue of superseded entry");
            return false;
        }

        let position = state.next_sequence();
        let old_position = match state.entries.get_mut(key) {
            Some(slot) => std::mem::replace(&mut slot.position, position),
            None => return false,
        };
        state.order.remove(&old_position);
        state.order.insert(position, key.to_string());

        self.metrics.record_requeue();
        true
    }

    /// Remove an entry regardless of generation
    pub fn remove(&self, key: &str) -> Option<T> {
        let mut state = self.state.lock();
        let item = state.take(key);
        self.metrics.update_size(state.entries.len());
        item
    }

    /// Number of queued entries
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.state.lock().entries.contains_key(key)
    }

    /// Keys in replay order
    pub fn keys(&self) -> Vec<String> {
        self.state.lock().order.values().cloned().collect()
    }

    /// Clear all items from the queue
    pub fn clear(&self) -> usize {
        let mut state = self.state.lock();
        let count = state.entries.len();
        state.order.clear();
        state.entries.clear();

        self.metrics.update_size(0);
        info!("Queue cleared: {} items removed", count);
        count
    }

    /// Get queue metrics
    pub fn metrics(&self) -> QueueMetricsSnapshot {
        self.metrics.snapshot()
    }

    fn remove_if_current(&self, key: &str, generation: u64) -> bool {
        let mut state = self.state.lock();
        if !state.is_current(key, generation) {
            debug!(key = %key, generation, "Entry superseded; keeping newer version");
            return false;
        }
        state.take(key);
        self.metrics.update_size(state.entries.len());
        true
    }
}

impl<T> Clone for DedupQueue<T> {
    fn clone(&self) -> Self {
        Self { state: self.state.clone(), metrics: self.metrics.clone() }
    }
}

impl<T: DedupItem + Clone> Default for DedupQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
