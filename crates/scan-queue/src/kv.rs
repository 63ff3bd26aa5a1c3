// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The in-memory key/value primitives the queue is built on (§6):
//! atomic list append/pop with priority discrimination, atomic set
//! membership with TTL, and conditional update keyed on worker-id for
//! lease operations. The rest of the core sees only the [`crate::JobQueue`]
//! contract; this module is queue-internal.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Instant;

/// An atomic FIFO list keyed by band name. Append/pop never interleave
/// partially — callers observe either the pre- or post-mutation list.
pub struct ListStore<T> {
    lists: Mutex<HashMap<String, VecDeque<T>>>,
}

impl<T> Default for ListStore<T> {
    fn default() -> Self {
        Self { lists: Mutex::new(HashMap::new()) }
    }
}

impl<T> ListStore<T> {
    pub fn push_back(&self, key: &str, value: T) {
        self.lists.lock().entry(key.to_string()).or_default().push_back(value);
    }

    pub fn push_front(&self, key: &str, value: T) {
        self.lists.lock().entry(key.to_string()).or_default().push_front(value);
    }

    pub fn pop_front(&self, key: &str) -> Option<T> {
        self.lists.lock().get_mut(key).and_then(VecDeque::pop_front)
    }

    pub fn len(&self, key: &str) -> usize {
        self.lists.lock().get(key).map_or(0, VecDeque::len)
    }

    /// Pops the front element iff it satisfies `pred`, atomically: a
    /// not-ready front blocks the whole band rather than being skipped,
    /// preserving FIFO order.
    pub fn pop_front_if<F: FnOnce(&T) -> bool>(&self, key: &str, pred: F) -> Option<T> {
        let mut lists = self.lists.lock();
        let list = lists.get_mut(key)?;
        if list.front().map(&pred).unwrap_or(false) {
            list.pop_front()
        } else {
            None
        }
    }

    pub fn front_is_ready<F: Fn(&T) -> bool>(&self, key: &str, pred: F) -> bool {
        self.lists.lock().get(key).and_then(|l| l.front()).map(pred).unwrap_or(false)
    }

    pub fn contains<F: Fn(&T) -> bool>(&self, key: &str, pred: F) -> bool {
        self.lists.lock().get(key).map_or(false, |l| l.iter().any(pred))
    }
}

/// A single entry in the conditional-update set: a value plus the worker
/// that currently owns it and when that ownership (TTL) lapses.
#[derive(Clone)]
struct LeasedEntry<V> {
    value: V,
    owner: String,
    expires_at: Instant,
}

/// Atomic set membership with per-entry TTL and worker-id-conditioned
/// updates, used for the queue's processing set and lease protocol.
///
/// A "conditional update keyed on worker-id" means: a caller can only
/// mutate or remove an entry it does not own by first losing the race to
/// expiry, never by simply overwriting another worker's claim.
pub struct LeaseStore<K, V> {
    entries: Mutex<HashMap<K, LeasedEntry<V>>>,
}

impl<K: std::hash::Hash + Eq + Clone, V: Clone> Default for LeaseStore<K, V> {
    fn default() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }
}

impl<K: std::hash::Hash + Eq + Clone, V: Clone> LeaseStore<K, V> {
    /// Inserts a new lease unconditionally (used on initial dequeue, where
    /// the key is guaranteed absent because it was just popped off a band).
    pub fn insert(&self, key: K, value: V, owner: &str, expires_at: Instant) {
        self.entries.lock().insert(key, LeasedEntry { value, owner: owner.to_string(), expires_at });
    }

    /// Extends a lease iff `owner` currently holds it and it has not expired.
    pub fn extend(&self, key: &K, owner: &str, new_expiry: Instant, now: Instant) -> bool {
        let mut entries = self.entries.lock();
        match entries.get_mut(key) {
            Some(entry) if entry.owner == owner && entry.expires_at > now => {
                entry.expires_at = new_expiry;
                true
            }
            _ => false,
        }
    }

    /// Removes a lease iff `owner` currently holds it. Returns the value on
    /// success. Removing an already-removed key is a no-op, not an error —
    /// callers get `None` either way, matching ack-after-ack semantics.
    pub fn remove_if_owned(&self, key: &K, owner: &str) -> Option<V> {
        let mut entries = self.entries.lock();
        if entries.get(key).map(|e| e.owner.as_str()) == Some(owner) {
            entries.remove(key).map(|e| e.value)
        } else {
            None
        }
    }

    /// Removes a lease unconditionally (reaper reclaim).
    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries.lock().remove(key).map(|e| e.value)
    }

    pub fn get_owner(&self, key: &K) -> Option<String> {
        self.entries.lock().get(key).map(|e| e.owner.clone())
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns every `(key, value)` whose lease has lapsed as of `now`.
    pub fn expired(&self, now: Instant) -> Vec<(K, V)> {
        self.entries
            .lock()
            .iter()
            .filter(|(_, e)| e.expires_at <= now)
            .map(|(k, e)| (k.clone(), e.value.clone()))
            .collect()
    }
}

#[cfg(test)]
#[path = "kv_tests.rs"]
mod tests;
