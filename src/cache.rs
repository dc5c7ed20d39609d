// =============================================================================
// TTL Cache
// =============================================================================
//
// Small keyed cache shared by the upstream providers: one TTL and one
// capacity per cache, set at construction and handed to whoever needs it.
//
// Semantics:
// - a fresh entry (younger than the TTL) is returned by `get`
// - an expired entry is skipped by `get` but kept in place; `get_stale`
//   ignores the TTL for callers that prefer old data over none
// - updating a key refreshes its value and timestamp but keeps its original
//   insertion slot
// - when an insert pushes the cache past capacity, the oldest-inserted key
//   is dropped first

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

struct Entry<T> {
    value: T,
    stored_at: Instant,
}

struct Inner<T> {
    entries: HashMap<String, Entry<T>>,
    order: VecDeque<String>,
}

/// Thread-safe TTL cache with bounded capacity.
pub struct TtlCache<T> {
    inner: Mutex<Inner<T>>,
    ttl: Duration,
    capacity: usize,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            ttl,
            capacity,
        }
    }

    /// Fetch a fresh entry. Expired entries are skipped, not removed.
    pub fn get(&self, key: &str) -> Option<T> {
        let inner = self.inner.lock();
        let entry = inner.entries.get(key)?;
        if entry.stored_at.elapsed() < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    /// Fetch an entry regardless of age. Used by callers that fall back to
    /// stale data when the upstream is down.
    pub fn get_stale(&self, key: &str) -> Option<T> {
        let inner = self.inner.lock();
        inner.entries.get(key).map(|e| e.value.clone())
    }

    /// Store a value, evicting oldest-inserted entries past capacity.
    pub fn insert(&self, key: impl Into<String>, value: T) {
        let key = key.into();
        let mut inner = self.inner.lock();

        let entry = Entry {
            value,
            stored_at: Instant::now(),
        };
        if inner.entries.insert(key.clone(), entry).is_none() {
            inner.order.push_back(key);
        }

        while inner.entries.len() > self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
