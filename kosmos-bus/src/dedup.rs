//! Bounded correlation-id dedup, supplementing the core bus contract: the
//! sender retries on transient failure (spec §4.7), so the bus drops
//! messages it has already delivered for a correlation id it still
//! remembers.

use std::collections::{HashSet, VecDeque};

use parking_lot::Mutex;

pub struct DedupWindow {
    capacity: usize,
    order: Mutex<VecDeque<String>>,
    seen: Mutex<HashSet<String>>,
}

impl DedupWindow {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: Mutex::new(VecDeque::with_capacity(capacity)),
            seen: Mutex::new(HashSet::with_capacity(capacity)),
        }
    }

    /// Returns `true` the first time `key` is observed, `false` on any
    /// repeat while it's still within the window.
    pub fn observe(&self, key: &str) -> bool {
        let mut seen = self.seen.lock();
        if !seen.insert(key.to_string()) {
            return false;
        }
        drop(seen);

        let mut order = self.order.lock();
        order.push_back(key.to_string());
        if order.len() > self.capacity {
            if let Some(evicted) = order.pop_front() {
                self.seen.lock().remove(&evicted);
            }
        }
        true
    }
}
