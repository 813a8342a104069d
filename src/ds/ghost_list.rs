//! Bounded recency list for ghost addresses.
//!
//! ARC keeps the addresses it recently evicted (no payload) in two of these.
//! Implemented as an `IntrusiveList` plus an index.
//!
//! ## Architecture
//!
//! ```text
//!   index: FxHashMap<u64, SlotId>      list: IntrusiveList<u64>
//!   ┌─────────┬─────────┐              head ─► [17] ◄──► [4] ◄──► [90] ◄── tail
//!   │   17    │  id_1   │                 MRU                        LRU
//!   │    4    │  id_2   │
//!   └─────────┴─────────┘
//! ```
//!
//! ## Behavior
//! - `record(a)`: moves `a` to MRU, drops the LRU entry first if full
//! - `pop_lru()`: drops and returns the LRU entry
//! - `remove(a)`: deletes from list and index
//!
//! ## Performance
//! - `record` / `remove` / `contains` / `pop_lru`: O(1) average
use rustc_hash::FxHashMap;

use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;
use crate::error::InvariantError;

/// Bounded recency list of addresses.
#[derive(Debug, Clone)]
pub struct GhostList {
    list: IntrusiveList<u64>,
    index: FxHashMap<u64, SlotId>,
    capacity: usize,
}

impl GhostList {
    /// Creates a ghost list holding at most `capacity` addresses.
    pub fn new(capacity: usize) -> Self {
        let mut index = FxHashMap::default();
        index.reserve(capacity);
        Self {
            list: IntrusiveList::with_capacity(capacity),
            index,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn contains(&self, addr: u64) -> bool {
        self.index.contains_key(&addr)
    }

    /// Records `addr` as most recent. Returns the address pushed out to make
    /// room, if any.
    pub fn record(&mut self, addr: u64) -> Option<u64> {
        if self.capacity == 0 {
            return None;
        }
        if let Some(&id) = self.index.get(&addr) {
            self.list.move_to_front(id);
            return None;
        }

        let dropped = if self.list.len() >= self.capacity {
            self.pop_lru()
        } else {
            None
        };
        let id = self.list.push_front(addr);
        self.index.insert(addr, id);
        dropped
    }

    /// Removes and returns the least recently recorded address.
    pub fn pop_lru(&mut self) -> Option<u64> {
        let addr = self.list.pop_back()?;
        self.index.remove(&addr);
        Some(addr)
    }

    /// Removes `addr`; returns `true` if it was present.
    pub fn remove(&mut self, addr: u64) -> bool {
        match self.index.remove(&addr) {
            Some(id) => {
                self.list.remove(id);
                true
            },
            None => false,
        }
    }

    /// Addresses from most to least recent.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.list.iter().copied()
    }

    pub fn clear(&mut self) {
        self.list.clear();
        self.index.clear();
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.list.check_invariants()?;
        if self.list.len() != self.index.len() {
            return Err(InvariantError::new(format!(
                "ghost list: list len {} != index len {}",
                self.list.len(),
                self.index.len()
            )));
        }
        if self.list.len() > self.capacity {
            return Err(InvariantError::new("ghost list: over capacity"));
        }
        for (&addr, &id) in &self.index {
            if self.list.get(id) != Some(&addr) {
                return Err(InvariantError::new(format!(
                    "ghost list: index entry for {addr} points elsewhere"
                )));
            }
        }
        Ok(())
    }
}
