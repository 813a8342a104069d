//! Least Frequently Used (LFU) replacement simulator.
//!
//! `C` fixed slots each hold an address, its reference count and the time of
//! its last reference. A full-cache miss scans every slot for the smallest
//! count, breaking ties by the oldest last reference, and the newcomer takes
//! the victim's slot.
//!
//! ```text
//!   slot:        0        1        2        3
//!             ┌──────┐ ┌──────┐ ┌──────┐ ┌──────┐
//!   addr      │  12  │ │   3  │ │  40  │ │   8  │
//!   freq      │   4  │ │   1  │ │   1  │ │   2  │
//!   last_used │  19  │ │  11  │ │  17  │ │  18  │
//!             └──────┘ └──────┘ └──────┘ └──────┘
//!                         ▲
//!                         victim: min (freq, last_used) = (1, 11)
//! ```
//!
//! Counts are unbounded and never decay. The scan makes a full-cache miss
//! O(C); hits are O(1).
use tracing::{debug, trace};

use crate::ds::address_table::AddressTable;
use crate::error::{InvariantError, SimError, check_address, check_capacity};
use crate::policy::SimOptions;
use crate::stats::{SimStats, StatsAccumulator};
use crate::traits::{AccessOutcome, Eviction, ReadOnlySimulator, Simulator};

#[derive(Debug, Clone, Copy)]
struct LfuSlot {
    addr: u64,
    freq: u64,
    entered: u64,
    last_used: u64,
}

/// LFU simulator with linear victim search.
#[derive(Debug, Clone)]
pub struct LfuSim {
    capacity: usize,
    slots: Vec<LfuSlot>,
    index: AddressTable<Option<usize>>,
    stats: StatsAccumulator,
}

impl LfuSim {
    pub fn new(capacity: usize) -> Result<Self, SimError> {
        Self::with_options(capacity, SimOptions::default())
    }

    pub fn with_options(capacity: usize, options: SimOptions) -> Result<Self, SimError> {
        let capacity = check_capacity(capacity)?;
        debug!(capacity, table = ?options.table, "lfu simulator created");
        Ok(Self {
            capacity,
            slots: Vec::with_capacity(capacity),
            index: AddressTable::with_mode(options.table),
            stats: StatsAccumulator::new(),
        })
    }

    /// Reference count of a resident address.
    pub fn frequency(&self, addr: u64) -> Option<u64> {
        self.index.get(addr).map(|slot| self.slots[slot].freq)
    }

    fn victim_slot(&self) -> Option<usize> {
        self.slots
            .iter()
            .enumerate()
            .min_by_key(|(_, s)| (s.freq, s.last_used))
            .map(|(slot, _)| slot)
    }
}

impl ReadOnlySimulator for LfuSim {
    fn name(&self) -> &'static str {
        "lfu"
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn contains(&self, addr: u64) -> bool {
        self.index.get(addr).is_some()
    }

    /// Slot order.
    fn contents(&self) -> Vec<u64> {
        self.slots.iter().map(|s| s.addr).collect()
    }

    fn stats(&self) -> SimStats {
        self.stats.snapshot()
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.slots.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "lfu: {} slots exceed capacity {}",
                self.slots.len(),
                self.capacity
            )));
        }
        for (slot, entry) in self.slots.iter().enumerate() {
            if *self.index.get(entry.addr) != Some(slot) {
                return Err(InvariantError::new(format!(
                    "lfu: slot {slot} holds {} but index says {:?}",
                    entry.addr,
                    self.index.get(entry.addr)
                )));
            }
            if entry.freq == 0 {
                return Err(InvariantError::new(format!("lfu: {} has zero frequency", entry.addr)));
            }
        }
        let indexed = self.index.iter_set().count();
        if indexed != self.slots.len() {
            return Err(InvariantError::new(format!(
                "lfu: {indexed} indexed addresses, {} slots",
                self.slots.len()
            )));
        }
        Ok(())
    }
}

impl Simulator for LfuSim {
    fn access(&mut self, addr: i64) -> Result<AccessOutcome, SimError> {
        let addr = check_address(addr)?;
        let now = self.stats.begin_access();

        if let Some(slot) = *self.index.get(addr) {
            let entry = &mut self.slots[slot];
            entry.freq += 1;
            entry.last_used = now;
            self.stats.note_occupancy(self.slots.len(), self.capacity);
            return Ok(AccessOutcome::Hit);
        }

        self.stats.record_miss();
        let fresh = LfuSlot {
            addr,
            freq: 1,
            entered: now,
            last_used: now,
        };

        let evicted = if self.slots.len() < self.capacity {
            self.index.set(addr, Some(self.slots.len()));
            self.slots.push(fresh);
            None
        } else {
            let slot = self
                .victim_slot()
                .ok_or_else(|| SimError::internal("lfu: full cache with no slots"))?;
            let old = std::mem::replace(&mut self.slots[slot], fresh);
            self.index.reset(old.addr);
            self.index.set(addr, Some(slot));

            let eviction = Eviction::new(old.addr, now, old.entered, old.last_used);
            self.stats.record_eviction(eviction.enter_age);
            trace!(victim = old.addr, freq = old.freq, enter_age = eviction.enter_age, "lfu evict");
            Some(eviction)
        };

        self.stats.note_occupancy(self.slots.len(), self.capacity);
        Ok(AccessOutcome::Miss { evicted })
    }
}
