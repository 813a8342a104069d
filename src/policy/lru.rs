//! Least Recently Used (LRU) replacement simulator.
//!
//! Instead of a linked list, residents live in an append-only log of `2C`
//! slots. A hit tombstones the old position and re-appends at the head; when
//! the head reaches the end of the log, live entries are compacted to the
//! front in order. The oldest live entry sits at the tail.
//!
//! ## Architecture
//!
//! ```text
//!   capacity C = 3, log length 2C = 6
//!
//!              tail              head
//!               │                 │
//!               ▼                 ▼
//!   log:  ┌───┬───┬───┬───┬───┬───┐
//!         │ · │ 7 │ · │ 2 │ 9 │   │      · = tombstone
//!         └───┴───┴───┴───┴───┴───┘
//!   index: 7 → 1, 2 → 3, 9 → 4
//!
//!   access(7):  log[1] = ·, log[5] = 7, head = 6
//!   access(4):  head == 2C → compact → [2, 9, 7, _, _, _], head = 3
//!               log[3] = 4, resident = 4 > C → evict tail (2)
//! ```
//!
//! ## Performance
//!
//! | Operation | Time              | Notes                              |
//! |-----------|-------------------|------------------------------------|
//! | hit       | O(1) amortized    | tombstone + append                 |
//! | miss      | O(1) amortized    | tail skip over tombstones          |
//! | compact   | O(C)              | at most once per C appends         |
//!
//! ## Example Usage
//!
//! ```
//! use cachesim::policy::lru::LruSim;
//! use cachesim::traits::{ReadOnlySimulator, Simulator};
//!
//! let mut sim = LruSim::new(2).unwrap();
//! sim.batch(&[1, 2, 1, 3]).unwrap();
//!
//! // 2 was least recently used when 3 arrived
//! assert_eq!(sim.contents(), vec![3, 1]);
//! assert_eq!(sim.stats().eviction_count, 1);
//! ```
use tracing::{debug, trace};

use crate::ds::address_table::AddressTable;
use crate::error::{InvariantError, SimError, check_address, check_capacity};
use crate::policy::SimOptions;
use crate::stats::{SimStats, StatsAccumulator};
use crate::traits::{AccessOutcome, Eviction, ReadOnlySimulator, Simulator};

#[derive(Debug, Clone, Default, PartialEq)]
struct LruMeta {
    pos: Option<usize>,
    entered: u64,
    last_ref: u64,
}

/// LRU simulator over a tombstoned log.
#[derive(Debug, Clone)]
pub struct LruSim {
    capacity: usize,
    log: Vec<Option<u64>>,
    head: usize,
    tail: usize,
    resident: usize,
    index: AddressTable<LruMeta>,
    stats: StatsAccumulator,
}

impl LruSim {
    /// Creates an LRU simulator holding `capacity` addresses.
    pub fn new(capacity: usize) -> Result<Self, SimError> {
        Self::with_options(capacity, SimOptions::default())
    }

    pub fn with_options(capacity: usize, options: SimOptions) -> Result<Self, SimError> {
        let capacity = check_capacity(capacity)?;
        debug!(capacity, table = ?options.table, "lru simulator created");
        Ok(Self {
            capacity,
            log: vec![None; 2 * capacity],
            head: 0,
            tail: 0,
            resident: 0,
            index: AddressTable::with_mode(options.table),
            stats: StatsAccumulator::new(),
        })
    }

    /// Moves live entries to the front of the log, preserving order.
    fn compact(&mut self) {
        let mut write = 0;
        for read in self.tail..self.head {
            if let Some(addr) = self.log[read] {
                self.log[read] = None;
                self.log[write] = Some(addr);
                self.index.get_mut(addr).pos = Some(write);
                write += 1;
            }
        }
        self.tail = 0;
        self.head = write;
    }

    fn append(&mut self, addr: u64) -> usize {
        if self.head == self.log.len() {
            self.compact();
        }
        let pos = self.head;
        self.log[pos] = Some(addr);
        self.head += 1;
        pos
    }

    fn evict_tail(&mut self, now: u64) -> Result<Eviction, SimError> {
        while self.tail < self.head && self.log[self.tail].is_none() {
            self.tail += 1;
        }
        let victim = self
            .log
            .get_mut(self.tail)
            .and_then(Option::take)
            .ok_or_else(|| SimError::internal("lru: over capacity with no live tail entry"))?;
        self.tail += 1;

        let meta = std::mem::take(self.index.get_mut(victim));
        self.index.reset(victim);
        self.resident -= 1;

        let eviction = Eviction::new(victim, now, meta.entered, meta.last_ref);
        self.stats.record_eviction(eviction.enter_age);
        trace!(victim, enter_age = eviction.enter_age, ref_age = eviction.ref_age, "lru evict");
        Ok(eviction)
    }
}

impl ReadOnlySimulator for LruSim {
    fn name(&self) -> &'static str {
        "lru"
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn len(&self) -> usize {
        self.resident
    }

    fn contains(&self, addr: u64) -> bool {
        self.index.get(addr).pos.is_some()
    }

    /// Most recently used first.
    fn contents(&self) -> Vec<u64> {
        self.log[self.tail..self.head].iter().rev().flatten().copied().collect()
    }

    fn stats(&self) -> SimStats {
        self.stats.snapshot()
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.tail > self.head || self.head > self.log.len() {
            return Err(InvariantError::new(format!(
                "lru: tail {} head {} outside log of {}",
                self.tail,
                self.head,
                self.log.len()
            )));
        }
        if self.resident > self.capacity {
            return Err(InvariantError::new(format!(
                "lru: {} residents exceed capacity {}",
                self.resident, self.capacity
            )));
        }

        let mut live = 0;
        for (pos, slot) in self.log.iter().enumerate() {
            let Some(addr) = *slot else { continue };
            if pos < self.tail || pos >= self.head {
                return Err(InvariantError::new(format!(
                    "lru: live entry {addr} at {pos} outside [{}, {})",
                    self.tail, self.head
                )));
            }
            if self.index.get(addr).pos != Some(pos) {
                return Err(InvariantError::new(format!(
                    "lru: log[{pos}] = {addr} but index says {:?}",
                    self.index.get(addr).pos
                )));
            }
            live += 1;
        }
        if live != self.resident {
            return Err(InvariantError::new(format!(
                "lru: {live} live log entries, resident count {}",
                self.resident
            )));
        }

        for (addr, meta) in self.index.iter_set() {
            if let Some(pos) = meta.pos
                && self.log.get(pos).copied().flatten() != Some(addr)
            {
                return Err(InvariantError::new(format!(
                    "lru: index maps {addr} to {pos} holding {:?}",
                    self.log.get(pos)
                )));
            }
        }
        Ok(())
    }
}

impl Simulator for LruSim {
    fn access(&mut self, addr: i64) -> Result<AccessOutcome, SimError> {
        let addr = check_address(addr)?;
        let now = self.stats.begin_access();

        if let Some(old) = self.index.get(addr).pos {
            self.log[old] = None;
            let pos = self.append(addr);
            let meta = self.index.get_mut(addr);
            meta.pos = Some(pos);
            meta.last_ref = now;
            self.stats.note_occupancy(self.resident, self.capacity);
            return Ok(AccessOutcome::Hit);
        }

        self.stats.record_miss();
        let pos = self.append(addr);
        self.index.set(
            addr,
            LruMeta {
                pos: Some(pos),
                entered: now,
                last_ref: now,
            },
        );
        self.resident += 1;

        let evicted = if self.resident > self.capacity {
            Some(self.evict_tail(now)?)
        } else {
            None
        };
        self.stats.note_occupancy(self.resident, self.capacity);
        Ok(AccessOutcome::Miss { evicted })
    }
}
