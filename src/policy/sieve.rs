//! SIEVE replacement simulators.
//!
//! SIEVE keeps residents in insertion order and never moves them on a hit.
//! A persistent hand walks from the tail (oldest) toward the head (newest),
//! decrementing nonzero counters and evicting the first resident whose
//! counter is zero. Unlike CLOCK, a recycled entry stays where it is, so new
//! arrivals and survivors are never interleaved.
//!
//! ## Architecture
//!
//! ```text
//!   IntrusiveList<SieveNode>  (front = newest)
//!
//!   head ─► [ 9:0 ] ◄──► [ 4:1 ] ◄──► [ 2:0 ] ◄──► [ 7:1 ] ◄── tail
//!                                        ▲
//!                                       hand           (addr:counter)
//!
//!   evict: 2 has counter 0 → remove it, hand = 4 (toward head)
//!   had 2 been nonzero: decrement, hand = 4, keep scanning
//!   past the head the hand wraps to the tail
//! ```
//!
//! [`RandomSieveSim`] drops the ordering altogether: residents sit in a
//! dense vector, eviction samples uniform positions, and the victim is
//! removed with `swap_remove`.
//!
//! ## Example Usage
//!
//! ```
//! use cachesim::policy::sieve::SieveSim;
//! use cachesim::traits::{ReadOnlySimulator, Simulator};
//!
//! let mut sieve = SieveSim::new(3, 1).unwrap();
//! sieve.batch(&[1, 2, 3, 1, 4]).unwrap();
//!
//! // 1 survived in place; 2 was evicted
//! assert_eq!(sieve.contents(), vec![4, 3, 1]);
//! ```
use rand::Rng;
use rand::rngs::SmallRng;
use tracing::{debug, trace};

use crate::ds::address_table::AddressTable;
use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;
use crate::error::{InvariantError, SimError, check_address, check_capacity};
use crate::policy::SimOptions;
use crate::policy::fifo::RingSlot;
use crate::stats::{SimStats, StatsAccumulator};
use crate::traits::{AccessOutcome, Eviction, ReadOnlySimulator, Simulator};

#[derive(Debug, Clone, Default, PartialEq)]
struct SieveMeta {
    node: Option<SlotId>,
    counter: u32,
    last_ref: u64,
}

/// SIEVE simulator with a `K`-bounded counter.
#[derive(Debug, Clone)]
pub struct SieveSim {
    capacity: usize,
    max_counter: u32,
    list: IntrusiveList<RingSlot>,
    index: AddressTable<SieveMeta>,
    hand: Option<SlotId>,
    stats: StatsAccumulator,
}

impl SieveSim {
    /// Creates a SIEVE simulator. `max_counter` below 1 is raised to 1.
    pub fn new(capacity: usize, max_counter: u32) -> Result<Self, SimError> {
        Self::with_options(capacity, max_counter, SimOptions::default())
    }

    pub fn with_options(capacity: usize, max_counter: u32, options: SimOptions) -> Result<Self, SimError> {
        let capacity = check_capacity(capacity)?;
        let max_counter = max_counter.max(1);
        debug!(capacity, max_counter, "sieve simulator created");
        Ok(Self {
            capacity,
            max_counter,
            list: IntrusiveList::with_capacity(capacity),
            index: AddressTable::with_mode(options.table),
            hand: None,
            stats: StatsAccumulator::new(),
        })
    }

    pub fn max_counter(&self) -> u32 {
        self.max_counter
    }

    /// Address under the hand, if it is set.
    pub fn hand(&self) -> Option<u64> {
        self.hand.and_then(|id| self.list.get(id)).map(|n| n.addr)
    }

    pub fn counter(&self, addr: u64) -> Option<u32> {
        let meta = self.index.get(addr);
        meta.node.map(|_| meta.counter)
    }

    fn evict(&mut self, now: u64) -> Result<Eviction, SimError> {
        let mut cursor = self.hand.or_else(|| self.list.back_id());
        loop {
            let id = cursor.ok_or_else(|| SimError::internal("sieve: eviction on empty list"))?;
            let node = *self
                .list
                .get(id)
                .ok_or_else(|| SimError::internal("sieve: hand points at a freed node"))?;

            self.stats.record_examined();
            let meta = self.index.get_mut(node.addr);
            if meta.counter == 0 {
                self.hand = self.list.prev_id(id);
                self.list.remove(id);
                let meta = std::mem::take(meta);
                self.index.reset(node.addr);

                let eviction = Eviction::new(node.addr, now, node.entered, meta.last_ref);
                self.stats.record_eviction(eviction.enter_age);
                trace!(victim = node.addr, enter_age = eviction.enter_age, "sieve evict");
                return Ok(eviction);
            }

            let counter = meta.counter;
            meta.counter -= 1;
            self.stats.record_recycle(counter);
            cursor = self.list.prev_id(id).or_else(|| self.list.back_id());
        }
    }
}

impl ReadOnlySimulator for SieveSim {
    fn name(&self) -> &'static str {
        "sieve"
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn len(&self) -> usize {
        self.list.len()
    }

    fn contains(&self, addr: u64) -> bool {
        self.index.get(addr).node.is_some()
    }

    /// Head (newest) to tail.
    fn contents(&self) -> Vec<u64> {
        self.list.iter().map(|n| n.addr).collect()
    }

    fn stats(&self) -> SimStats {
        self.stats.snapshot()
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        self.list.check_invariants()?;
        if self.list.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "sieve: {} residents exceed capacity {}",
                self.list.len(),
                self.capacity
            )));
        }
        if let Some(hand) = self.hand
            && !self.list.contains(hand)
        {
            return Err(InvariantError::new("sieve: hand points at a freed node"));
        }
        for id in self.list.iter_ids() {
            let Some(node) = self.list.get(id) else { continue };
            let meta = self.index.get(node.addr);
            if meta.node != Some(id) {
                return Err(InvariantError::new(format!(
                    "sieve: node for {} not indexed ({:?})",
                    node.addr, meta.node
                )));
            }
            if meta.counter > self.max_counter {
                return Err(InvariantError::new(format!(
                    "sieve: counter {} of {} exceeds {}",
                    meta.counter, node.addr, self.max_counter
                )));
            }
        }
        let indexed = self.index.iter_set().filter(|(_, m)| m.node.is_some()).count();
        if indexed != self.list.len() {
            return Err(InvariantError::new(format!(
                "sieve: {indexed} indexed residents, list holds {}",
                self.list.len()
            )));
        }
        Ok(())
    }
}

impl Simulator for SieveSim {
    fn access(&mut self, addr: i64) -> Result<AccessOutcome, SimError> {
        let addr = check_address(addr)?;
        let now = self.stats.begin_access();
        let max_counter = self.max_counter;

        let meta = self.index.get_mut(addr);
        if meta.node.is_some() {
            meta.counter = (meta.counter + 1).min(max_counter);
            meta.last_ref = now;
            self.stats.note_occupancy(self.list.len(), self.capacity);
            return Ok(AccessOutcome::Hit);
        }

        self.stats.record_miss();
        let evicted = if self.list.len() >= self.capacity {
            Some(self.evict(now)?)
        } else {
            None
        };

        let id = self.list.push_front(RingSlot { addr, entered: now });
        self.index.set(
            addr,
            SieveMeta {
                node: Some(id),
                counter: 0,
                last_ref: now,
            },
        );
        self.stats.note_occupancy(self.list.len(), self.capacity);
        Ok(AccessOutcome::Miss { evicted })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct RandomSieveMeta {
    pos: Option<usize>,
    counter: u32,
    last_ref: u64,
}

/// SIEVE variant that samples eviction candidates uniformly.
#[derive(Debug, Clone)]
pub struct RandomSieveSim {
    capacity: usize,
    max_counter: u32,
    residents: Vec<RingSlot>,
    index: AddressTable<RandomSieveMeta>,
    rng: SmallRng,
    stats: StatsAccumulator,
}

impl RandomSieveSim {
    pub fn new(capacity: usize, max_counter: u32) -> Result<Self, SimError> {
        Self::with_options(capacity, max_counter, SimOptions::default())
    }

    pub fn with_options(capacity: usize, max_counter: u32, options: SimOptions) -> Result<Self, SimError> {
        let capacity = check_capacity(capacity)?;
        let max_counter = max_counter.max(1);
        debug!(capacity, max_counter, seed = ?options.seed, "random sieve simulator created");
        Ok(Self {
            capacity,
            max_counter,
            residents: Vec::with_capacity(capacity),
            index: AddressTable::with_mode(options.table),
            rng: options.rng(),
            stats: StatsAccumulator::new(),
        })
    }

    pub fn max_counter(&self) -> u32 {
        self.max_counter
    }

    fn evict(&mut self, now: u64) -> Result<Eviction, SimError> {
        if self.residents.is_empty() {
            return Err(SimError::internal("random sieve: eviction on empty cache"));
        }
        loop {
            let pos = self.rng.random_range(0..self.residents.len());
            let slot = self.residents[pos];
            self.stats.record_examined();

            let meta = self.index.get_mut(slot.addr);
            if meta.counter > 0 {
                let counter = meta.counter;
                meta.counter -= 1;
                self.stats.record_recycle(counter);
                continue;
            }

            let meta = std::mem::take(meta);
            self.index.reset(slot.addr);
            self.residents.swap_remove(pos);
            if let Some(moved) = self.residents.get(pos) {
                self.index.get_mut(moved.addr).pos = Some(pos);
            }

            let eviction = Eviction::new(slot.addr, now, slot.entered, meta.last_ref);
            self.stats.record_eviction(eviction.enter_age);
            trace!(victim = slot.addr, enter_age = eviction.enter_age, "random sieve evict");
            return Ok(eviction);
        }
    }
}

impl ReadOnlySimulator for RandomSieveSim {
    fn name(&self) -> &'static str {
        "sieve_random"
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn len(&self) -> usize {
        self.residents.len()
    }

    fn contains(&self, addr: u64) -> bool {
        self.index.get(addr).pos.is_some()
    }

    /// Vector order.
    fn contents(&self) -> Vec<u64> {
        self.residents.iter().map(|s| s.addr).collect()
    }

    fn stats(&self) -> SimStats {
        self.stats.snapshot()
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.residents.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "random sieve: {} residents exceed capacity {}",
                self.residents.len(),
                self.capacity
            )));
        }
        for (pos, slot) in self.residents.iter().enumerate() {
            let meta = self.index.get(slot.addr);
            if meta.pos != Some(pos) {
                return Err(InvariantError::new(format!(
                    "random sieve: {} at {pos} but index says {:?}",
                    slot.addr, meta.pos
                )));
            }
            if meta.counter > self.max_counter {
                return Err(InvariantError::new(format!(
                    "random sieve: counter {} of {} exceeds {}",
                    meta.counter, slot.addr, self.max_counter
                )));
            }
        }
        let indexed = self.index.iter_set().filter(|(_, m)| m.pos.is_some()).count();
        if indexed != self.residents.len() {
            return Err(InvariantError::new(format!(
                "random sieve: {indexed} indexed residents, vector holds {}",
                self.residents.len()
            )));
        }
        Ok(())
    }
}

impl Simulator for RandomSieveSim {
    fn access(&mut self, addr: i64) -> Result<AccessOutcome, SimError> {
        let addr = check_address(addr)?;
        let now = self.stats.begin_access();
        let max_counter = self.max_counter;

        let meta = self.index.get_mut(addr);
        if meta.pos.is_some() {
            meta.counter = (meta.counter + 1).min(max_counter);
            meta.last_ref = now;
            self.stats.note_occupancy(self.residents.len(), self.capacity);
            return Ok(AccessOutcome::Hit);
        }

        self.stats.record_miss();
        let evicted = if self.residents.len() >= self.capacity {
            Some(self.evict(now)?)
        } else {
            None
        };

        self.index.set(
            addr,
            RandomSieveMeta {
                pos: Some(self.residents.len()),
                counter: 0,
                last_ref: now,
            },
        );
        self.residents.push(RingSlot { addr, entered: now });
        self.stats.note_occupancy(self.residents.len(), self.capacity);
        Ok(AccessOutcome::Miss { evicted })
    }
}
