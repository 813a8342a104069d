//! CLOCK family of replacement simulators.
//!
//! Every resident carries an aging counter in `0..=K`. A hit increments it
//! (saturating at `K`); eviction looks for a resident whose counter is zero,
//! decrementing nonzero counters along the way ("recycling" them). `K = 1`
//! is classic second-chance CLOCK.
//!
//! ## Architecture
//!
//! ```text
//!   ring: RingBuffer<RingSlot>           index: AddressTable<ClockMeta>
//!
//!   out                       in         addr → { resident, counter, entered, last_ref }
//!    │                         │
//!    ▼                         ▼
//!   [ 7:1 | 3:0 | 9:2 | 5:0 ]  gap       (addr:counter)
//! ```
//!
//! ## Scan Strategies
//!
//! ```text
//!   Sequential              pop front; counter > 0 → decrement, push back
//!                           counter = 0 → evict, push newcomer at back
//!
//!   RandomWithReplacement   draw offset k in 0..C; counter > 0 → decrement,
//!                           draw again; counter = 0 → newcomer takes slot k
//!
//!   RandomShuffle           shuffle 0..C once and walk it; decrement
//!                           nonzero counters; evict the first zero, or the
//!                           first candidate if none was zero
//! ```
//!
//! ## Statistics
//!
//! Each candidate inspected bumps `examined_count`; each decrement bumps
//! `recycle_count` and adds the pre-decrement counter to
//! `recycled_counter_sum`.
//!
//! A slot's `entered` time is when it last joined the queue, so a sequential
//! recycle restarts it. `SimStats` eviction ages are measured from that
//! queue time; `Eviction::enter_age` is measured from admission.
//!
//! ## Example Usage
//!
//! ```
//! use cachesim::policy::clock::{ClockScan, ClockSim};
//! use cachesim::traits::{ReadOnlySimulator, Simulator};
//!
//! let mut clock = ClockSim::new(3, 1, ClockScan::Sequential).unwrap();
//! clock.batch(&[1, 2, 3, 1, 4]).unwrap();
//!
//! // 1 got a second chance, 2 did not
//! assert_eq!(clock.contents(), vec![4, 1, 3]);
//! assert_eq!(clock.stats().recycle_count, 1);
//! ```
use rand::Rng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::ds::address_table::AddressTable;
use crate::ds::ring_buffer::RingBuffer;
use crate::error::{InvariantError, SimError, check_address, check_capacity};
use crate::policy::SimOptions;
use crate::policy::fifo::RingSlot;
use crate::stats::{SimStats, StatsAccumulator};
use crate::traits::{AccessOutcome, Eviction, ReadOnlySimulator, Simulator};

/// How the eviction scan picks candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockScan {
    /// Sweep from the oldest entry, recycling to the back.
    #[default]
    Sequential,
    /// Uniform draws with replacement.
    RandomWithReplacement,
    /// One shuffled pass without replacement.
    RandomShuffle,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct ClockMeta {
    resident: bool,
    counter: u32,
    entered: u64,
    last_ref: u64,
}

/// CLOCK simulator with a `K`-bounded counter.
#[derive(Debug, Clone)]
pub struct ClockSim {
    ring: RingBuffer<RingSlot>,
    index: AddressTable<ClockMeta>,
    max_counter: u32,
    scan: ClockScan,
    rng: SmallRng,
    order: Vec<usize>,
    stats: StatsAccumulator,
}

impl ClockSim {
    /// Creates a CLOCK simulator. `max_counter` below 1 is raised to 1.
    pub fn new(capacity: usize, max_counter: u32, scan: ClockScan) -> Result<Self, SimError> {
        Self::with_options(capacity, max_counter, scan, SimOptions::default())
    }

    pub fn with_options(
        capacity: usize,
        max_counter: u32,
        scan: ClockScan,
        options: SimOptions,
    ) -> Result<Self, SimError> {
        let capacity = check_capacity(capacity)?;
        let max_counter = max_counter.max(1);
        debug!(capacity, max_counter, ?scan, seed = ?options.seed, "clock simulator created");
        Ok(Self {
            ring: RingBuffer::new(capacity),
            index: AddressTable::with_mode(options.table),
            max_counter,
            scan,
            rng: options.rng(),
            order: Vec::new(),
            stats: StatsAccumulator::new(),
        })
    }

    pub fn max_counter(&self) -> u32 {
        self.max_counter
    }

    pub fn scan(&self) -> ClockScan {
        self.scan
    }

    /// Aging counter of a resident address.
    pub fn counter(&self, addr: u64) -> Option<u32> {
        let meta = self.index.get(addr);
        meta.resident.then_some(meta.counter)
    }

    /// Inspects `addr` as a candidate. Returns `true` if its counter was zero;
    /// otherwise decrements it and counts a recycle.
    fn inspect(&mut self, addr: u64) -> bool {
        self.stats.record_examined();
        let meta = self.index.get_mut(addr);
        if meta.counter == 0 {
            return true;
        }
        let counter = meta.counter;
        meta.counter -= 1;
        self.stats.record_recycle(counter);
        false
    }

    fn retire(&mut self, old: RingSlot, now: u64) -> Eviction {
        let meta = std::mem::take(self.index.get_mut(old.addr));
        self.index.reset(old.addr);
        let eviction = Eviction::new(old.addr, now, meta.entered, meta.last_ref);
        let queue_age = now.saturating_sub(old.entered);
        self.stats.record_eviction(queue_age);
        trace!(
            victim = old.addr,
            enter_age = eviction.enter_age,
            queue_age,
            scan = ?self.scan,
            "clock evict"
        );
        eviction
    }

    fn evict_sequential(&mut self, incoming: RingSlot, now: u64) -> Result<Eviction, SimError> {
        loop {
            let slot = self
                .ring
                .pop_front()
                .ok_or_else(|| SimError::internal("clock: scan on empty ring"))?;
            if self.inspect(slot.addr) {
                let eviction = self.retire(slot, now);
                self.push(incoming)?;
                return Ok(eviction);
            }
            self.push(RingSlot {
                addr: slot.addr,
                entered: now,
            })?;
        }
    }

    fn evict_with_replacement(&mut self, incoming: RingSlot, now: u64) -> Result<Eviction, SimError> {
        let len = self.ring.len();
        loop {
            let offset = self.rng.random_range(0..len);
            let addr = self.slot_at(offset)?.addr;
            if self.inspect(addr) {
                return self.overwrite(offset, incoming, now);
            }
        }
    }

    fn evict_shuffled(&mut self, incoming: RingSlot, now: u64) -> Result<Eviction, SimError> {
        let mut order = std::mem::take(&mut self.order);
        order.clear();
        order.extend(0..self.ring.len());
        order.shuffle(&mut self.rng);

        let mut victim = None;
        for &offset in &order {
            let addr = self.slot_at(offset)?.addr;
            if self.inspect(addr) {
                victim = Some(offset);
                break;
            }
        }
        let offset = victim.or_else(|| order.first().copied());
        self.order = order;

        let offset = offset.ok_or_else(|| SimError::internal("clock: shuffle over empty ring"))?;
        self.overwrite(offset, incoming, now)
    }

    fn slot_at(&self, offset: usize) -> Result<RingSlot, SimError> {
        self.ring
            .get(offset)
            .copied()
            .ok_or_else(|| SimError::internal(format!("clock: offset {offset} outside ring")))
    }

    fn overwrite(&mut self, offset: usize, incoming: RingSlot, now: u64) -> Result<Eviction, SimError> {
        let old = self
            .ring
            .replace(offset, incoming)
            .ok_or_else(|| SimError::internal(format!("clock: offset {offset} outside ring")))?;
        Ok(self.retire(old, now))
    }

    fn push(&mut self, slot: RingSlot) -> Result<(), SimError> {
        self.ring
            .push_back(slot)
            .map(|_| ())
            .ok_or_else(|| SimError::internal("clock: push into full ring"))
    }
}

impl ReadOnlySimulator for ClockSim {
    fn name(&self) -> &'static str {
        match self.scan {
            ClockScan::Sequential => "clock",
            ClockScan::RandomWithReplacement => "clock_random",
            ClockScan::RandomShuffle => "clock_shuffle",
        }
    }

    fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    fn len(&self) -> usize {
        self.ring.len()
    }

    fn contains(&self, addr: u64) -> bool {
        self.index.get(addr).resident
    }

    /// Newest slot first.
    fn contents(&self) -> Vec<u64> {
        self.ring.iter_newest_first().map(|s| s.addr).collect()
    }

    fn stats(&self) -> SimStats {
        self.stats.snapshot()
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        self.ring.check_invariants()?;
        for slot in self.ring.iter_newest_first() {
            let meta = self.index.get(slot.addr);
            if !meta.resident {
                return Err(InvariantError::new(format!(
                    "clock: ring holds {} but index says absent",
                    slot.addr
                )));
            }
            if meta.counter > self.max_counter {
                return Err(InvariantError::new(format!(
                    "clock: counter {} of {} exceeds {}",
                    meta.counter, slot.addr, self.max_counter
                )));
            }
        }
        let indexed = self.index.iter_set().filter(|(_, m)| m.resident).count();
        if indexed != self.ring.len() {
            return Err(InvariantError::new(format!(
                "clock: {indexed} indexed residents, ring holds {}",
                self.ring.len()
            )));
        }
        Ok(())
    }
}

impl Simulator for ClockSim {
    fn access(&mut self, addr: i64) -> Result<AccessOutcome, SimError> {
        let addr = check_address(addr)?;
        let now = self.stats.begin_access();
        let max_counter = self.max_counter;

        let meta = self.index.get_mut(addr);
        if meta.resident {
            meta.counter = (meta.counter + 1).min(max_counter);
            meta.last_ref = now;
            self.stats.note_occupancy(self.ring.len(), self.ring.capacity());
            return Ok(AccessOutcome::Hit);
        }

        self.stats.record_miss();
        let incoming = RingSlot { addr, entered: now };
        let evicted = if self.ring.is_full() {
            Some(match self.scan {
                ClockScan::Sequential => self.evict_sequential(incoming, now)?,
                ClockScan::RandomWithReplacement => self.evict_with_replacement(incoming, now)?,
                ClockScan::RandomShuffle => self.evict_shuffled(incoming, now)?,
            })
        } else {
            self.push(incoming)?;
            None
        };

        self.index.set(
            addr,
            ClockMeta {
                resident: true,
                counter: 0,
                entered: now,
                last_ref: now,
            },
        );
        self.stats.note_occupancy(self.ring.len(), self.ring.capacity());
        Ok(AccessOutcome::Miss { evicted })
    }
}
