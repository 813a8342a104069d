//! Belady-MIN: the offline optimal replacement policy.
//!
//! With the whole trace known up front, evicting the resident whose next
//! reference is furthest in the future (or never comes) maximizes the hit
//! rate of a single-tier cache. It is the upper bound every online policy is
//! measured against.
//!
//! ## Algorithm
//!
//! ```text
//!   trace:  a  b  c  a  b  d  a  c
//!   pos:    0  1  2  3  4  5  6  7
//!   next:   3  4  7  6  8  8  8  8        (8 = n, never again)
//!
//!   residents: LazyMinHeap<addr, Reverse(next)>
//!     hit at i        → rescore addr to Reverse(next[i])
//!     miss, full      → pop_best() = resident with the largest next
//!     miss            → insert addr with Reverse(next[i])
//! ```
//!
//! Rescoring pushes a new heap entry and leaves the old one stale; stale
//! entries are skipped on pop and periodically compacted.
//!
//! ## Example Usage
//!
//! ```
//! use cachesim::policy::belady::BeladyMin;
//! use cachesim::traits::ReadOnlySimulator;
//!
//! let mut min = BeladyMin::new(2).unwrap();
//! min.replay(&[1, 2, 3, 1, 2, 3]).unwrap();
//! // when 3 arrives, 2 goes: 1 is needed again first
//! assert_eq!(min.stats().miss_count, 4);
//! assert_eq!(min.contents(), vec![2, 3]);
//! ```
use std::cmp::Reverse;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::ds::address_table::AddressTable;
use crate::ds::lazy_heap::LazyMinHeap;
use crate::error::{InvariantError, SimError, check_address};
use crate::policy::SimOptions;
use crate::stats::{Residency, SimStats, StatsAccumulator};
use crate::traits::{AccessOutcome, Eviction, ReadOnlySimulator};

/// Stale heap entries tolerated per live resident before a rebuild.
const REBUILD_FACTOR: usize = 4;

/// For every position, the index of the same address's next occurrence, or
/// `trace.len()` if it does not recur.
pub(crate) fn next_occurrences(trace: &[u64]) -> Vec<usize> {
    let n = trace.len();
    let mut next = vec![n; n];
    let mut seen: FxHashMap<u64, usize> = FxHashMap::default();
    for (i, &addr) in trace.iter().enumerate().rev() {
        if let Some(later) = seen.insert(addr, i) {
            next[i] = later;
        }
    }
    next
}

/// Offline optimal simulator.
#[derive(Debug, Clone)]
pub struct BeladyMin {
    capacity: usize,
    residents: LazyMinHeap<u64, Reverse<usize>>,
    times: AddressTable<Residency>,
    options: SimOptions,
    stats: StatsAccumulator,
}

impl BeladyMin {
    /// Creates a MIN simulator. A capacity of 0 is allowed: every reference
    /// misses.
    pub fn new(capacity: usize) -> Result<Self, SimError> {
        Self::with_options(capacity, SimOptions::default())
    }

    pub fn with_options(capacity: usize, options: SimOptions) -> Result<Self, SimError> {
        debug!(capacity, "belady-min simulator created");
        Ok(Self {
            capacity,
            residents: LazyMinHeap::with_capacity(capacity),
            times: AddressTable::with_mode(options.table),
            options,
            stats: StatsAccumulator::new(),
        })
    }

    /// Resets and replays `trace` from the start.
    ///
    /// Every address is validated before any state changes; a negative one
    /// fails with its position and leaves the previous run intact.
    pub fn replay(&mut self, trace: &[i64]) -> Result<(), SimError> {
        self.run(trace, |_| {})
    }

    /// Like [`replay`](Self::replay), collecting each outcome.
    pub fn replay_outcomes(&mut self, trace: &[i64]) -> Result<Vec<AccessOutcome>, SimError> {
        let mut outcomes = Vec::with_capacity(trace.len());
        self.run(trace, |outcome| outcomes.push(outcome))?;
        Ok(outcomes)
    }

    fn run(&mut self, trace: &[i64], mut sink: impl FnMut(AccessOutcome)) -> Result<(), SimError> {
        let addrs = trace
            .iter()
            .enumerate()
            .map(|(position, &addr)| check_address(addr).map_err(|e| e.at_position(position)))
            .collect::<Result<Vec<u64>, SimError>>()?;
        let next = next_occurrences(&addrs);

        self.reset();
        for (&addr, &next_use) in addrs.iter().zip(&next) {
            let outcome = self.step(addr, next_use)?;
            sink(outcome);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.residents.clear();
        self.times = AddressTable::with_mode(self.options.table);
        self.stats.reset();
    }

    fn step(&mut self, addr: u64, next_use: usize) -> Result<AccessOutcome, SimError> {
        let now = self.stats.begin_access();

        if self.residents.score_of(&addr).is_some() {
            self.residents.update(addr, Reverse(next_use));
            self.times.get_mut(addr).last_ref = now;
            self.residents.maybe_rebuild(REBUILD_FACTOR);
            self.stats.note_occupancy(self.residents.len(), self.capacity);
            return Ok(AccessOutcome::Hit);
        }

        self.stats.record_miss();
        if self.capacity == 0 {
            self.stats.note_occupancy(0, 0);
            return Ok(AccessOutcome::Miss { evicted: None });
        }

        let evicted = if self.residents.len() >= self.capacity {
            let (victim, Reverse(victim_next)) = self
                .residents
                .pop_best()
                .ok_or_else(|| SimError::internal("belady-min: full cache with empty heap"))?;
            let residency = *self.times.get(victim);
            self.times.reset(victim);

            let eviction = Eviction::new(victim, now, residency.entered, residency.last_ref);
            self.stats.record_eviction(eviction.enter_age);
            trace!(victim, next_use = victim_next, enter_age = eviction.enter_age, "belady-min evict");
            Some(eviction)
        } else {
            None
        };

        self.residents.update(addr, Reverse(next_use));
        self.times.set(
            addr,
            Residency {
                entered: now,
                last_ref: now,
            },
        );
        self.stats.note_occupancy(self.residents.len(), self.capacity);
        Ok(AccessOutcome::Miss { evicted })
    }
}

impl ReadOnlySimulator for BeladyMin {
    fn name(&self) -> &'static str {
        "belady_min"
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn len(&self) -> usize {
        self.residents.len()
    }

    fn contains(&self, addr: u64) -> bool {
        self.residents.score_of(&addr).is_some()
    }

    /// Ascending address order.
    fn contents(&self) -> Vec<u64> {
        let mut resident: Vec<u64> = self.residents.keys().copied().collect();
        resident.sort_unstable();
        resident
    }

    fn stats(&self) -> SimStats {
        self.stats.snapshot()
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        self.residents.check_invariants()?;
        if self.residents.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "belady-min: {} residents exceed capacity {}",
                self.residents.len(),
                self.capacity
            )));
        }
        for &addr in self.residents.keys() {
            if *self.times.get(addr) == Residency::default() {
                return Err(InvariantError::new(format!("belady-min: resident {addr} has no timestamps")));
            }
        }
        let timed = self.times.iter_set().count();
        if timed != self.residents.len() {
            return Err(InvariantError::new(format!(
                "belady-min: {timed} timestamped addresses, {} residents",
                self.residents.len()
            )));
        }
        Ok(())
    }
}
