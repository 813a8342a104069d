//! Randomized multi-list FIFO.
//!
//! Same segmented layout as [`MultiFifoSim`](crate::policy::MultiFifoSim),
//! but slot choice is random instead of positional:
//!
//! ```text
//!   miss(a)          overwrite a uniform slot of list 0; its occupant leaves
//!   hit(a) in list i swap a with a uniform slot s of list i + 1;
//!   (i < K - 1)      s's occupant (if any) takes a's old slot
//!   hit in last list nothing moves
//! ```
//!
//! Each instance owns its generator, so two simulators built with the same
//! seed replay a trace identically.
use rand::Rng;
use rand::rngs::SmallRng;
use tracing::debug;

use crate::ds::address_table::AddressTable;
use crate::ds::segmented_ring::SegmentedRing;
use crate::error::{InvariantError, SimError, check_address};
use crate::policy::SimOptions;
use crate::policy::multi_fifo::{check_ring_and_times, retire};
use crate::stats::{Residency, SimStats, StatsAccumulator};
use crate::traits::{AccessOutcome, ReadOnlySimulator, Simulator};

/// Multi-list FIFO with random placement.
#[derive(Debug, Clone)]
pub struct RandomMultiSim {
    ring: SegmentedRing,
    times: AddressTable<Residency>,
    rng: SmallRng,
    stats: StatsAccumulator,
}

impl RandomMultiSim {
    pub fn new(sizes: &[usize]) -> Result<Self, SimError> {
        Self::with_options(sizes, SimOptions::default())
    }

    pub fn with_options(sizes: &[usize], options: SimOptions) -> Result<Self, SimError> {
        let ring = SegmentedRing::new(sizes, options.table)?;
        debug!(?sizes, seed = ?options.seed, "random multi-list fifo simulator created");
        Ok(Self {
            ring,
            times: AddressTable::with_mode(options.table),
            rng: options.rng(),
            stats: StatsAccumulator::new(),
        })
    }

    pub fn sizes(&self) -> &[usize] {
        self.ring.sizes()
    }

    pub fn list_of(&self, addr: u64) -> Option<usize> {
        self.ring.slot_of(addr).map(|slot| self.ring.list_of_slot(slot))
    }

    fn random_slot(&mut self, list: usize) -> usize {
        let pos = self.rng.random_range(0..self.ring.list_size(list));
        self.ring.phys_slot(list, pos)
    }
}

impl ReadOnlySimulator for RandomMultiSim {
    fn name(&self) -> &'static str {
        "multi_fifo_random"
    }

    fn capacity(&self) -> usize {
        self.ring.total_slots()
    }

    fn len(&self) -> usize {
        self.ring.len()
    }

    fn contains(&self, addr: u64) -> bool {
        self.ring.slot_of(addr).is_some()
    }

    /// List 0 front to back, then list 1, and so on.
    fn contents(&self) -> Vec<u64> {
        self.ring.contents()
    }

    fn stats(&self) -> SimStats {
        self.stats.snapshot()
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        check_ring_and_times(&self.ring, &self.times, "random multi fifo")
    }
}

impl Simulator for RandomMultiSim {
    fn access(&mut self, addr: i64) -> Result<AccessOutcome, SimError> {
        let addr = check_address(addr)?;
        let now = self.stats.begin_access();

        let Some(slot) = self.ring.slot_of(addr) else {
            self.stats.record_miss();
            let target = self.random_slot(0);
            let evicted = self
                .ring
                .replace(target, Some(addr))
                .map(|victim| retire(&mut self.times, &mut self.stats, victim, now, "random multi fifo"));
            self.times.set(
                addr,
                Residency {
                    entered: now,
                    last_ref: now,
                },
            );
            self.stats.note_occupancy(self.ring.len(), self.ring.total_slots());
            return Ok(AccessOutcome::Miss { evicted });
        };

        self.times.get_mut(addr).last_ref = now;
        let list = self.ring.list_of_slot(slot);
        if list + 1 < self.ring.list_count() {
            let target = self.random_slot(list + 1);
            let occupant = self.ring.replace(target, Some(addr));
            self.ring.replace(slot, occupant);
        }
        self.stats.note_occupancy(self.ring.len(), self.ring.total_slots());
        Ok(AccessOutcome::Hit)
    }
}
