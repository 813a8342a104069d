//! First In, First Out (FIFO) replacement simulator.
//!
//! Addresses leave in the order they arrived; hits change nothing but the
//! last-reference timestamp used for eviction ages.
//!
//! ```text
//!   RingBuffer<FifoSlot>, capacity 3
//!
//!   out ─► [ 4 | 9 | 2 ] ◄─ in        miss(7): pop 4, push 7
//!           oldest   newest                    [ 9 | 2 | 7 ]
//! ```
//!
//! For several FIFO lists with promotion between them see
//! [`multi_fifo`](crate::policy::multi_fifo).
use tracing::{debug, trace};

use crate::ds::address_table::AddressTable;
use crate::ds::ring_buffer::RingBuffer;
use crate::error::{InvariantError, SimError, check_address, check_capacity};
use crate::policy::SimOptions;
use crate::stats::{SimStats, StatsAccumulator};
use crate::traits::{AccessOutcome, Eviction, ReadOnlySimulator, Simulator};

/// Ring slot shared by FIFO and CLOCK: the address and when it entered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RingSlot {
    pub(crate) addr: u64,
    pub(crate) entered: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct FifoMeta {
    resident: bool,
    last_ref: u64,
}

/// Plain FIFO simulator.
#[derive(Debug, Clone)]
pub struct FifoSim {
    ring: RingBuffer<RingSlot>,
    index: AddressTable<FifoMeta>,
    stats: StatsAccumulator,
}

impl FifoSim {
    pub fn new(capacity: usize) -> Result<Self, SimError> {
        Self::with_options(capacity, SimOptions::default())
    }

    pub fn with_options(capacity: usize, options: SimOptions) -> Result<Self, SimError> {
        let capacity = check_capacity(capacity)?;
        debug!(capacity, table = ?options.table, "fifo simulator created");
        Ok(Self {
            ring: RingBuffer::new(capacity),
            index: AddressTable::with_mode(options.table),
            stats: StatsAccumulator::new(),
        })
    }
}

impl ReadOnlySimulator for FifoSim {
    fn name(&self) -> &'static str {
        "fifo"
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

    /// Newest first.
    fn contents(&self) -> Vec<u64> {
        self.ring.iter_newest_first().map(|s| s.addr).collect()
    }

    fn stats(&self) -> SimStats {
        self.stats.snapshot()
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        self.ring.check_invariants()?;
        for slot in self.ring.iter_newest_first() {
            if !self.index.get(slot.addr).resident {
                return Err(InvariantError::new(format!(
                    "fifo: ring holds {} but index says absent",
                    slot.addr
                )));
            }
        }
        let indexed = self.index.iter_set().filter(|(_, m)| m.resident).count();
        if indexed != self.ring.len() {
            return Err(InvariantError::new(format!(
                "fifo: {indexed} indexed residents, ring holds {}",
                self.ring.len()
            )));
        }
        Ok(())
    }
}

impl Simulator for FifoSim {
    fn access(&mut self, addr: i64) -> Result<AccessOutcome, SimError> {
        let addr = check_address(addr)?;
        let now = self.stats.begin_access();

        if self.index.get(addr).resident {
            self.index.get_mut(addr).last_ref = now;
            self.stats.note_occupancy(self.ring.len(), self.ring.capacity());
            return Ok(AccessOutcome::Hit);
        }

        self.stats.record_miss();
        let evicted = if self.ring.is_full() {
            let old = self
                .ring
                .pop_front()
                .ok_or_else(|| SimError::internal("fifo: full ring yielded nothing"))?;
            let meta = std::mem::take(self.index.get_mut(old.addr));
            self.index.reset(old.addr);

            let eviction = Eviction::new(old.addr, now, old.entered, meta.last_ref);
            self.stats.record_eviction(eviction.enter_age);
            trace!(victim = old.addr, enter_age = eviction.enter_age, "fifo evict");
            Some(eviction)
        } else {
            None
        };

        self.ring
            .push_back(RingSlot { addr, entered: now })
            .ok_or_else(|| SimError::internal("fifo: no free slot after eviction"))?;
        self.index.set(
            addr,
            FifoMeta {
                resident: true,
                last_ref: now,
            },
        );
        self.stats.note_occupancy(self.ring.len(), self.ring.capacity());
        Ok(AccessOutcome::Miss { evicted })
    }
}
