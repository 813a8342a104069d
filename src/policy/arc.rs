//! Adaptive Replacement Cache (ARC) simulator.
//!
//! ARC balances recency against frequency with two resident lists and two
//! ghost lists, steering the split with a target size `p` for T1.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              ArcSim Layout                              │
//! │                                                                         │
//! │   index: AddressTable<ArcMeta>   addr → { (T1|T2, SlotId), times }      │
//! │                                                                         │
//! │   T1 (seen once, resident)              T2 (seen twice+, resident)      │
//! │   ┌──────────────────────────┐          ┌──────────────────────────┐    │
//! │   │ MRU                  LRU │          │ MRU                  LRU │    │
//! │   │ [12] ◄──► [4] ◄──► [90]  │          │ [7] ◄──► [33]            │    │
//! │   └─────────────────────┬────┘          └──────────────────┬───────┘    │
//! │                REPLACE  │                         REPLACE  │            │
//! │                         ▼                                  ▼            │
//! │   B1 (ghosts of T1, ≤ C)                B2 (ghosts of T2, ≤ 2C)         │
//! │   ┌──────────────────────────┐          ┌──────────────────────────┐    │
//! │   │ addresses only           │          │ addresses only           │    │
//! │   └──────────────────────────┘          └──────────────────────────┘    │
//! │                                                                         │
//! │   p ∈ [0, C]: hit in B1 raises p (favor recency)                        │
//! │               hit in B2 lowers p (favor frequency)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm
//!
//! ```text
//! ACCESS(a):
//!   a in T1 or T2     → hit; move a to T2 MRU
//!   a in B1           → p = min(C, p + max(1, |B2| / |B1|))
//!                       REPLACE; a leaves B1 for T2 MRU
//!   a in B2           → p = max(0, p - max(1, |B1| / |B2|))
//!                       REPLACE; a leaves B2 for T2 MRU
//!   unseen            → if |T1| + |B1| == C:
//!                           |T1| < C → drop B1 LRU; REPLACE
//!                           else     → discard T1 LRU (no ghost)
//!                       elif |T1| + |T2| + |B1| + |B2| >= C:
//!                           total == 2C → drop B2 LRU
//!                           REPLACE
//!                       a → T1 MRU
//!
//! REPLACE:
//!   T1 nonempty and (|T1| >= p or T2 empty) → T1 LRU to B1 MRU
//!   otherwise                               → T2 LRU to B2 MRU
//! ```
//!
//! Ghost hits are misses; they are also counted as recycles in
//! [`SimStats::recycle_count`].
//!
//! ## Example Usage
//!
//! ```
//! use cachesim::policy::arc::ArcSim;
//! use cachesim::traits::{ReadOnlySimulator, Simulator};
//!
//! let mut arc = ArcSim::new(2).unwrap();
//! arc.batch(&[1, 1, 2, 3]).unwrap();
//! // 2 fell into B1; referencing it again pulls p toward recency
//! assert!(arc.in_b1(2));
//! arc.access(2).unwrap();
//! assert_eq!(arc.p(), 1);
//! assert_eq!(arc.contents(), vec![2, 1]);
//! ```
use tracing::{debug, trace};

use crate::ds::address_table::AddressTable;
use crate::ds::ghost_list::GhostList;
use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;
use crate::error::{InvariantError, SimError, check_address, check_capacity};
use crate::policy::SimOptions;
use crate::stats::{SimStats, StatsAccumulator};
use crate::traits::{AccessOutcome, Eviction, ReadOnlySimulator, Simulator};

/// Which resident list holds an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    T1,
    T2,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ArcMeta {
    slot: Option<(ListKind, SlotId)>,
    entered: u64,
    last_ref: u64,
}

/// ARC simulator.
#[derive(Debug, Clone)]
pub struct ArcSim {
    capacity: usize,
    p: usize,
    t1: IntrusiveList<u64>,
    t2: IntrusiveList<u64>,
    b1: GhostList,
    b2: GhostList,
    index: AddressTable<ArcMeta>,
    stats: StatsAccumulator,
}

impl ArcSim {
    pub fn new(capacity: usize) -> Result<Self, SimError> {
        Self::with_options(capacity, SimOptions::default())
    }

    pub fn with_options(capacity: usize, options: SimOptions) -> Result<Self, SimError> {
        let capacity = check_capacity(capacity)?;
        debug!(capacity, table = ?options.table, "arc simulator created");
        Ok(Self {
            capacity,
            p: 0,
            t1: IntrusiveList::with_capacity(capacity),
            t2: IntrusiveList::with_capacity(capacity),
            b1: GhostList::new(capacity),
            b2: GhostList::new(2 * capacity),
            index: AddressTable::with_mode(options.table),
            stats: StatsAccumulator::new(),
        })
    }

    /// Target size of T1.
    pub fn p(&self) -> usize {
        self.p
    }

    pub fn t1_len(&self) -> usize {
        self.t1.len()
    }

    pub fn t2_len(&self) -> usize {
        self.t2.len()
    }

    pub fn b1_len(&self) -> usize {
        self.b1.len()
    }

    pub fn b2_len(&self) -> usize {
        self.b2.len()
    }

    /// Returns `true` if `addr` is a ghost in B1.
    pub fn in_b1(&self, addr: u64) -> bool {
        self.b1.contains(addr)
    }

    /// Returns `true` if `addr` is a ghost in B2.
    pub fn in_b2(&self, addr: u64) -> bool {
        self.b2.contains(addr)
    }

    fn history_len(&self) -> usize {
        self.t1.len() + self.t2.len() + self.b1.len() + self.b2.len()
    }

    /// Moves one resident into a ghost list.
    fn replace(&mut self, now: u64) -> Result<Option<Eviction>, SimError> {
        let from_t1 = !self.t1.is_empty() && (self.t1.len() >= self.p || self.t2.is_empty());
        if from_t1 {
            let victim = self
                .t1
                .pop_back()
                .ok_or_else(|| SimError::internal("arc: T1 emptied during replace"))?;
            self.b1.record(victim);
            Ok(Some(self.retire(victim, now)))
        } else {
            let Some(victim) = self.t2.pop_back() else {
                return Ok(None);
            };
            self.b2.record(victim);
            Ok(Some(self.retire(victim, now)))
        }
    }

    /// Drops the metadata of a resident already unlinked from T1/T2.
    fn retire(&mut self, victim: u64, now: u64) -> Eviction {
        let meta = *self.index.get(victim);
        self.index.reset(victim);
        let eviction = Eviction::new(victim, now, meta.entered, meta.last_ref);
        self.stats.record_eviction(eviction.enter_age);
        trace!(victim, enter_age = eviction.enter_age, p = self.p, "arc evict");
        eviction
    }

    fn insert_t2(&mut self, addr: u64, now: u64) {
        let id = self.t2.push_front(addr);
        self.index.set(
            addr,
            ArcMeta {
                slot: Some((ListKind::T2, id)),
                entered: now,
                last_ref: now,
            },
        );
    }

    fn adapt(&mut self, p: usize) {
        if p != self.p {
            trace!(from = self.p, to = p, "arc adapted target");
        }
        self.p = p;
    }

    fn miss(&mut self, addr: u64, now: u64) -> Result<Option<Eviction>, SimError> {
        if self.b1.contains(addr) {
            let delta = (self.b2.len() / self.b1.len()).max(1);
            self.adapt((self.p + delta).min(self.capacity));
            self.stats.record_recycle(0);
            let evicted = self.replace(now)?;
            self.b1.remove(addr);
            self.insert_t2(addr, now);
            return Ok(evicted);
        }

        if self.b2.contains(addr) {
            let delta = (self.b1.len() / self.b2.len()).max(1);
            self.adapt(self.p.saturating_sub(delta));
            self.stats.record_recycle(0);
            let evicted = self.replace(now)?;
            self.b2.remove(addr);
            self.insert_t2(addr, now);
            return Ok(evicted);
        }

        let evicted = if self.t1.len() + self.b1.len() == self.capacity {
            if self.t1.len() < self.capacity {
                self.b1.pop_lru();
                self.replace(now)?
            } else {
                let victim = self
                    .t1
                    .pop_back()
                    .ok_or_else(|| SimError::internal("arc: full T1 yielded nothing"))?;
                Some(self.retire(victim, now))
            }
        } else if self.history_len() >= self.capacity {
            if self.history_len() == 2 * self.capacity {
                self.b2.pop_lru();
            }
            self.replace(now)?
        } else {
            None
        };

        let id = self.t1.push_front(addr);
        self.index.set(
            addr,
            ArcMeta {
                slot: Some((ListKind::T1, id)),
                entered: now,
                last_ref: now,
            },
        );
        Ok(evicted)
    }
}

impl ReadOnlySimulator for ArcSim {
    fn name(&self) -> &'static str {
        "arc"
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn len(&self) -> usize {
        self.t1.len() + self.t2.len()
    }

    fn contains(&self, addr: u64) -> bool {
        self.index.get(addr).slot.is_some()
    }

    /// T1 from MRU to LRU, then T2 from MRU to LRU.
    fn contents(&self) -> Vec<u64> {
        self.t1.iter().chain(self.t2.iter()).copied().collect()
    }

    fn stats(&self) -> SimStats {
        self.stats.snapshot()
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        self.t1.check_invariants()?;
        self.t2.check_invariants()?;
        self.b1.check_invariants()?;
        self.b2.check_invariants()?;

        let c = self.capacity;
        if self.p > c {
            return Err(InvariantError::new(format!("arc: p = {} exceeds capacity {c}", self.p)));
        }
        if self.len() > c {
            return Err(InvariantError::new(format!(
                "arc: {} residents exceed capacity {c}",
                self.len()
            )));
        }
        if self.t1.len() + self.b1.len() > c {
            return Err(InvariantError::new(format!(
                "arc: |T1| + |B1| = {} exceeds {c}",
                self.t1.len() + self.b1.len()
            )));
        }
        if self.history_len() > 2 * c {
            return Err(InvariantError::new(format!(
                "arc: history of {} exceeds {}",
                self.history_len(),
                2 * c
            )));
        }

        for (kind, list) in [(ListKind::T1, &self.t1), (ListKind::T2, &self.t2)] {
            for id in list.iter_ids() {
                let Some(&addr) = list.get(id) else { continue };
                let slot = self.index.get(addr).slot;
                if slot != Some((kind, id)) {
                    return Err(InvariantError::new(format!(
                        "arc: {addr} in {kind:?} but index says {slot:?}"
                    )));
                }
                if self.b1.contains(addr) || self.b2.contains(addr) {
                    return Err(InvariantError::new(format!("arc: {addr} is both resident and ghost")));
                }
            }
        }
        if let Some(addr) = self.b1.iter().find(|&a| self.b2.contains(a)) {
            return Err(InvariantError::new(format!("arc: {addr} is in both B1 and B2")));
        }

        let indexed = self.index.iter_set().filter(|(_, m)| m.slot.is_some()).count();
        if indexed != self.len() {
            return Err(InvariantError::new(format!(
                "arc: {indexed} indexed residents, lists hold {}",
                self.len()
            )));
        }
        Ok(())
    }
}

impl Simulator for ArcSim {
    fn access(&mut self, addr: i64) -> Result<AccessOutcome, SimError> {
        let addr = check_address(addr)?;
        let now = self.stats.begin_access();

        let meta = *self.index.get(addr);
        if let Some((kind, id)) = meta.slot {
            let id = match kind {
                ListKind::T2 => {
                    self.t2.move_to_front(id);
                    id
                },
                ListKind::T1 => {
                    self.t1.remove(id);
                    self.t2.push_front(addr)
                },
            };
            let meta = self.index.get_mut(addr);
            meta.slot = Some((ListKind::T2, id));
            meta.last_ref = now;
            self.stats.note_occupancy(self.len(), self.capacity);
            return Ok(AccessOutcome::Hit);
        }

        self.stats.record_miss();
        let evicted = self.miss(addr, now)?;
        self.stats.note_occupancy(self.len(), self.capacity);
        Ok(AccessOutcome::Miss { evicted })
    }
}
