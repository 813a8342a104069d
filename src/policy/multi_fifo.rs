//! Multi-list FIFO with tiered promotion.
//!
//! `K` FIFO lists of configured sizes. New addresses enter at the front of
//! list 0 and the tail of list 0 falls out of the cache. A hit in list `i`
//! promotes the address to the front of list `i + 1`; whatever falls off the
//! tail of list `i + 1` is demoted back into list `i`. A single list is plain
//! FIFO; a single list in [`PromotionMode::Lru`] is exact LRU.
//!
//! ## Architecture
//!
//! ```text
//!   sizes = [4, 2]                         SegmentedRing (one slot array)
//!
//!   list 0 (probation)  front ─► [ 9 | 5 | 3 | 8 ] ─► out of cache
//!                                      │ hit(5)
//!                                      ▼
//!   list 1 (protected)  front ─► [ 5 | 1 ] ─► 2 demoted into list 0
//! ```
//!
//! ## Promotion Modes
//!
//! ```text
//!   list 0 before hit(5):   [ 9 | 5 | 3 | 8 ]     list 1 drops 2
//!
//!   Lenient   2 takes 5's old slot           [ 9 | 2 | 3 | 8 ]
//!   Strict    items ahead of 5 shift back,   [ 2 | 9 | 3 | 8 ]
//!             2 enters at the front
//!   Lru       Strict, plus a hit in the last list moves to its front
//! ```
//!
//! Lenient does not refresh the demoted item's position: it inherits the
//! promoted item's age in list 0.
//!
//! ## Performance
//! - miss, lenient promotion: O(1)
//! - strict promotion: O(position in list)
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::ds::address_table::AddressTable;
use crate::ds::segmented_ring::SegmentedRing;
use crate::error::{InvariantError, SimError, check_address};
use crate::policy::SimOptions;
use crate::stats::{Residency, SimStats, StatsAccumulator};
use crate::traits::{AccessOutcome, Eviction, ReadOnlySimulator, Simulator};

/// How a hit moves items between lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionMode {
    /// The demoted item fills the promoted item's slot.
    #[default]
    Lenient,
    /// The demoted item enters at the front of the lower list.
    Strict,
    /// Strict, and hits in the last list move to its front.
    Lru,
}

/// Multi-list FIFO simulator.
#[derive(Debug, Clone)]
pub struct MultiFifoSim {
    ring: SegmentedRing,
    times: AddressTable<Residency>,
    mode: PromotionMode,
    stats: StatsAccumulator,
}

impl MultiFifoSim {
    /// Creates a simulator with one list per entry of `sizes`; capacity is
    /// their sum.
    pub fn new(sizes: &[usize], mode: PromotionMode) -> Result<Self, SimError> {
        Self::with_options(sizes, mode, SimOptions::default())
    }

    pub fn with_options(sizes: &[usize], mode: PromotionMode, options: SimOptions) -> Result<Self, SimError> {
        let ring = SegmentedRing::new(sizes, options.table)?;
        debug!(?sizes, ?mode, "multi-list fifo simulator created");
        Ok(Self {
            ring,
            times: AddressTable::with_mode(options.table),
            mode,
            stats: StatsAccumulator::new(),
        })
    }

    pub fn sizes(&self) -> &[usize] {
        self.ring.sizes()
    }

    pub fn mode(&self) -> PromotionMode {
        self.mode
    }

    /// List currently holding `addr`.
    pub fn list_of(&self, addr: u64) -> Option<usize> {
        self.ring.slot_of(addr).map(|slot| self.ring.list_of_slot(slot))
    }

    /// Occupants of one list, front to back.
    pub fn list_contents(&self, list: usize) -> Vec<u64> {
        self.ring.list_contents(list).collect()
    }

    fn promote(&mut self, list: usize, slot: usize, addr: u64) {
        let pos = self.ring.logical_pos(list, slot);
        let demoted = self.ring.push_front(list + 1, addr);
        match self.mode {
            PromotionMode::Lenient => {
                self.ring.replace(slot, demoted);
            },
            PromotionMode::Strict | PromotionMode::Lru => {
                self.ring.shift_back_into_front(list, pos, demoted);
            },
        }
    }
}

impl ReadOnlySimulator for MultiFifoSim {
    fn name(&self) -> &'static str {
        "multi_fifo"
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
        check_ring_and_times(&self.ring, &self.times, "multi fifo")
    }
}

impl Simulator for MultiFifoSim {
    fn access(&mut self, addr: i64) -> Result<AccessOutcome, SimError> {
        let addr = check_address(addr)?;
        let now = self.stats.begin_access();

        let Some(slot) = self.ring.slot_of(addr) else {
            self.stats.record_miss();
            let evicted = self
                .ring
                .push_front(0, addr)
                .map(|victim| retire(&mut self.times, &mut self.stats, victim, now, "multi fifo"));
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
        let last = self.ring.list_count() - 1;
        if list < last {
            self.promote(list, slot, addr);
        } else if self.mode == PromotionMode::Lru {
            let pos = self.ring.logical_pos(list, slot);
            if pos > 0 {
                self.ring.shift_back_into_front(list, pos, Some(addr));
            }
        }
        self.stats.note_occupancy(self.ring.len(), self.ring.total_slots());
        Ok(AccessOutcome::Hit)
    }
}

/// Drops `victim`'s timestamps and records its eviction.
pub(crate) fn retire(
    times: &mut AddressTable<Residency>,
    stats: &mut StatsAccumulator,
    victim: u64,
    now: u64,
    policy: &'static str,
) -> Eviction {
    let residency = *times.get(victim);
    times.reset(victim);
    let eviction = Eviction::new(victim, now, residency.entered, residency.last_ref);
    stats.record_eviction(eviction.enter_age);
    trace!(policy, victim, enter_age = eviction.enter_age, "evict");
    eviction
}

pub(crate) fn check_ring_and_times(
    ring: &SegmentedRing,
    times: &AddressTable<Residency>,
    policy: &str,
) -> Result<(), InvariantError> {
    ring.check_invariants()?;
    if ring.len() > ring.total_slots() {
        return Err(InvariantError::new(format!(
            "{policy}: {} residents exceed {} slots",
            ring.len(),
            ring.total_slots()
        )));
    }
    for addr in ring.contents() {
        if *times.get(addr) == Residency::default() {
            return Err(InvariantError::new(format!("{policy}: resident {addr} has no timestamps")));
        }
    }
    let timed = times.iter_set().count();
    if timed != ring.len() {
        return Err(InvariantError::new(format!(
            "{policy}: {timed} timestamped addresses, {} residents",
            ring.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::lru::LruSim;

    fn sim(sizes: &[usize], mode: PromotionMode) -> MultiFifoSim {
        MultiFifoSim::new(sizes, mode).unwrap()
    }

    mod construction {
        use super::*;

        #[test]
        fn test_rejects_bad_sizes() {
            assert!(matches!(
                MultiFifoSim::new(&[], PromotionMode::Lenient),
                Err(SimError::InvalidConfiguration(_))
            ));
            assert!(MultiFifoSim::new(&[3, 0], PromotionMode::Strict).is_err());
        }

        #[test]
        fn test_capacity_is_sum_of_sizes() {
            let m = sim(&[3, 2, 1], PromotionMode::Lenient);
            assert_eq!(m.capacity(), 6);
            assert_eq!(m.sizes(), &[3, 2, 1]);
        }
    }

    mod promotion {
        use super::*;

        #[test]
        fn test_lenient_promotion_leaves_hole() {
            let mut m = sim(&[2, 2], PromotionMode::Lenient);
            m.batch(&[1, 2, 1]).unwrap();
            assert_eq!(m.list_of(1), Some(1));
            assert_eq!(m.list_contents(0), vec![2]);
            assert_eq!(m.contents(), vec![2, 1]);
            m.check_invariants().unwrap();
        }

        #[test]
        fn test_lenient_demoted_fills_vacated_slot() {
            let mut m = sim(&[3, 1], PromotionMode::Lenient);
            m.batch(&[1, 2, 3, 2, 1]).unwrap();
            // 2 promoted then demoted into 1's slot at the back of list 0
            assert_eq!(m.list_contents(0), vec![3, 2]);
            assert_eq!(m.list_contents(1), vec![1]);
            m.check_invariants().unwrap();
        }

        #[test]
        fn test_strict_demoted_enters_front() {
            let mut m = sim(&[3, 1], PromotionMode::Strict);
            m.batch(&[1, 2, 3, 2]).unwrap();
            assert_eq!(m.list_contents(0), vec![3, 1]);
            m.access(1).unwrap();
            assert_eq!(m.list_contents(0), vec![2, 3]);
            assert_eq!(m.list_contents(1), vec![1]);
            m.check_invariants().unwrap();
        }

        #[test]
        fn test_last_list_hit_is_static_unless_lru() {
            let mut m = sim(&[1, 2], PromotionMode::Strict);
            m.batch(&[1, 1, 2, 2]).unwrap();
            assert_eq!(m.list_contents(1), vec![2, 1]);
            m.access(1).unwrap();
            assert_eq!(m.list_contents(1), vec![2, 1]);

            let mut m = sim(&[1, 2], PromotionMode::Lru);
            m.batch(&[1, 1, 2, 2, 1]).unwrap();
            assert_eq!(m.list_contents(1), vec![1, 2]);
        }
    }

    mod eviction {
        use super::*;

        #[test]
        fn test_tail_of_first_list_leaves() {
            let mut m = sim(&[2, 1], PromotionMode::Lenient);
            m.batch(&[1, 2]).unwrap();
            let ev = m.access(3).unwrap().evicted().unwrap();
            assert_eq!(ev.addr, 1);
            assert_eq!(ev.enter_age, 2);
            assert!(!m.contains(1));
        }

        #[test]
        fn test_single_list_is_fifo() {
            let mut m = sim(&[1], PromotionMode::Lenient);
            let outcomes = m.batch_outcomes(&[1, 2, 1, 2, 1, 2]).unwrap();
            assert!(outcomes.iter().all(AccessOutcome::is_miss));
            assert_eq!(m.hit_rate(), 0.0);
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn modes() -> impl Strategy<Value = PromotionMode> {
            prop_oneof![
                Just(PromotionMode::Lenient),
                Just(PromotionMode::Strict),
                Just(PromotionMode::Lru),
            ]
        }

        proptest! {
            #[cfg_attr(miri, ignore)]
            #[test]
            fn prop_invariants_hold(
                sizes in prop::collection::vec(1usize..5, 1..4),
                mode in modes(),
                trace in prop::collection::vec(0i64..24, 0..200)
            ) {
                let mut m = MultiFifoSim::new(&sizes, mode).unwrap();
                let capacity: usize = sizes.iter().sum();
                for &a in &trace {
                    m.access(a).unwrap();
                    prop_assert!(m.len() <= capacity);
                    prop_assert!(m.contains(a as u64));
                    prop_assert!(m.check_invariants().is_ok());
                }
            }

            /// One list in LRU mode evicts exactly like LRU.
            #[cfg_attr(miri, ignore)]
            #[test]
            fn prop_single_lru_list_matches_lru(
                capacity in 1usize..8,
                trace in prop::collection::vec(0i64..16, 0..200)
            ) {
                let mut m = MultiFifoSim::new(&[capacity], PromotionMode::Lru).unwrap();
                let mut lru = LruSim::new(capacity).unwrap();
                for &a in &trace {
                    prop_assert_eq!(m.access(a).unwrap(), lru.access(a).unwrap());
                }
                prop_assert_eq!(m.contents(), lru.contents());
            }
        }
    }
}
