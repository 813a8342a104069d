//! # Simulator Trait Hierarchy
//!
//! Every replacement policy in this crate is a stateful simulator that is fed
//! one address at a time and answers "hit or miss". The traits split what a
//! caller may observe from what advances the simulation.
//!
//! ## Architecture
//!
//! ```text
//!        ┌───────────────────────────────────────────────┐
//!        │             ReadOnlySimulator                 │
//!        │                                               │
//!        │  name() → &'static str                        │
//!        │  capacity() / len() / is_empty()              │
//!        │  contains(u64) → bool                         │
//!        │  contents() → Vec<u64>                        │
//!        │  stats() → SimStats     hit_rate() → f64      │
//!        │  check_invariants() → Result<(), Invariant…>  │
//!        └──────────────────────┬────────────────────────┘
//!                               │
//!              ┌────────────────┴─────────────────┐
//!              ▼                                  ▼
//!   ┌──────────────────────────────┐   ┌──────────────────────────────┐
//!   │          Simulator           │   │   BeladyMin (offline only)   │
//!   │                              │   │                              │
//!   │  access(i64) → AccessOutcome │   │  replay(&[i64])              │
//!   │  batch(&[i64])               │   │                              │
//!   │  batch_outcomes(&[i64])      │   │                              │
//!   └──────────────────────────────┘   └──────────────────────────────┘
//! ```
//!
//! Belady-MIN needs the whole trace up front, so it only implements the
//! read-only half.
//!
//! ## Error Contract
//!
//! ```text
//!   access(-4)        → Err(InvalidAddress { addr: -4, position: None })
//!                       no counters or residents change
//!
//!   batch([1, 2, -4, 5])
//!                     → accesses 1 and 2 are applied
//!                     → Err(InvalidAddress { addr: -4, position: Some(2) })
//!                     → 5 is not applied; resume with batch(&trace[3..])
//! ```
//!
//! ## Example Usage
//!
//! ```
//! use cachesim::policy::fifo::FifoSim;
//! use cachesim::traits::{AccessOutcome, ReadOnlySimulator, Simulator};
//!
//! fn replay<S: Simulator>(sim: &mut S, trace: &[i64]) -> f64 {
//!     sim.batch(trace).unwrap();
//!     sim.hit_rate()
//! }
//!
//! let mut sim = FifoSim::new(2).unwrap();
//! assert_eq!(sim.access(1).unwrap(), AccessOutcome::Miss { evicted: None });
//! assert!(sim.access(1).unwrap().is_hit());
//! replay(&mut sim, &[2, 3, 1]);
//! assert_eq!(sim.contents(), vec![1, 3]);
//! ```

use serde::Serialize;

use crate::error::{InvariantError, SimError};
use crate::stats::SimStats;

/// An address that left the cache, with its age measured in accesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Eviction {
    /// The evicted address.
    pub addr: u64,
    /// Accesses since the address entered the cache.
    pub enter_age: u64,
    /// Accesses since the address was last referenced.
    pub ref_age: u64,
}

impl Eviction {
    pub(crate) fn new(addr: u64, now: u64, entered: u64, last_ref: u64) -> Self {
        Self {
            addr,
            enter_age: now.saturating_sub(entered),
            ref_age: now.saturating_sub(last_ref),
        }
    }
}

/// Result of one reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AccessOutcome {
    Hit,
    /// `evicted` is `None` while the cache is still filling.
    Miss { evicted: Option<Eviction> },
}

impl AccessOutcome {
    #[inline]
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit)
    }

    #[inline]
    pub fn is_miss(&self) -> bool {
        !self.is_hit()
    }

    /// The evicted address, if this reference pushed one out.
    #[inline]
    pub fn evicted(&self) -> Option<Eviction> {
        match self {
            Self::Hit => None,
            Self::Miss { evicted } => *evicted,
        }
    }
}

/// Observation side of a simulator.
pub trait ReadOnlySimulator {
    /// Short policy name, e.g. `"arc"` or `"clock"`.
    fn name(&self) -> &'static str;

    /// Maximum number of resident addresses.
    fn capacity(&self) -> usize;

    /// Current number of resident addresses.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `addr` is resident.
    fn contains(&self, addr: u64) -> bool;

    /// Resident addresses in the policy's documented order.
    fn contents(&self) -> Vec<u64>;

    fn stats(&self) -> SimStats;

    /// Shorthand for `stats().hit_rate()`.
    fn hit_rate(&self) -> f64 {
        self.stats().hit_rate()
    }

    /// Verifies the residency index and storage agree in both directions and
    /// the capacity bound holds.
    fn check_invariants(&self) -> Result<(), InvariantError>;
}

/// A simulator that accepts references one at a time.
pub trait Simulator: ReadOnlySimulator {
    /// Processes one reference.
    ///
    /// Fails with [`SimError::InvalidAddress`] for negative input, before any
    /// state changes.
    fn access(&mut self, addr: i64) -> Result<AccessOutcome, SimError>;

    /// Processes `trace` in order.
    ///
    /// On an invalid address, every earlier reference has been applied and
    /// the error carries the offending index.
    fn batch(&mut self, trace: &[i64]) -> Result<(), SimError> {
        for (position, &addr) in trace.iter().enumerate() {
            self.access(addr).map_err(|e| e.at_position(position))?;
        }
        Ok(())
    }

    /// Like [`batch`](Self::batch), collecting each outcome.
    fn batch_outcomes(&mut self, trace: &[i64]) -> Result<Vec<AccessOutcome>, SimError> {
        let mut outcomes = Vec::with_capacity(trace.len());
        for (position, &addr) in trace.iter().enumerate() {
            outcomes.push(self.access(addr).map_err(|e| e.at_position(position))?);
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eviction_ages_from_timestamps() {
        let ev = Eviction::new(7, 10, 3, 8);
        assert_eq!(ev.enter_age, 7);
        assert_eq!(ev.ref_age, 2);
    }

    #[test]
    fn outcome_helpers() {
        let ev = Eviction::new(1, 5, 1, 1);
        let miss = AccessOutcome::Miss { evicted: Some(ev) };
        assert!(miss.is_miss());
        assert_eq!(miss.evicted(), Some(ev));
        assert!(AccessOutcome::Hit.is_hit());
        assert_eq!(AccessOutcome::Hit.evicted(), None);
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let json = serde_json::to_value(AccessOutcome::Miss { evicted: None }).unwrap();
        assert_eq!(json["outcome"], "miss");
        assert!(json["evicted"].is_null());
    }
}
