//! Unified simulator builder for all online policies.
//!
//! [`PolicyConfig`] names a policy and its parameters and is serde-friendly,
//! so experiment definitions can live in JSON next to their traces.
//! [`SimulatorBuilder`] carries the shared knobs (capacity, seed, address
//! table backing) and produces an [`AnySimulator`], which dispatches to the
//! concrete simulator.
//!
//! Belady-MIN is offline and needs the whole trace, so it is built directly
//! with [`BeladyMin::new`](crate::policy::BeladyMin::new) rather than here.
//!
//! ## Example
//!
//! ```rust
//! use cachesim::builder::{PolicyConfig, SimulatorBuilder};
//! use cachesim::traits::{ReadOnlySimulator, Simulator};
//!
//! let config: PolicyConfig =
//!     serde_json::from_str(r#"{ "policy": "clock", "max_counter": 3 }"#).unwrap();
//! let mut sim = SimulatorBuilder::new(64).seed(7).build(&config).unwrap();
//! sim.batch(&[1, 2, 1, 3]).unwrap();
//! assert_eq!(sim.name(), "clock");
//! assert_eq!(sim.stats().miss_count, 3);
//! ```

use serde::{Deserialize, Serialize};

use crate::ds::TableMode;
use crate::error::{InvariantError, SimError};
use crate::policy::{
    ArcSim, ClockScan, ClockSim, FifoSim, LfuSim, LruSim, MultiFifoSim, PromotionMode,
    RandomMultiSim, RandomSieveSim, SieveSim, SimOptions,
};
use crate::stats::SimStats;
use crate::traits::{AccessOutcome, ReadOnlySimulator, Simulator};

fn default_max_counter() -> u32 {
    1
}

/// Available online replacement policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum PolicyConfig {
    /// Least Recently Used.
    Lru,
    /// Least Frequently Used.
    Lfu,
    /// First In, First Out.
    Fifo,
    /// Multi-list FIFO; capacity is the sum of `sizes`.
    MultiFifo {
        sizes: Vec<usize>,
        #[serde(default)]
        mode: PromotionMode,
    },
    /// Randomized multi-list FIFO; capacity is the sum of `sizes`.
    RandomMultiFifo { sizes: Vec<usize> },
    /// CLOCK with a `max_counter`-bounded aging counter.
    Clock {
        #[serde(default = "default_max_counter")]
        max_counter: u32,
        #[serde(default)]
        scan: ClockScan,
    },
    /// SIEVE with a `max_counter`-bounded counter.
    Sieve {
        #[serde(default = "default_max_counter")]
        max_counter: u32,
    },
    /// SIEVE with uniformly sampled eviction candidates.
    RandomSieve {
        #[serde(default = "default_max_counter")]
        max_counter: u32,
    },
    /// Adaptive Replacement Cache.
    Arc,
}

/// Any online simulator, behind one type.
#[derive(Debug, Clone)]
pub enum AnySimulator {
    Lru(LruSim),
    Lfu(LfuSim),
    Fifo(FifoSim),
    MultiFifo(MultiFifoSim),
    RandomMultiFifo(RandomMultiSim),
    Clock(ClockSim),
    Sieve(SieveSim),
    RandomSieve(RandomSieveSim),
    Arc(ArcSim),
}

impl AnySimulator {
    fn inner(&self) -> &dyn Simulator {
        match self {
            AnySimulator::Lru(sim) => sim,
            AnySimulator::Lfu(sim) => sim,
            AnySimulator::Fifo(sim) => sim,
            AnySimulator::MultiFifo(sim) => sim,
            AnySimulator::RandomMultiFifo(sim) => sim,
            AnySimulator::Clock(sim) => sim,
            AnySimulator::Sieve(sim) => sim,
            AnySimulator::RandomSieve(sim) => sim,
            AnySimulator::Arc(sim) => sim,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Simulator {
        match self {
            AnySimulator::Lru(sim) => sim,
            AnySimulator::Lfu(sim) => sim,
            AnySimulator::Fifo(sim) => sim,
            AnySimulator::MultiFifo(sim) => sim,
            AnySimulator::RandomMultiFifo(sim) => sim,
            AnySimulator::Clock(sim) => sim,
            AnySimulator::Sieve(sim) => sim,
            AnySimulator::RandomSieve(sim) => sim,
            AnySimulator::Arc(sim) => sim,
        }
    }
}

impl ReadOnlySimulator for AnySimulator {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn capacity(&self) -> usize {
        self.inner().capacity()
    }

    fn len(&self) -> usize {
        self.inner().len()
    }

    fn contains(&self, addr: u64) -> bool {
        self.inner().contains(addr)
    }

    fn contents(&self) -> Vec<u64> {
        self.inner().contents()
    }

    fn stats(&self) -> SimStats {
        self.inner().stats()
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        self.inner().check_invariants()
    }
}

impl Simulator for AnySimulator {
    fn access(&mut self, addr: i64) -> Result<AccessOutcome, SimError> {
        self.inner_mut().access(addr)
    }
}

/// Builder for [`AnySimulator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorBuilder {
    /// Resident addresses; ignored by multi-list policies.
    pub capacity: usize,
    /// Seed for randomized policies; `None` draws from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Address-table backing.
    #[serde(default)]
    pub table: TableMode,
}

impl SimulatorBuilder {
    /// Create a new builder with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            seed: None,
            table: TableMode::Auto,
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn table(mut self, table: TableMode) -> Self {
        self.table = table;
        self
    }

    pub fn options(&self) -> SimOptions {
        SimOptions {
            table: self.table,
            seed: self.seed,
        }
    }

    /// Builds the simulator named by `policy`.
    ///
    /// Fails with [`SimError::InvalidConfiguration`] for a zero capacity, or
    /// for an empty or zero-containing size vector on multi-list policies.
    pub fn build(&self, policy: &PolicyConfig) -> Result<AnySimulator, SimError> {
        let cap = self.capacity;
        let opts = self.options();
        let sim = match policy {
            PolicyConfig::Lru => AnySimulator::Lru(LruSim::with_options(cap, opts)?),
            PolicyConfig::Lfu => AnySimulator::Lfu(LfuSim::with_options(cap, opts)?),
            PolicyConfig::Fifo => AnySimulator::Fifo(FifoSim::with_options(cap, opts)?),
            PolicyConfig::MultiFifo { sizes, mode } => {
                AnySimulator::MultiFifo(MultiFifoSim::with_options(sizes, *mode, opts)?)
            },
            PolicyConfig::RandomMultiFifo { sizes } => {
                AnySimulator::RandomMultiFifo(RandomMultiSim::with_options(sizes, opts)?)
            },
            PolicyConfig::Clock { max_counter, scan } => {
                AnySimulator::Clock(ClockSim::with_options(cap, *max_counter, *scan, opts)?)
            },
            PolicyConfig::Sieve { max_counter } => {
                AnySimulator::Sieve(SieveSim::with_options(cap, *max_counter, opts)?)
            },
            PolicyConfig::RandomSieve { max_counter } => {
                AnySimulator::RandomSieve(RandomSieveSim::with_options(cap, *max_counter, opts)?)
            },
            PolicyConfig::Arc => AnySimulator::Arc(ArcSim::with_options(cap, opts)?),
        };
        Ok(sim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_policies() -> Vec<PolicyConfig> {
        vec![
            PolicyConfig::Lru,
            PolicyConfig::Lfu,
            PolicyConfig::Fifo,
            PolicyConfig::MultiFifo {
                sizes: vec![6, 4],
                mode: PromotionMode::Strict,
            },
            PolicyConfig::RandomMultiFifo { sizes: vec![5, 5] },
            PolicyConfig::Clock {
                max_counter: 2,
                scan: ClockScan::Sequential,
            },
            PolicyConfig::Clock {
                max_counter: 1,
                scan: ClockScan::RandomShuffle,
            },
            PolicyConfig::Sieve { max_counter: 1 },
            PolicyConfig::RandomSieve { max_counter: 1 },
            PolicyConfig::Arc,
        ]
    }

    #[test]
    fn test_all_policies_basic_ops() {
        let builder = SimulatorBuilder::new(10).seed(3);
        for policy in all_policies() {
            let mut sim = builder.build(&policy).unwrap();
            assert!(sim.access(1).unwrap().is_miss(), "{policy:?}");
            assert!(sim.access(1).unwrap().is_hit(), "{policy:?}");
            assert!(sim.contains(1));
            assert_eq!(sim.capacity(), 10, "{policy:?}");
            sim.check_invariants().unwrap();
        }
    }

    #[test]
    fn test_capacity_enforcement() {
        let builder = SimulatorBuilder::new(10).seed(5);
        let trace: Vec<i64> = (0..100).collect();
        for policy in all_policies() {
            let mut sim = builder.build(&policy).unwrap();
            sim.batch(&trace).unwrap();
            assert!(sim.len() <= sim.capacity(), "{}", sim.name());
            sim.check_invariants().unwrap();
        }
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let builder = SimulatorBuilder::new(0);
        for policy in [PolicyConfig::Lru, PolicyConfig::Arc, PolicyConfig::Sieve { max_counter: 1 }] {
            assert!(matches!(builder.build(&policy), Err(SimError::InvalidConfiguration(_))));
        }
    }

    #[test]
    fn test_rejects_bad_sizes() {
        let builder = SimulatorBuilder::new(4);
        let empty = PolicyConfig::MultiFifo {
            sizes: vec![],
            mode: PromotionMode::Lenient,
        };
        let zero = PolicyConfig::RandomMultiFifo { sizes: vec![2, 0] };
        assert!(builder.build(&empty).is_err());
        assert!(builder.build(&zero).is_err());
    }

    #[test]
    fn test_policy_config_json_defaults() {
        let config: PolicyConfig = serde_json::from_str(r#"{"policy": "sieve"}"#).unwrap();
        assert_eq!(config, PolicyConfig::Sieve { max_counter: 1 });

        let config: PolicyConfig =
            serde_json::from_str(r#"{"policy": "multi_fifo", "sizes": [3, 1], "mode": "lru"}"#).unwrap();
        assert_eq!(
            config,
            PolicyConfig::MultiFifo {
                sizes: vec![3, 1],
                mode: PromotionMode::Lru
            }
        );

        let json = serde_json::to_value(PolicyConfig::Clock {
            max_counter: 2,
            scan: ClockScan::RandomWithReplacement,
        })
        .unwrap();
        assert_eq!(json["policy"], "clock");
        assert_eq!(json["scan"], "random_with_replacement");
    }

    #[test]
    fn test_builder_json() {
        let builder: SimulatorBuilder = serde_json::from_str(r#"{"capacity": 8, "seed": 11}"#).unwrap();
        assert_eq!(builder, SimulatorBuilder::new(8).seed(11));
        assert_eq!(builder.options().table, TableMode::Auto);
    }
}
