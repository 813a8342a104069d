//! cachesim: trace-driven simulators for cache replacement policies.
//!
//! Each simulator is fed addresses one at a time and classifies every
//! reference as a hit or a miss, keeping the counters needed for hit rate and
//! eviction-age analysis. See `DESIGN.md` for the architecture and the
//! choices made where algorithm descriptions disagree.
//!
//! ```
//! use cachesim::prelude::*;
//!
//! let trace = [1, 2, 3, 1, 2, 4, 1, 2];
//! let mut arc = ArcSim::new(3).unwrap();
//! arc.batch(&trace).unwrap();
//!
//! let mut min = BeladyMin::new(3).unwrap();
//! min.replay(&trace).unwrap();
//! assert!(min.hit_rate() >= arc.hit_rate());
//! ```

pub mod builder;
pub mod ds;
pub mod error;
pub mod policy;
pub mod prelude;
pub mod stats;
pub mod traits;

pub use crate::builder::{AnySimulator, PolicyConfig, SimulatorBuilder};
pub use crate::error::{InvariantError, SimError};
pub use crate::stats::SimStats;
