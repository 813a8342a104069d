pub use crate::builder::{AnySimulator, PolicyConfig, SimulatorBuilder};
pub use crate::ds::TableMode;
pub use crate::error::{InvariantError, SimError};
pub use crate::policy::{
    ArcSim, BeladyMin, ClockScan, ClockSim, FifoSim, LfuSim, LruSim, MultiFifoSim, PromotionMode,
    RandomMultiSim, RandomSieveSim, SieveSim, SimOptions,
};
pub use crate::stats::SimStats;
pub use crate::traits::{AccessOutcome, Eviction, ReadOnlySimulator, Simulator};
