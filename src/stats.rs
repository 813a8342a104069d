//! Per-simulator counters and the derived hit-rate and eviction-age figures.
//!
//! Every simulator owns one [`StatsAccumulator`] and hands out [`SimStats`]
//! snapshots. The snapshot is plain data (`Serialize`) so callers can dump it
//! as JSON next to the trace that produced it.
//!
//! ## Warm-up
//!
//! ```text
//!   access:   1  2  3  4  5  6  7  8  9 ...
//!   resident: 1  2  3  3  4  ...                 capacity = 4
//!                            ▲
//!                            warmup_boundary = 5, warmup_misses = misses so far
//!
//!   hit_rate = 1 - (misses - warmup_misses) / (accesses - warmup_boundary)
//! ```
//!
//! Until the cache has filled and at least one access followed, the raw
//! `1 - misses / accesses` is reported. No accesses at all gives `0.0`.
use serde::{Deserialize, Serialize};

/// Snapshot of a simulator's counters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SimStats {
    /// References processed.
    pub access_count: u64,
    /// References that missed.
    pub miss_count: u64,
    /// Access index at which the resident count first reached capacity.
    pub warmup_boundary: Option<u64>,
    /// Miss count at `warmup_boundary`.
    pub warmup_misses: u64,
    /// Addresses evicted.
    pub eviction_count: u64,
    /// Sum of evictee ages (accesses since the evictee entered the cache).
    pub eviction_age_sum: u64,
    /// Sum of squared evictee ages.
    pub eviction_age_sum_sq: f64,
    /// Second chances granted (CLOCK/SIEVE) or ghost hits (ARC).
    pub recycle_count: u64,
    /// Candidates inspected by eviction scans.
    pub examined_count: u64,
    /// Sum of counter values observed on recycled candidates.
    pub recycled_counter_sum: u64,
}

impl SimStats {
    /// Steady-state hit rate in `[0, 1]`.
    ///
    /// ```
    /// use cachesim::stats::SimStats;
    ///
    /// let stats = SimStats {
    ///     access_count: 10,
    ///     miss_count: 6,
    ///     warmup_boundary: Some(4),
    ///     warmup_misses: 4,
    ///     ..SimStats::default()
    /// };
    /// // 2 misses in the 6 accesses after warm-up
    /// assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 1e-12);
    /// assert_eq!(SimStats::default().hit_rate(), 0.0);
    /// ```
    pub fn hit_rate(&self) -> f64 {
        if self.access_count == 0 {
            return 0.0;
        }
        let rate = match self.warmup_boundary {
            Some(boundary) if self.access_count > boundary => {
                let misses = self.miss_count.saturating_sub(self.warmup_misses);
                1.0 - misses as f64 / (self.access_count - boundary) as f64
            },
            _ => 1.0 - self.miss_count as f64 / self.access_count as f64,
        };
        rate.clamp(0.0, 1.0)
    }

    /// Mean entered-age of evicted addresses, `None` before the first eviction.
    pub fn mean_eviction_age(&self) -> Option<f64> {
        (self.eviction_count > 0).then(|| self.eviction_age_sum as f64 / self.eviction_count as f64)
    }

    /// Population variance of evictee ages, `None` before the first eviction.
    pub fn eviction_age_variance(&self) -> Option<f64> {
        let mean = self.mean_eviction_age()?;
        let n = self.eviction_count as f64;
        Some((self.eviction_age_sum_sq / n - mean * mean).max(0.0))
    }
}

/// Entry and last-reference times of a resident address.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Residency {
    pub(crate) entered: u64,
    pub(crate) last_ref: u64,
}

/// Mutable counters owned by a simulator.
#[derive(Debug, Clone, Default)]
pub(crate) struct StatsAccumulator {
    stats: SimStats,
}

impl StatsAccumulator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Counts a reference and returns its 1-based timestamp.
    #[inline]
    pub(crate) fn begin_access(&mut self) -> u64 {
        self.stats.access_count += 1;
        self.stats.access_count
    }

    #[inline]
    pub(crate) fn record_miss(&mut self) {
        self.stats.miss_count += 1;
    }

    /// Latches the warm-up boundary the first time `resident` reaches `capacity`.
    #[inline]
    pub(crate) fn note_occupancy(&mut self, resident: usize, capacity: usize) {
        if self.stats.warmup_boundary.is_none() && resident >= capacity {
            self.stats.warmup_boundary = Some(self.stats.access_count);
            self.stats.warmup_misses = self.stats.miss_count;
        }
    }

    #[inline]
    pub(crate) fn record_eviction(&mut self, enter_age: u64) {
        self.stats.eviction_count += 1;
        self.stats.eviction_age_sum += enter_age;
        let age = enter_age as f64;
        self.stats.eviction_age_sum_sq += age * age;
    }

    #[inline]
    pub(crate) fn record_examined(&mut self) {
        self.stats.examined_count += 1;
    }

    /// Counts a second chance given to a candidate whose counter was `counter`.
    #[inline]
    pub(crate) fn record_recycle(&mut self, counter: u32) {
        self.stats.recycle_count += 1;
        self.stats.recycled_counter_sum += u64::from(counter);
    }

    pub(crate) fn reset(&mut self) {
        self.stats = SimStats::default();
    }

    pub(crate) fn snapshot(&self) -> SimStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_uses_raw_counts_before_warmup() {
        let mut acc = StatsAccumulator::new();
        for _ in 0..4 {
            acc.begin_access();
        }
        acc.record_miss();
        acc.note_occupancy(1, 8);
        let stats = acc.snapshot();
        assert_eq!(stats.warmup_boundary, None);
        assert!((stats.hit_rate() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn hit_rate_raw_when_warmup_is_last_access() {
        let mut acc = StatsAccumulator::new();
        acc.begin_access();
        acc.record_miss();
        acc.note_occupancy(1, 1);
        let stats = acc.snapshot();
        assert_eq!(stats.warmup_boundary, Some(1));
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn warmup_latches_once() {
        let mut acc = StatsAccumulator::new();
        acc.begin_access();
        acc.record_miss();
        acc.note_occupancy(2, 2);
        acc.begin_access();
        acc.record_miss();
        acc.note_occupancy(2, 2);
        let stats = acc.snapshot();
        assert_eq!(stats.warmup_boundary, Some(1));
        assert_eq!(stats.warmup_misses, 1);
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn eviction_age_moments() {
        let mut acc = StatsAccumulator::new();
        assert_eq!(acc.snapshot().mean_eviction_age(), None);
        acc.record_eviction(2);
        acc.record_eviction(4);
        let stats = acc.snapshot();
        assert_eq!(stats.mean_eviction_age(), Some(3.0));
        assert_eq!(stats.eviction_age_variance(), Some(1.0));
    }

    #[test]
    fn recycle_and_examined_counters() {
        let mut acc = StatsAccumulator::new();
        acc.record_examined();
        acc.record_examined();
        acc.record_recycle(3);
        let stats = acc.snapshot();
        assert_eq!(stats.examined_count, 2);
        assert_eq!(stats.recycle_count, 1);
        assert_eq!(stats.recycled_counter_sum, 3);
        acc.reset();
        assert_eq!(acc.snapshot(), SimStats::default());
    }

    #[test]
    fn stats_serialize_as_flat_json() {
        let stats = SimStats {
            access_count: 3,
            miss_count: 2,
            ..SimStats::default()
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["access_count"], 3);
        assert_eq!(json["miss_count"], 2);
        assert!(json["warmup_boundary"].is_null());
    }
}
