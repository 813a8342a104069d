//! Trace replay benchmarks: accesses per second for every policy.
//!
//! Run with: `cargo bench --bench replay`
//!
//! Each policy replays the same pre-generated traces so differences come from
//! the policy alone. Hit rates are printed once per workload before timing.

use std::hint::black_box;

use cachesim::prelude::*;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const CAPACITY: usize = 1024;
const UNIVERSE: u64 = 8192;
const OPS: usize = 100_000;
const SEED: u64 = 42;

// ============================================================================
// Trace generation
// ============================================================================

/// Zipf-distributed addresses via inverse CDF over precomputed weights.
fn zipf_trace(exponent: f64) -> Vec<i64> {
    let mut cdf = Vec::with_capacity(UNIVERSE as usize);
    let mut total = 0.0;
    for rank in 1..=UNIVERSE {
        total += 1.0 / (rank as f64).powf(exponent);
        cdf.push(total);
    }
    let mut rng = SmallRng::seed_from_u64(SEED);
    (0..OPS)
        .map(|_| {
            let u = rng.random::<f64>() * total;
            cdf.partition_point(|&c| c < u) as i64
        })
        .collect()
}

/// Hot loop that fits, interrupted by long one-shot scans.
fn scan_trace() -> Vec<i64> {
    let hot = (CAPACITY / 2) as i64;
    let mut trace = Vec::with_capacity(OPS);
    let mut cold = hot;
    while trace.len() < OPS {
        for _ in 0..4 {
            trace.extend(0..hot);
        }
        trace.extend(cold..cold + 2 * CAPACITY as i64);
        cold += 2 * CAPACITY as i64;
    }
    trace.truncate(OPS);
    trace
}

fn uniform_trace() -> Vec<i64> {
    let mut rng = SmallRng::seed_from_u64(SEED);
    (0..OPS).map(|_| rng.random_range(0..UNIVERSE) as i64).collect()
}

fn workloads() -> Vec<(&'static str, Vec<i64>)> {
    vec![
        ("uniform", uniform_trace()),
        ("zipf_0.8", zipf_trace(0.8)),
        ("zipf_1.2", zipf_trace(1.2)),
        ("scan", scan_trace()),
    ]
}

fn policies() -> Vec<PolicyConfig> {
    vec![
        PolicyConfig::Lru,
        PolicyConfig::Lfu,
        PolicyConfig::Fifo,
        PolicyConfig::MultiFifo {
            sizes: vec![CAPACITY / 4, CAPACITY * 3 / 4],
            mode: PromotionMode::Lenient,
        },
        PolicyConfig::RandomMultiFifo {
            sizes: vec![CAPACITY / 2, CAPACITY / 2],
        },
        PolicyConfig::Clock {
            max_counter: 1,
            scan: ClockScan::Sequential,
        },
        PolicyConfig::Clock {
            max_counter: 3,
            scan: ClockScan::RandomShuffle,
        },
        PolicyConfig::Sieve { max_counter: 1 },
        PolicyConfig::RandomSieve { max_counter: 1 },
        PolicyConfig::Arc,
    ]
}

fn label(policy: &PolicyConfig) -> String {
    match policy {
        PolicyConfig::Clock { max_counter, scan } => format!("clock_{scan:?}_k{max_counter}"),
        PolicyConfig::MultiFifo { mode, .. } => format!("multi_fifo_{mode:?}"),
        other => SimulatorBuilder::new(CAPACITY)
            .seed(SEED)
            .build(other)
            .map(|sim| sim.name().to_string())
            .unwrap_or_else(|_| format!("{other:?}")),
    }
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_replay(c: &mut Criterion) {
    let builder = SimulatorBuilder::new(CAPACITY).seed(SEED);

    for (workload, trace) in workloads() {
        let mut min = BeladyMin::new(CAPACITY).unwrap();
        min.replay(&trace).unwrap();
        println!("{workload:>10}  {:<28} hit_rate={:.4}", "belady_min", min.hit_rate());
        for policy in policies() {
            let mut sim = builder.build(&policy).unwrap();
            sim.batch(&trace).unwrap();
            println!("{workload:>10}  {:<28} hit_rate={:.4}", label(&policy), sim.hit_rate());
        }

        let mut group = c.benchmark_group(format!("replay/{workload}"));
        group.throughput(Throughput::Elements(trace.len() as u64));
        group.sample_size(20);

        for policy in policies() {
            group.bench_with_input(BenchmarkId::from_parameter(label(&policy)), &trace, |b, trace| {
                b.iter(|| {
                    let mut sim = builder.build(&policy).unwrap();
                    sim.batch(black_box(trace)).unwrap();
                    black_box(sim.stats())
                })
            });
        }

        group.bench_with_input(BenchmarkId::from_parameter("belady_min"), &trace, |b, trace| {
            b.iter(|| {
                let mut min = BeladyMin::new(CAPACITY).unwrap();
                min.replay(black_box(trace)).unwrap();
                black_box(min.stats())
            })
        });

        group.finish();
    }
}

criterion_group!(benches, bench_replay);
criterion_main!(benches);
