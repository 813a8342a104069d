// ==============================================
// CROSS-POLICY INVARIANT TESTS (integration)
// ==============================================
//
// Behaviour every simulator must share, plus the reference scenarios that
// pin down individual policies. These span multiple modules and belong here
// rather than in any single source file.

use cachesim::prelude::*;
use proptest::prelude::*;

fn online_policies() -> Vec<PolicyConfig> {
    vec![
        PolicyConfig::Lru,
        PolicyConfig::Lfu,
        PolicyConfig::Fifo,
        PolicyConfig::Clock {
            max_counter: 1,
            scan: ClockScan::Sequential,
        },
        PolicyConfig::Clock {
            max_counter: 3,
            scan: ClockScan::RandomWithReplacement,
        },
        PolicyConfig::Clock {
            max_counter: 2,
            scan: ClockScan::RandomShuffle,
        },
        PolicyConfig::Sieve { max_counter: 1 },
        PolicyConfig::RandomSieve { max_counter: 2 },
        PolicyConfig::Arc,
    ]
}

fn multi_list_policies(capacity: usize) -> Vec<PolicyConfig> {
    let upper = capacity / 2;
    let sizes = if upper == 0 {
        vec![capacity]
    } else {
        vec![capacity - upper, upper]
    };
    vec![
        PolicyConfig::MultiFifo {
            sizes: sizes.clone(),
            mode: PromotionMode::Lenient,
        },
        PolicyConfig::MultiFifo {
            sizes: sizes.clone(),
            mode: PromotionMode::Strict,
        },
        PolicyConfig::MultiFifo {
            sizes: sizes.clone(),
            mode: PromotionMode::Lru,
        },
        PolicyConfig::RandomMultiFifo { sizes },
    ]
}

fn all_policies(capacity: usize) -> Vec<PolicyConfig> {
    let mut policies = online_policies();
    policies.extend(multi_list_policies(capacity));
    policies
}

fn build(capacity: usize, seed: u64, policy: &PolicyConfig) -> AnySimulator {
    SimulatorBuilder::new(capacity)
        .seed(seed)
        .table(TableMode::Sparse)
        .build(policy)
        .unwrap()
}

fn sorted(mut v: Vec<u64>) -> Vec<u64> {
    v.sort_unstable();
    v
}

// ==============================================
// Reference Scenarios
// ==============================================

mod scenarios {
    use super::*;

    #[test]
    fn fifo_capacity_one_alternating() {
        let mut fifo = FifoSim::new(1).unwrap();
        let outcomes = fifo.batch_outcomes(&[1, 2, 1, 2, 1, 2]).unwrap();
        assert!(outcomes.iter().all(AccessOutcome::is_miss));
        assert_eq!(fifo.hit_rate(), 0.0);
    }

    #[test]
    fn lru_capacity_two_reuse_after_eviction() {
        let mut lru = LruSim::new(2).unwrap();
        let outcomes = lru.batch_outcomes(&[1, 2, 3]).unwrap();
        assert!(outcomes.iter().all(AccessOutcome::is_miss));
        assert_eq!(sorted(lru.contents()), vec![2, 3]);

        let fourth = lru.access(1).unwrap();
        assert!(fourth.is_miss());
        assert_eq!(fourth.evicted().map(|e| e.addr), Some(2));
        assert_eq!(sorted(lru.contents()), vec![1, 3]);
    }

    #[test]
    fn sieve_keeps_position_clock_relocates() {
        // 1 is hit once while resident, then never referenced again
        let trace = [1, 2, 3, 1, 4];

        let mut sieve = SieveSim::new(3, 1).unwrap();
        sieve.batch(&trace).unwrap();
        assert_eq!(sieve.contents(), vec![4, 3, 1]);

        let mut clock = ClockSim::new(3, 1, ClockScan::Sequential).unwrap();
        clock.batch(&trace).unwrap();
        assert_eq!(clock.contents(), vec![4, 1, 3]);

        // both spared 1 and evicted 2
        assert!(sieve.contains(1) && clock.contains(1));
        assert!(!sieve.contains(2) && !clock.contains(2));
    }

    #[test]
    fn arc_ghost_hits_move_p_by_at_least_one() {
        let mut arc = ArcSim::new(2).unwrap();
        arc.batch(&[1, 1, 2, 3]).unwrap();
        assert!(arc.b1_len() > 0 && arc.in_b1(2));

        let before = arc.p();
        arc.access(2).unwrap();
        assert!(arc.p() > before);

        arc.access(3).unwrap();
        assert!(arc.in_b2(1));
        let before = arc.p();
        arc.access(1).unwrap();
        assert!(arc.p() < before);
    }
}

// ==============================================
// Error Contract
// ==============================================

mod errors {
    use super::*;

    #[test]
    fn batch_applies_prefix_and_reports_position() {
        for policy in all_policies(4) {
            let mut sim = build(4, 1, &policy);
            let err = sim.batch(&[1, 2, -4, 5]).unwrap_err();
            assert_eq!(
                err,
                SimError::InvalidAddress {
                    addr: -4,
                    position: Some(2)
                },
                "{policy:?}"
            );
            assert_eq!(sim.stats().access_count, 2, "{policy:?}");
            assert!(sim.contains(2), "{policy:?}");
            assert!(!sim.contains(5), "{policy:?}");

            // resumable from the element after the bad one
            sim.batch(&[5]).unwrap();
            assert_eq!(sim.stats().access_count, 3);
        }
    }

    #[test]
    fn single_access_rejects_negative_without_mutation() {
        for policy in all_policies(3) {
            let mut sim = build(3, 1, &policy);
            sim.access(7).unwrap();
            let before = (sim.stats(), sim.contents());
            assert!(matches!(
                sim.access(-1),
                Err(SimError::InvalidAddress { position: None, .. })
            ));
            assert_eq!((sim.stats(), sim.contents()), before, "{policy:?}");
        }
    }

    #[test]
    fn dense_table_accepts_largest_address() {
        let far = i64::MAX;
        for policy in all_policies(4) {
            let mut sim = SimulatorBuilder::new(4)
                .seed(1)
                .table(TableMode::Dense)
                .build(&policy)
                .unwrap();
            sim.batch(&[1, far]).unwrap();
            assert!(sim.access(far).unwrap().is_hit(), "{policy:?}");
            assert!(sim.contains(far as u64), "{policy:?}");
            sim.check_invariants().unwrap();
        }

        let options = SimOptions {
            table: TableMode::Dense,
            seed: None,
        };
        let mut min = BeladyMin::with_options(2, options).unwrap();
        min.replay(&[far, 1, far]).unwrap();
        assert_eq!(min.stats().miss_count, 2);
    }

    #[test]
    fn zero_capacity_rejected_except_min() {
        for policy in online_policies() {
            assert!(SimulatorBuilder::new(0).build(&policy).is_err(), "{policy:?}");
        }
        assert!(BeladyMin::new(0).is_ok());
    }

    #[test]
    fn hit_rate_zero_before_accesses() {
        for policy in all_policies(4) {
            assert_eq!(build(4, 1, &policy).hit_rate(), 0.0);
        }
        assert_eq!(BeladyMin::new(4).unwrap().hit_rate(), 0.0);
    }
}

// ==============================================
// Property Tests
// ==============================================

mod properties {
    use super::*;

    fn trace_strategy() -> impl Strategy<Value = Vec<i64>> {
        prop::collection::vec(0i64..40, 0..250)
    }

    proptest! {
        /// Resident count never exceeds capacity and index/storage agree.
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_capacity_and_index_agreement(
            capacity in 1usize..12,
            seed in any::<u64>(),
            trace in trace_strategy()
        ) {
            for policy in all_policies(capacity) {
                let mut sim = build(capacity, seed, &policy);
                for &a in &trace {
                    sim.access(a).unwrap();
                    prop_assert!(sim.len() <= sim.capacity());
                    prop_assert!(sim.check_invariants().is_ok(), "{:?}", policy);
                }
                let hr = sim.hit_rate();
                prop_assert!((0.0..=1.0).contains(&hr));
            }
        }

        /// Same seed and trace give the same outcomes and contents.
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_seeded_runs_are_deterministic(
            capacity in 1usize..12,
            seed in any::<u64>(),
            trace in trace_strategy()
        ) {
            for policy in all_policies(capacity) {
                let mut a = build(capacity, seed, &policy);
                let mut b = build(capacity, seed, &policy);
                prop_assert_eq!(a.batch_outcomes(&trace).unwrap(), b.batch_outcomes(&trace).unwrap());
                prop_assert_eq!(a.contents(), b.contents());
                prop_assert_eq!(a.stats(), b.stats());
            }
        }

        /// Belady-MIN is never beaten.
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_min_is_optimal(
            capacity in 1usize..10,
            seed in any::<u64>(),
            trace in trace_strategy()
        ) {
            let mut min = BeladyMin::new(capacity).unwrap();
            min.replay(&trace).unwrap();
            prop_assert!(min.check_invariants().is_ok());

            // these fill at the same access as MIN, so warm-up lines up
            for policy in online_policies() {
                let mut sim = build(capacity, seed, &policy);
                sim.batch(&trace).unwrap();
                prop_assert!(min.stats().miss_count <= sim.stats().miss_count, "{:?}", policy);
                prop_assert!(min.hit_rate() + 1e-12 >= sim.hit_rate(), "{:?}", policy);
            }
            // multi-list variants can leave holes, so compare raw misses
            for policy in multi_list_policies(capacity) {
                let mut sim = build(capacity, seed, &policy);
                sim.batch(&trace).unwrap();
                prop_assert!(min.stats().miss_count <= sim.stats().miss_count, "{:?}", policy);
            }
        }

        /// p stays in [0, C] and moves the right way on ghost hits.
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_arc_target_bounds(
            capacity in 1usize..10,
            trace in trace_strategy()
        ) {
            let mut arc = ArcSim::new(capacity).unwrap();
            for &a in &trace {
                let addr = a as u64;
                let (in_b1, in_b2, before) = (arc.in_b1(addr), arc.in_b2(addr), arc.p());
                arc.access(a).unwrap();
                prop_assert!(arc.p() <= capacity);
                if in_b1 && before < capacity {
                    prop_assert!(arc.p() > before);
                }
                if in_b2 && before > 0 {
                    prop_assert!(arc.p() < before);
                }
            }
        }

        /// Counters add up across every policy.
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_stats_are_consistent(
            capacity in 1usize..10,
            seed in any::<u64>(),
            trace in trace_strategy()
        ) {
            for policy in all_policies(capacity) {
                let mut sim = build(capacity, seed, &policy);
                let outcomes = sim.batch_outcomes(&trace).unwrap();
                let stats = sim.stats();
                let misses = outcomes.iter().filter(|o| o.is_miss()).count() as u64;
                let evictions = outcomes.iter().filter(|o| o.evicted().is_some()).count() as u64;
                prop_assert_eq!(stats.access_count, trace.len() as u64);
                prop_assert_eq!(stats.miss_count, misses);
                prop_assert_eq!(stats.eviction_count, evictions);
                prop_assert!(stats.examined_count >= stats.recycle_count || matches!(policy, PolicyConfig::Arc));
            }
        }
    }
}
