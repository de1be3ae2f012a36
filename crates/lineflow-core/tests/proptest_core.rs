//! Property-based tests for the Lineflow simulator.
//!
//! Uses proptest to generate random lines and update sequences, then
//! verify flow conservation, capacity bounds and determinism.

use lineflow_core::config::SimConfig;
use lineflow_core::event::{Event, EventQueue};
use lineflow_core::fixed::secs;
use lineflow_core::test_utils::*;
use lineflow_core::topology::LineDescriptor;
use lineflow_core::validation::check_invariants;
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

#[derive(Debug, Clone)]
struct StageSpec {
    cycle: f64,
    capacity: u32,
    variation: f64,
    defect: f64,
    buffer: bool,
}

fn arb_stage() -> impl Strategy<Value = StageSpec> {
    (0.5..15.0f64, 1..4u32, 0.0..40.0f64, 0.0..50.0f64, any::<bool>()).prop_map(
        |(cycle, capacity, variation, defect, buffer)| StageSpec {
            cycle,
            capacity,
            variation,
            defect,
            buffer,
        },
    )
}

/// A serial line of random stages. Odd stages are Quality stations with a
/// rework edge back to the previous stage; `buffer` stages get an Inventory
/// in front of them.
fn arb_line() -> impl Strategy<Value = LineDescriptor> {
    (0.5..10.0f64, 1..4u32, proptest::collection::vec(arb_stage(), 1..6)).prop_map(
        |(interval, batch, stages)| {
            let entry = |i: usize| -> String {
                match stages.get(i) {
                    Some(s) if s.buffer => format!("buf{i}"),
                    Some(_) => format!("s{i}"),
                    None => "out".to_string(),
                }
            };

            let mut line =
                LineDescriptor::new().station(source("in", interval).with_batch_size(batch));
            for (i, stage) in stages.iter().enumerate() {
                if stage.buffer {
                    line = line.station(inventory(&format!("buf{i}"), stage.capacity + 1));
                }
                let id = format!("s{i}");
                let station = if i % 2 == 1 {
                    quality(&id, stage.cycle, stage.defect)
                } else {
                    process(&id, stage.cycle).with_variation(stage.variation)
                };
                line = line.station(station.with_capacity(stage.capacity));
            }
            line = line.station(shipping("out", 1.0)).edge("in", entry(0));

            for (i, stage) in stages.iter().enumerate() {
                let id = format!("s{i}");
                if stage.buffer {
                    line = line.edge(format!("buf{i}"), id.as_str());
                }
                // Primary first, rework second.
                line = line.edge(id.as_str(), entry(i + 1));
                if i % 2 == 1 {
                    line = line.edge(id.as_str(), format!("s{}", i - 1));
                }
            }
            line
        },
    )
}

fn arb_dts() -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec(0.05..20.0f64, 1..60)
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(40))]

    /// Conservation, capacity and placement hold after every update.
    #[test]
    fn invariants_hold_after_every_update(line in arb_line(), dts in arb_dts(), seed in any::<u64>()) {
        let mut sim = build_simulator(line, SimConfig::default().with_seed(seed));
        for dt in dts {
            sim.update(dt);
            let violations = check_invariants(&sim);
            prop_assert!(violations.is_empty(), "{:?}", violations);
        }
    }

    /// Same seed and same update sequence give identical snapshots.
    #[test]
    fn runs_are_deterministic(line in arb_line(), dts in arb_dts(), seed in any::<u64>()) {
        let config = SimConfig::default().with_seed(seed);
        let mut a = build_simulator(line.clone(), config.clone());
        let mut b = build_simulator(line, config);
        for dt in dts {
            prop_assert_eq!(a.update(dt), b.update(dt));
        }
    }

    /// Warm-up reset keeps generated + baseline == completed + scrapped + wip.
    #[test]
    fn warm_up_preserves_conservation(
        line in arb_line(),
        warm_up in 1.0..200.0f64,
        dts in arb_dts(),
    ) {
        let mut sim = build_simulator(line, SimConfig::default().with_warm_up(warm_up));
        for dt in dts {
            let snap = sim.update(dt);
            let kpi = sim.kpi();
            prop_assert_eq!(
                kpi.generated() + kpi.wip_baseline(),
                snap.stats.completed + snap.stats.scrapped + snap.stats.wip
            );
        }
    }

    /// The clock advances by exactly the sum of valid steps.
    #[test]
    fn clock_tracks_requested_time(dts in arb_dts()) {
        let mut sim = build_simulator(backpressure_line(), SimConfig::default());
        let mut expected = secs(0.0).unwrap();
        for dt in dts {
            sim.update(dt);
            expected += secs(dt).unwrap();
        }
        prop_assert_eq!(sim.now(), expected);
    }

    /// Events pop in nondecreasing time order.
    #[test]
    fn event_queue_orders_by_time_then_insertion(times in proptest::collection::vec(0u32..20, 1..100)) {
        let line = serial_line(&[1.0]);
        let sim = build_simulator(line, SimConfig::default());
        let station = sim.graph().station_id("in").unwrap();

        let mut queue = EventQueue::new();
        for &t in &times {
            queue.push(Event::arrival(secs(f64::from(t)).unwrap(), station, None));
        }
        let mut popped = Vec::new();
        while let Some(event) = queue.pop() {
            popped.push(event.time);
        }
        prop_assert_eq!(popped.len(), times.len());
        prop_assert!(popped.windows(2).all(|w| w[0] <= w[1]));
    }
}
