//! End-to-end line scenarios checked against the advisory digest and the
//! derived statistics.

use lineflow_core::config::SimConfig;
use lineflow_core::state::StationStatus;
use lineflow_core::test_utils::*;
use lineflow_core::validation::{check_invariants, validate_determinism};
use lineflow_stats::{HistorySummary, station_breakdown};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn simulated_rate_stays_under_the_advisory_ceiling() {
    init_tracing();
    let mut sim = build_simulator(bottleneck_line(), SimConfig::default().with_warm_up(100.0));
    run(&mut sim, 1100.0, 1.0);

    let advisory = sim.advisory_snapshot();
    let ceiling = advisory.max_throughput_per_hour().unwrap();
    assert!((ceiling - 360.0).abs() < 1e-9);
    assert!(advisory.stats.throughput_per_hour <= ceiling * 1.05);
    assert!((advisory.critical_path_cycle_time() - 32.0).abs() < 1e-9);
    assert_eq!(advisory.estimated_yield(), 100.0);
    assert_eq!(advisory.edges.len(), 4);
}

#[test]
fn backpressure_shows_up_in_the_breakdown() {
    init_tracing();
    let mut sim = build_simulator(backpressure_line(), SimConfig::default());
    let snapshot = run(&mut sim, 300.0, 1.0);

    let rows = station_breakdown(&snapshot);
    let source = rows.iter().find(|r| r.id == "in").unwrap();
    let press = rows.iter().find(|r| r.id == "press").unwrap();
    assert!(source.blocked > 0.0);
    assert!(press.busy > 90.0);
    assert_eq!(press.blocked, 0.0);
    assert!(check_invariants(&sim).is_empty());
}

#[test]
fn rework_loop_keeps_the_line_consistent() {
    init_tracing();
    let mut sim = build_simulator(rework_line(25.0, 15.0), SimConfig::default().with_seed(9));
    for _ in 0..200 {
        sim.update(1.5);
        let violations = check_invariants(&sim);
        assert!(violations.is_empty(), "{violations:?}");
    }

    let snapshot = sim.snapshot();
    let check = snapshot.station("check").unwrap();
    assert!(check.defects > 0);
    assert!(snapshot.station("fix").unwrap().processed > 0);
    assert_eq!(snapshot.stats.scrapped, 0);
    assert!(snapshot.stats.quality < 100.0);
}

#[test]
fn wide_line_is_deterministic_and_sampled() {
    init_tracing();
    let line = parallel_line(8, 3);
    let result = validate_determinism(&line, &SimConfig::default().with_seed(31), 0.7, 400).unwrap();
    assert!(result.is_deterministic);
    assert_eq!(result.divergence_step, None);
    assert!((result.final_time - 280.0).abs() < 1e-6);

    let mut sim = build_simulator(line, SimConfig::default());
    let snapshot = run(&mut sim, 300.0, 1.0);
    let summary = HistorySummary::from_samples(&snapshot.history);
    assert_eq!(summary.samples, 60);
    assert!(summary.peak_wip >= summary.mean_wip as u64);
    assert!(
        snapshot
            .stations
            .values()
            .filter(|s| s.id.ends_with("out"))
            .all(|s| s.processed > 0)
    );
}

#[test]
fn reset_after_a_run_restores_idle_stations() {
    init_tracing();
    let mut sim = build_simulator(bottleneck_line(), SimConfig::default());
    run(&mut sim, 120.0, 1.0);
    sim.reset();

    let snapshot = sim.snapshot();
    assert_eq!(snapshot.time, 0.0);
    assert!(snapshot.transit.is_empty());
    assert!(
        snapshot
            .stations
            .values()
            .filter(|s| s.id != "in")
            .all(|s| s.status == StationStatus::Idle && s.processed == 0)
    );
    assert!(snapshot.history.is_empty());
}
