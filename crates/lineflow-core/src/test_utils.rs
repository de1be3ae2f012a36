//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::config::SimConfig;
use crate::engine::Simulator;
use crate::fixed::SimTime;
use crate::query::Snapshot;
use crate::station::{StationDescriptor, StationKind};
use crate::topology::LineDescriptor;

// ===========================================================================
// Time helper
// ===========================================================================

pub fn t(seconds: f64) -> SimTime {
    SimTime::from_num(seconds)
}

// ===========================================================================
// Station constructors
// ===========================================================================

pub fn source(id: &str, interval: f64) -> StationDescriptor {
    StationDescriptor::new(id, StationKind::Source, interval)
}

pub fn process(id: &str, cycle: f64) -> StationDescriptor {
    StationDescriptor::new(id, StationKind::Process, cycle)
}

pub fn quality(id: &str, cycle: f64, defect_rate_pct: f64) -> StationDescriptor {
    StationDescriptor::new(id, StationKind::Quality, cycle).with_defect_rate(defect_rate_pct)
}

pub fn inventory(id: &str, capacity: u32) -> StationDescriptor {
    StationDescriptor::new(id, StationKind::Inventory, 0.0).with_capacity(capacity)
}

pub fn shipping(id: &str, cycle: f64) -> StationDescriptor {
    StationDescriptor::new(id, StationKind::Shipping, cycle)
}

// ===========================================================================
// Line builders
// ===========================================================================

/// `in -> p0 -> p1 -> ... -> out`. The first value is the Source interval,
/// the rest are Process cycle times. Shipping takes one second.
pub fn serial_line(cycles: &[f64]) -> LineDescriptor {
    let mut line = LineDescriptor::new();
    let Some((&interval, rest)) = cycles.split_first() else {
        return line;
    };
    line = line.station(source("in", interval));
    let mut prev = "in".to_string();
    for (i, &cycle) in rest.iter().enumerate() {
        let id = format!("p{i}");
        line = line.station(process(&id, cycle)).edge(prev.as_str(), id.as_str());
        prev = id;
    }
    line.station(shipping("out", 1.0)).edge(prev.as_str(), "out")
}

/// `in(5) -> press(10) -> out`: the Source outpaces the press two to one.
pub fn backpressure_line() -> LineDescriptor {
    LineDescriptor::new()
        .station(source("in", 5.0))
        .station(process("press", 10.0))
        .station(shipping("out", 1.0))
        .edge("in", "press")
        .edge("press", "out")
}

/// `in(10) -> p1(9) -> p2(7) -> p3(5) -> out`. Steady-state utilizations
/// are 90, 70 and 50 percent.
pub fn bottleneck_line() -> LineDescriptor {
    LineDescriptor::new()
        .station(source("in", 10.0))
        .station(process("p1", 9.0))
        .station(process("p2", 7.0))
        .station(process("p3", 5.0))
        .station(shipping("out", 1.0))
        .edge("in", "p1")
        .edge("p1", "p2")
        .edge("p2", "p3")
        .edge("p3", "out")
}

/// `in(5) -> cut(4) -> check(3) -> out`, with `check -> fix(6) -> check` as
/// the rework loop.
pub fn rework_line(defect_rate_pct: f64, variation_pct: f64) -> LineDescriptor {
    LineDescriptor::new()
        .station(source("in", 5.0))
        .station(process("cut", 4.0).with_variation(variation_pct))
        .station(quality("check", 3.0, defect_rate_pct))
        .station(process("fix", 6.0))
        .station(shipping("out", 1.0))
        .edge("in", "cut")
        .edge("cut", "check")
        .edge("check", "out")
        .edge("check", "fix")
        .edge("fix", "check")
}

/// `in(5) -> check(3) -> out` with no rework edge, so defects are scrapped.
pub fn scrap_line(defect_rate_pct: f64) -> LineDescriptor {
    LineDescriptor::new()
        .station(source("in", 5.0))
        .station(quality("check", 3.0, defect_rate_pct))
        .station(shipping("out", 1.0))
        .edge("in", "check")
        .edge("check", "out")
}

/// One Source fanning out into `branches` chains of `depth` Process
/// stations, each ending at its own Shipping station.
pub fn parallel_line(branches: usize, depth: usize) -> LineDescriptor {
    let mut line = LineDescriptor::new().station(source("in", 0.5).with_batch_size(2));
    for b in 0..branches {
        let mut prev = "in".to_string();
        for d in 0..depth {
            let id = format!("b{b}p{d}");
            let cycle = 2.0 + (d % 3) as f64;
            line = line
                .station(process(&id, cycle).with_variation(10.0))
                .edge(prev.as_str(), id.as_str());
            prev = id;
        }
        let out = format!("b{b}out");
        line = line
            .station(shipping(&out, 1.0))
            .edge(prev.as_str(), out.as_str());
    }
    line
}

// ===========================================================================
// Running
// ===========================================================================

pub fn build_simulator(line: LineDescriptor, config: SimConfig) -> Simulator {
    Simulator::new(line, config).expect("test line should be valid")
}

/// Step `sim` by `dt` until `seconds` of simulated time have passed.
pub fn run(sim: &mut Simulator, seconds: f64, dt: f64) -> Snapshot {
    let until = sim.now_secs() + seconds;
    sim.run_for(until, dt)
}
