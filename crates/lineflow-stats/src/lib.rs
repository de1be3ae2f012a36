//! Derived statistics over simulator output, for reports and dashboards.
//!
//! Works on the owned records the simulator already hands out: the sampled
//! KPI history and the per-station snapshot. Nothing here touches a running
//! simulator.
//!
//! # Usage
//!
//! ```ignore
//! let snapshot = sim.update(1.0);
//! let summary = HistorySummary::from_samples(&snapshot.history);
//! let settled = is_steady(&snapshot.history, 12, 0.05);
//! let ranking = station_breakdown(&snapshot);
//! ```

use lineflow_core::kpi::HistorySample;
use lineflow_core::query::Snapshot;
use lineflow_core::station::StationKind;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// History summary
// ---------------------------------------------------------------------------

/// Aggregates over a KPI history series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub samples: usize,
    /// Time from the first to the last sample, seconds.
    pub span: f64,
    pub mean_throughput: f64,
    pub peak_throughput: f64,
    pub mean_wip: f64,
    pub peak_wip: u64,
    pub mean_oee: f64,
    pub min_oee: f64,
    /// Average lead time at the last sample.
    pub final_lead_time: f64,
}

impl HistorySummary {
    /// Summarize `samples` (oldest first). An empty series gives all zeros.
    pub fn from_samples(samples: &[HistorySample]) -> Self {
        let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
            return Self::default();
        };
        Self {
            samples: samples.len(),
            span: last.time - first.time,
            mean_throughput: mean_of(samples, |s| s.throughput_per_hour),
            peak_throughput: samples
                .iter()
                .map(|s| s.throughput_per_hour)
                .fold(0.0, f64::max),
            mean_wip: mean_of(samples, |s| s.wip as f64),
            peak_wip: samples.iter().map(|s| s.wip).max().unwrap_or(0),
            mean_oee: mean_of(samples, |s| s.oee),
            min_oee: samples.iter().map(|s| s.oee).fold(f64::INFINITY, f64::min),
            final_lead_time: last.avg_lead_time,
        }
    }
}

fn mean_of(samples: &[HistorySample], f: impl Fn(&HistorySample) -> f64) -> f64 {
    samples.iter().map(f).sum::<f64>() / samples.len().max(1) as f64
}

// ---------------------------------------------------------------------------
// Steady-state detection
// ---------------------------------------------------------------------------

/// Whether throughput over the last `window` samples stays within
/// `tolerance` (a fraction of its mean) of itself.
///
/// Returns `false` when fewer than `window` samples exist or `window` is
/// zero. A flat zero series counts as steady.
pub fn is_steady(samples: &[HistorySample], window: usize, tolerance: f64) -> bool {
    if window == 0 || samples.len() < window {
        return false;
    }
    let tail = &samples[samples.len() - window..];
    let (lo, hi) = tail.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
        (lo.min(s.throughput_per_hour), hi.max(s.throughput_per_hour))
    });
    let mean = tail.iter().map(|s| s.throughput_per_hour).sum::<f64>() / window as f64;
    if mean <= 0.0 {
        return hi <= 0.0;
    }
    (hi - lo) / mean <= tolerance
}

// ---------------------------------------------------------------------------
// Station breakdown
// ---------------------------------------------------------------------------

/// How one station spent its time, in percent of the statistics period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationBreakdown {
    pub id: String,
    pub kind: StationKind,
    pub busy: f64,
    pub blocked: f64,
    pub starved: f64,
    pub on_break: f64,
}

/// Per-station time shares from a snapshot, busiest first. Ties keep the
/// snapshot's id order.
pub fn station_breakdown(snapshot: &Snapshot) -> Vec<StationBreakdown> {
    let elapsed = snapshot.stats.elapsed.max(1.0);
    let share = |t: f64| (t / elapsed * 100.0).clamp(0.0, 100.0);
    let mut rows: Vec<StationBreakdown> = snapshot
        .stations
        .values()
        .map(|s| StationBreakdown {
            id: s.id.clone(),
            kind: s.kind,
            busy: s.utilization,
            blocked: share(s.blocked_time),
            starved: share(s.starved_time),
            on_break: share(s.break_time),
        })
        .collect();
    rows.sort_by(|a, b| b.busy.total_cmp(&a.busy));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineflow_core::config::SimConfig;
    use lineflow_core::test_utils::*;

    fn sample(time: f64, throughput: f64, wip: u64, oee: f64) -> HistorySample {
        HistorySample {
            time,
            throughput_per_hour: throughput,
            wip,
            oee,
            avg_lead_time: time / 10.0,
            ..Default::default()
        }
    }

    #[test]
    fn empty_history_summarizes_to_zero() {
        assert_eq!(HistorySummary::from_samples(&[]), HistorySummary::default());
    }

    #[test]
    fn summary_of_known_series() {
        let samples = [
            sample(5.0, 100.0, 4, 50.0),
            sample(10.0, 200.0, 8, 40.0),
            sample(15.0, 300.0, 6, 60.0),
        ];
        let s = HistorySummary::from_samples(&samples);
        assert_eq!(s.samples, 3);
        assert_eq!(s.span, 10.0);
        assert_eq!(s.mean_throughput, 200.0);
        assert_eq!(s.peak_throughput, 300.0);
        assert_eq!(s.mean_wip, 6.0);
        assert_eq!(s.peak_wip, 8);
        assert_eq!(s.mean_oee, 50.0);
        assert_eq!(s.min_oee, 40.0);
        assert_eq!(s.final_lead_time, 1.5);
    }

    #[test]
    fn steady_needs_a_full_window() {
        let samples = [sample(5.0, 100.0, 1, 0.0), sample(10.0, 100.0, 1, 0.0)];
        assert!(!is_steady(&samples, 3, 0.1));
        assert!(!is_steady(&samples, 0, 0.1));
        assert!(is_steady(&samples, 2, 0.0));
    }

    #[test]
    fn steady_looks_only_at_the_tail() {
        let samples = [
            sample(5.0, 10.0, 1, 0.0),
            sample(10.0, 500.0, 1, 0.0),
            sample(15.0, 360.0, 1, 0.0),
            sample(20.0, 365.0, 1, 0.0),
            sample(25.0, 355.0, 1, 0.0),
        ];
        assert!(is_steady(&samples, 3, 0.05));
        assert!(!is_steady(&samples, 4, 0.05));
    }

    #[test]
    fn zero_series_is_steady() {
        let samples = [sample(5.0, 0.0, 0, 0.0), sample(10.0, 0.0, 0, 0.0)];
        assert!(is_steady(&samples, 2, 0.0));
    }

    #[test]
    fn breakdown_ranks_busiest_first() {
        let mut sim = build_simulator(bottleneck_line(), SimConfig::default());
        let snapshot = run(&mut sim, 600.0, 1.0);
        let rows = station_breakdown(&snapshot);
        assert_eq!(rows.len(), 5);
        // The Source is in service the whole time.
        assert_eq!(rows[0].id, "in");
        assert_eq!(rows[1].id, "p1");
        for row in &rows {
            assert!(row.busy + row.blocked + row.starved + row.on_break <= 100.0 + 1e-6);
        }
    }

    #[test]
    fn summary_serializes() {
        let s = HistorySummary::from_samples(&[sample(5.0, 100.0, 4, 50.0)]);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["peak_wip"], 4);
    }
}
