//! Read-only line digest for external advisors.
//!
//! An advisor receives the topology plus current metrics and answers with
//! suggestions of its own. The simulator only produces the digest; it never
//! reads anything back.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::engine::Simulator;
use crate::fixed::to_f64;
use crate::kpi::{GlobalStats, utilization};
use crate::state::StationStatus;
use crate::station::{StationConfig, StationKind};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// One station as an advisor sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationDigest {
    pub id: String,
    pub kind: StationKind,
    /// Nominal cycle time (arrival interval for Sources), seconds.
    pub cycle_time: Option<f64>,
    pub capacity: u32,
    pub batch_size: u32,
    pub defect_rate_pct: f64,
    pub status: StationStatus,
    pub utilization: f64,
    pub queue_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorySnapshot {
    pub stations: Vec<StationDigest>,
    /// `(source, target)` station ids in declaration order.
    pub edges: Vec<(String, String)>,
    pub stats: GlobalStats,
}

impl Simulator {
    /// Digest of the current topology and metrics.
    pub fn advisory_snapshot(&self) -> AdvisorySnapshot {
        let graph = self.graph();
        let elapsed = self.kpi().elapsed(self.now());
        let stations = graph
            .stations()
            .map(|(id, spec)| {
                let state = self.station_state_by_id(id);
                let batch_size = match spec.config {
                    StationConfig::Source { batch_size, .. } => batch_size,
                    _ => 1,
                };
                StationDigest {
                    id: spec.name.clone(),
                    kind: spec.kind(),
                    cycle_time: spec.config.nominal_cycle().map(to_f64),
                    capacity: spec.config.capacity(),
                    batch_size,
                    defect_rate_pct: to_f64(spec.config.defect_rate()) * 100.0,
                    status: state.map_or(StationStatus::Idle, |s| s.status),
                    utilization: state
                        .map_or(0.0, |s| utilization(s.counters.busy_time, elapsed)),
                    queue_length: state.map_or(0, |s| s.queue.len()),
                }
            })
            .collect();
        let edges = graph
            .edges()
            .map(|(_, e)| (graph.name(e.from).to_string(), graph.name(e.to).to_string()))
            .collect();
        AdvisorySnapshot {
            stations,
            edges,
            stats: self.stats().clone(),
        }
    }
}

impl AdvisorySnapshot {
    /// Theoretical line rate: the slowest station's nominal units per hour.
    /// `None` if no station has a cycle time.
    pub fn max_throughput_per_hour(&self) -> Option<f64> {
        self.stations
            .iter()
            .filter(|s| s.kind != StationKind::Inventory)
            .filter_map(|s| {
                let cycle = s.cycle_time.filter(|&c| c > 0.0)?;
                // A Source's capacity is its batch size.
                Some(f64::from(s.capacity) * SECONDS_PER_HOUR / cycle)
            })
            .min_by(f64::total_cmp)
    }

    /// Longest sum of nominal cycle times along any acyclic route from a
    /// Source. Rework loops are walked once.
    pub fn critical_path_cycle_time(&self) -> f64 {
        let index: HashMap<&str, usize> = self
            .stations
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.as_str(), i))
            .collect();
        let mut outputs: Vec<Vec<usize>> = vec![Vec::new(); self.stations.len()];
        for (from, to) in &self.edges {
            if let (Some(&a), Some(&b)) = (index.get(from.as_str()), index.get(to.as_str())) {
                outputs[a].push(b);
            }
        }

        let mut on_path = vec![false; self.stations.len()];
        self.stations
            .iter()
            .enumerate()
            .filter(|(_, s)| s.kind == StationKind::Source)
            .map(|(i, _)| self.longest_from(i, &outputs, &mut on_path))
            .fold(0.0, f64::max)
    }

    fn longest_from(&self, node: usize, outputs: &[Vec<usize>], on_path: &mut [bool]) -> f64 {
        on_path[node] = true;
        let own = self.stations[node].cycle_time.unwrap_or(0.0);
        let mut best = 0.0_f64;
        for &next in &outputs[node] {
            if !on_path[next] {
                best = best.max(self.longest_from(next, outputs, on_path));
            }
        }
        on_path[node] = false;
        own + best
    }

    /// Expected share of good output, percent: the product of every Quality
    /// station's pass rate.
    pub fn estimated_yield(&self) -> f64 {
        self.stations
            .iter()
            .filter(|s| s.kind == StationKind::Quality)
            .map(|s| 1.0 - s.defect_rate_pct / 100.0)
            .product::<f64>()
            * 100.0
    }
}
