//! Read-only query API for inspecting simulation state.
//!
//! Provides snapshot types returned by `Simulator::update`. All types are
//! owned copies -- no references into internal simulator storage -- and
//! serialize with serde so report exporters can write them out directly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::EntityId;
use crate::kpi::{GlobalStats, HistorySample};
use crate::state::StationStatus;
use crate::station::StationKind;

// ---------------------------------------------------------------------------
// Station snapshot
// ---------------------------------------------------------------------------

/// Status and counters of one station. Times are seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSnapshot {
    pub id: String,
    pub kind: StationKind,
    pub status: StationStatus,
    pub processed: u64,
    pub generated: u64,
    pub defects: u64,
    pub scrapped: u64,
    pub busy_time: f64,
    pub blocked_time: f64,
    pub starved_time: f64,
    pub break_time: f64,
    /// Busy time over elapsed time, percent.
    pub utilization: f64,
    pub queue_length: usize,
    pub in_service: usize,
    pub blocked: bool,
}

// ---------------------------------------------------------------------------
// Transit snapshot
// ---------------------------------------------------------------------------

/// An entity travelling along an edge.
///
/// Only the discrete departure and arrival are recorded; renderers
/// interpolate with [`TransitSnapshot::progress`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitSnapshot {
    pub entity: EntityId,
    pub from: String,
    pub to: String,
    pub departed_at: f64,
    pub arrives_at: f64,
}

impl TransitSnapshot {
    /// Fraction of the trip covered at `now`, clamped to `[0, 1]`.
    pub fn progress(&self, now: f64) -> f64 {
        let span = self.arrives_at - self.departed_at;
        if span <= 0.0 {
            return 1.0;
        }
        ((now - self.departed_at) / span).clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Full snapshot
// ---------------------------------------------------------------------------

/// Everything a caller needs to render or export one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Simulated clock, seconds.
    pub time: f64,
    pub stations: BTreeMap<String, StationSnapshot>,
    pub transit: Vec<TransitSnapshot>,
    pub stats: GlobalStats,
    /// Sampled KPI series, oldest first.
    pub history: Vec<HistorySample>,
}

impl Snapshot {
    pub fn station(&self, id: &str) -> Option<&StationSnapshot> {
        self.stations.get(id)
    }
}
