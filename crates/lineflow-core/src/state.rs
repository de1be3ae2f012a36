//! Mutable per-station runtime state, owned by the simulator.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed64, SimTime};
use crate::id::EntityId;

/// Observable station status. `Break` overlays the work states: a station on
/// a scheduled break reports `Break` unless it is holding a blocked entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationStatus {
    /// Nothing has happened at this station yet.
    #[default]
    Idle,
    Active,
    Blocked,
    Starved,
    Break,
}

/// Which outgoing edges a finished entity may leave through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Any outgoing edge, first with room wins.
    Any,
    /// Only the first outgoing edge (Quality, passed inspection).
    Primary,
    /// Only the second outgoing edge (Quality, failed inspection).
    Rework,
}

/// A finished entity waiting for downstream room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockedEntity {
    pub entity: EntityId,
    pub route: Route,
}

/// Cumulative counters. Zeroed by the warm-up reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationCounters {
    /// Entities that left this station (forwarded or completed here).
    pub processed: u64,
    pub generated: u64,
    pub defects: u64,
    pub scrapped: u64,
    /// Service time weighted by the fraction of slots in use.
    pub busy_time: SimTime,
    pub blocked_time: SimTime,
    pub starved_time: SimTime,
    pub break_time: SimTime,
}

/// Runtime state of one station.
#[derive(Debug, Clone, Default)]
pub struct StationState {
    pub status: StationStatus,
    pub queue: VecDeque<EntityId>,
    pub in_service: Vec<EntityId>,
    pub blocked: Option<BlockedEntity>,
    /// Entities that finished service while the blocked slot was taken. They
    /// keep their service slot (and stay in `in_service`) until promoted.
    pub awaiting: VecDeque<BlockedEntity>,
    /// Entities in transit toward this station. Counted against its room so
    /// that simultaneous departures cannot overfill it.
    pub inbound: u32,
    /// Whether a scheduled break was in effect at the last evaluation.
    pub on_break: bool,
    pub counters: StationCounters,
    /// Set once the station has held any entity.
    pub(crate) touched: bool,
}

impl StationState {
    /// Queue plus in-service.
    pub fn occupancy(&self) -> usize {
        self.queue.len() + self.in_service.len()
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.is_some()
    }

    /// Recompute `status` from the slots. Blocked wins over break.
    pub(crate) fn refresh_status(&mut self) {
        self.status = if self.blocked.is_some() {
            StationStatus::Blocked
        } else if self.on_break {
            StationStatus::Break
        } else if !self.in_service.is_empty() {
            StationStatus::Active
        } else if self.queue.is_empty() {
            if self.touched {
                StationStatus::Starved
            } else {
                StationStatus::Idle
            }
        } else {
            StationStatus::Idle
        };
    }

    /// Accrue time counters for an interval spent in the current state.
    pub(crate) fn accrue(&mut self, dt: SimTime, capacity: u32) {
        if dt <= SimTime::ZERO {
            return;
        }
        let working = self.in_service.len().saturating_sub(self.awaiting.len());
        let busy = working.min(capacity as usize);
        if busy > 0 {
            let share = Fixed64::from_num(busy) / Fixed64::from_num(capacity.max(1));
            self.counters.busy_time += dt * share;
        }
        match self.status {
            StationStatus::Blocked => self.counters.blocked_time += dt,
            StationStatus::Starved => self.counters.starved_time += dt,
            StationStatus::Break => self.counters.break_time += dt,
            StationStatus::Idle | StationStatus::Active => {}
        }
    }

    pub(crate) fn reset_counters(&mut self) {
        self.counters = StationCounters::default();
    }
}
