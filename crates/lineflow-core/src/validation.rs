//! Runtime invariant checks and determinism validation.
//!
//! [`check_invariants`] inspects a live simulator for flow-conservation,
//! capacity and placement violations. [`validate_determinism`] runs the same
//! line twice and reports the first step at which the snapshots diverge.

use std::collections::HashSet;

use crate::config::SimConfig;
use crate::engine::Simulator;
use crate::entity::{EntityState, Location};
use crate::id::EntityId;
use crate::station::{ConfigError, StationConfig};
use crate::topology::LineDescriptor;

// ---------------------------------------------------------------------------
// Invariant violations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// generated + baseline != completed + scrapped + wip
    Conservation {
        generated: u64,
        baseline: u64,
        completed: u64,
        scrapped: u64,
        wip: u64,
    },
    /// More entities in service than the station has slots.
    ServiceOverfull {
        station: String,
        in_service: usize,
        capacity: u32,
    },
    /// Queue plus inbound transit beyond the staging limit.
    StagingOverfull {
        station: String,
        staged: usize,
        limit: usize,
    },
    /// An entity is in more than one place, or in a place that disagrees
    /// with its own location record.
    Misplaced { entity: EntityId, reason: String },
    /// Entities held by stations or edges do not match the live entity set.
    Unaccounted { placed: usize, live: usize },
}

/// Check every flow invariant against the current state.
pub fn check_invariants(sim: &Simulator) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let kpi = sim.kpi();
    let wip = sim.entity_count() as u64;

    if kpi.generated() + kpi.wip_baseline() != kpi.completed() + kpi.scrapped() + wip {
        violations.push(InvariantViolation::Conservation {
            generated: kpi.generated(),
            baseline: kpi.wip_baseline(),
            completed: kpi.completed(),
            scrapped: kpi.scrapped(),
            wip,
        });
    }

    let graph = sim.graph();
    let slack = sim.settings().staging_slack as usize;
    let mut seen: HashSet<EntityId> = HashSet::new();
    let mut placed = 0usize;

    for (id, spec) in graph.stations() {
        let Some(state) = sim.station_state_by_id(id) else {
            continue;
        };
        let capacity = spec.config.capacity();
        if state.in_service.len() > capacity as usize {
            violations.push(InvariantViolation::ServiceOverfull {
                station: spec.name.clone(),
                in_service: state.in_service.len(),
                capacity,
            });
        }

        let (staged, limit) = match spec.config {
            // Generated entities queue at their Source without bound.
            StationConfig::Source { .. } => (0, 0),
            StationConfig::Inventory { .. } => (
                state.occupancy() + state.inbound as usize,
                capacity as usize,
            ),
            _ => (
                state.queue.len() + state.inbound as usize,
                capacity as usize + slack,
            ),
        };
        if staged > limit {
            violations.push(InvariantViolation::StagingOverfull {
                station: spec.name.clone(),
                staged,
                limit,
            });
        }

        let held = state
            .queue
            .iter()
            .map(|&e| (e, EntityState::Queued))
            .chain(state.in_service.iter().map(|&e| (e, EntityState::Processing)))
            .chain(state.blocked.iter().map(|b| (b.entity, EntityState::Processing)));
        for (entity, expected) in held {
            placed += 1;
            if !seen.insert(entity) {
                violations.push(InvariantViolation::Misplaced {
                    entity,
                    reason: format!("held twice, again at {}", spec.name),
                });
                continue;
            }
            match sim.entity(entity) {
                None => violations.push(InvariantViolation::Misplaced {
                    entity,
                    reason: format!("{} holds a dead entity", spec.name),
                }),
                Some(ent) if ent.location != Location::Station(id) => {
                    violations.push(InvariantViolation::Misplaced {
                        entity,
                        reason: format!("held at {} but located elsewhere", spec.name),
                    })
                }
                Some(ent) if ent.state != expected => {
                    violations.push(InvariantViolation::Misplaced {
                        entity,
                        reason: format!("state {:?} at {}, expected {expected:?}", ent.state, spec.name),
                    })
                }
                Some(_) => {}
            }
        }
    }

    for (entity, ent) in sim.entities() {
        if let Location::Transit { .. } = ent.location {
            placed += 1;
            if !seen.insert(entity) {
                violations.push(InvariantViolation::Misplaced {
                    entity,
                    reason: "in transit and held by a station".to_string(),
                });
            }
        }
    }

    if placed != sim.entity_count() {
        violations.push(InvariantViolation::Unaccounted {
            placed,
            live: sim.entity_count(),
        });
    }

    violations
}

// ---------------------------------------------------------------------------
// Determinism
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DeterminismResult {
    pub is_deterministic: bool,
    /// Index of the first `update` call whose snapshots differed.
    pub divergence_step: Option<usize>,
    /// Simulated time at the end of the last compared step, seconds.
    pub final_time: f64,
}

/// Build the line twice with the same settings, step both `steps` times by
/// `dt`, and compare the snapshots after every step.
pub fn validate_determinism(
    descriptor: &LineDescriptor,
    config: &SimConfig,
    dt: f64,
    steps: usize,
) -> Result<DeterminismResult, ConfigError> {
    let mut a = Simulator::new(descriptor.clone(), config.clone())?;
    let mut b = Simulator::new(descriptor.clone(), config.clone())?;

    let mut divergence_step = None;
    let mut final_time = 0.0;
    for step in 0..steps {
        let sa = a.update(dt);
        let sb = b.update(dt);
        final_time = sa.time;
        if sa != sb {
            divergence_step = Some(step);
            break;
        }
    }

    Ok(DeterminismResult {
        is_deterministic: divergence_step.is_none(),
        divergence_step,
        final_time,
    })
}

// ===========================================================================
// Tests
// ===========================================================================
