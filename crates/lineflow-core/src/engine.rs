//! The simulator: owns the line graph, station and entity state, and the
//! event queue, and advances them on each `update(dt)`.
//!
//! # Event loop
//!
//! `update(dt)` computes a target time and drains every event at or before
//! it in `(time, seq)` order. Before an event is applied the clock advances
//! to its time, accruing per-station time counters for the interval and
//! re-evaluating shift breaks. Break starts and ends are stopping points of
//! their own, so the outcome does not depend on how the caller slices `dt`.
//! Applying an event may schedule further events
//! and may queue unblock notifications, which are drained before the next
//! event is popped.
//!
//! # Backpressure
//!
//! A station whose finished entity finds no downstream room holds it in its
//! blocked slot and stops starting new work. Whenever a station starts
//! service or sends an entity off, its distinct upstream neighbors are
//! visited in order and the first one whose blocked entity now fits is
//! released. One notification releases at most one entity; the released
//! station's own service restart then notifies its upstream in turn.

use std::collections::VecDeque;

use slotmap::{SecondaryMap, SlotMap};
use tracing::{debug, info, trace};

use crate::config::{Settings, SimConfig};
use crate::entity::{Classification, Entity, EntityState, Location};
use crate::event::{Event, EventKind, EventQueue};
use crate::fixed::{Fixed64, SimTime, checked_mul_64, to_f64};
use crate::id::{EdgeId, EntityId, StationId};
use crate::kpi::{CompletionRecord, GlobalStats, KpiTracker, StationLoad, utilization};
use crate::query::{Snapshot, StationSnapshot, TransitSnapshot};
use crate::rng::SimRng;
use crate::state::{BlockedEntity, Route, StationState};
use crate::station::{ConfigError, CycleTime, StationConfig, StationKind};
use crate::topology::{EdgeData, LineDescriptor, LineGraph};

// ---------------------------------------------------------------------------
// Service time
// ---------------------------------------------------------------------------

/// How long one service at a station takes.
#[derive(Debug, Clone, Copy)]
enum ServiceTime {
    Fixed(SimTime),
    Varied(CycleTime),
}

impl ServiceTime {
    fn of(config: &StationConfig, pass_through: SimTime) -> Self {
        match config {
            StationConfig::Source { interval, .. } => ServiceTime::Fixed(*interval),
            StationConfig::Inventory { .. } => ServiceTime::Fixed(pass_through),
            StationConfig::Process { cycle, .. }
            | StationConfig::Quality { cycle, .. }
            | StationConfig::Shipping { cycle, .. } => ServiceTime::Varied(*cycle),
        }
    }

    fn draw(self, rng: &mut SimRng) -> SimTime {
        match self {
            ServiceTime::Fixed(t) => t,
            ServiceTime::Varied(cycle) => {
                let factor = rng.spread(cycle.variation);
                checked_mul_64(cycle.nominal, factor)
                    .unwrap_or(cycle.nominal)
                    .max(SimTime::ZERO)
            }
        }
    }
}

/// What happens to an entity that just finished service.
enum Outcome {
    Complete,
    Scrap,
    Forward(Route),
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// A discrete-event simulator for one production line.
#[derive(Debug)]
pub struct Simulator {
    descriptor: LineDescriptor,
    config: SimConfig,
    settings: Settings,
    graph: LineGraph,

    // -- Per-station state (SoA, keyed by StationId) --
    states: SecondaryMap<StationId, StationState>,
    /// Stations with a shift schedule, in declaration order.
    shifted: Vec<StationId>,

    entities: SlotMap<EntityId, Entity>,
    queue: EventQueue,
    rng: SimRng,
    now: SimTime,

    kpi: KpiTracker,
    warm_up_pending: bool,
    /// Stations whose upstream neighbors should retry their blocked entity.
    notify: VecDeque<StationId>,
    stats: GlobalStats,
}

impl Simulator {
    /// Build a simulator for `descriptor`. Fails if the topology or the
    /// settings are invalid; nothing is partially built.
    pub fn new(descriptor: LineDescriptor, config: SimConfig) -> Result<Self, ConfigError> {
        let settings = config.settings()?;
        let graph = LineGraph::build(&descriptor)?;
        let kpi = tracker(&settings);
        let mut sim = Self {
            descriptor,
            config,
            rng: SimRng::new(settings.seed),
            settings,
            graph,
            states: SecondaryMap::new(),
            shifted: Vec::new(),
            entities: SlotMap::with_key(),
            queue: EventQueue::new(),
            now: SimTime::ZERO,
            kpi,
            warm_up_pending: false,
            notify: VecDeque::new(),
            stats: GlobalStats::default(),
        };
        sim.reinit();
        Ok(sim)
    }

    /// Replace the topology and restart from time zero. On error the current
    /// simulation is left untouched.
    pub fn initialize(&mut self, descriptor: LineDescriptor) -> Result<(), ConfigError> {
        let graph = LineGraph::build(&descriptor)?;
        self.graph = graph;
        self.descriptor = descriptor;
        self.reinit();
        Ok(())
    }

    /// Replace the engine settings and restart from time zero.
    pub fn reconfigure(&mut self, config: SimConfig) -> Result<(), ConfigError> {
        self.settings = config.settings()?;
        self.config = config;
        self.reinit();
        Ok(())
    }

    /// Restart the current topology from time zero.
    pub fn reset(&mut self) {
        self.reinit();
    }

    fn reinit(&mut self) {
        self.states = SecondaryMap::new();
        self.shifted.clear();
        for &id in self.graph.station_ids() {
            self.states.insert(id, StationState::default());
            if self.graph.station(id).is_some_and(|s| s.shift.is_some()) {
                self.shifted.push(id);
            }
        }
        self.entities.clear();
        self.queue.clear();
        self.notify.clear();
        self.rng = SimRng::new(self.settings.seed);
        self.now = SimTime::ZERO;
        self.kpi = tracker(&self.settings);
        self.warm_up_pending = self.settings.warm_up.is_some();

        let mut sources = 0;
        for &id in self.graph.station_ids() {
            if self.graph.station(id).is_some_and(|s| s.kind() == StationKind::Source) {
                self.queue.push(Event::arrival(SimTime::ZERO, id, None));
                sources += 1;
            }
        }
        self.refresh_breaks();
        self.recompute_stats();

        debug!(
            stations = self.graph.station_count(),
            edges = self.graph.edge_count(),
            sources,
            seed = self.settings.seed,
            "simulator initialized"
        );
    }

    // -----------------------------------------------------------------------
    // Stepping
    // -----------------------------------------------------------------------

    /// Advance the clock by `dt` seconds, applying every event due by then,
    /// and return the resulting snapshot. Negative, zero or non-finite `dt`
    /// applies nothing but still recomputes the statistics.
    pub fn update(&mut self, dt: f64) -> Snapshot {
        let step = match crate::fixed::secs(dt) {
            Some(d) if d > SimTime::ZERO => d,
            _ => {
                if dt != 0.0 {
                    trace!(dt, "ignoring non-advancing update");
                }
                SimTime::ZERO
            }
        };
        let target = self.now.saturating_add(step);
        self.run_until(target);
        self.recompute_stats();
        self.kpi.maybe_sample(self.now, &self.stats);
        self.snapshot()
    }

    /// Advance by `dt` repeatedly until the clock reaches `until` seconds.
    /// Returns the last snapshot.
    pub fn run_for(&mut self, until: f64, dt: f64) -> Snapshot {
        let mut snapshot = self.snapshot();
        if !(dt.is_finite() && dt > 0.0) {
            return snapshot;
        }
        while self.now_secs() + 1e-9 < until {
            snapshot = self.update(dt.min(until - self.now_secs()));
        }
        snapshot
    }

    fn run_until(&mut self, target: SimTime) {
        if self.warm_up_pending {
            if let Some(warm_up) = self.settings.warm_up.filter(|&w| w <= target) {
                self.drain(warm_up, false);
                self.advance_to(warm_up);
                self.apply_warm_up();
            }
        }
        self.drain(target, true);
        self.advance_to(target);
    }

    /// Apply events up to `limit` (inclusive or not), stopping at every
    /// break boundary on the way so breaks toggle at their exact instant.
    /// An event at a boundary sees the break already toggled.
    fn drain(&mut self, limit: SimTime, inclusive: bool) {
        let due = |t: SimTime| if inclusive { t <= limit } else { t < limit };
        loop {
            let event_at = self.queue.next_time().filter(|&t| due(t));
            let break_at = self.next_break_change().filter(|&t| due(t));
            match (event_at, break_at) {
                (Some(e), Some(b)) if b < e => self.advance_to(b),
                (Some(_), _) => {
                    let next = if inclusive {
                        self.queue.pop_due(limit)
                    } else {
                        self.queue.pop_before(limit)
                    };
                    let Some(event) = next else {
                        break;
                    };
                    self.advance_to(event.time);
                    self.dispatch(event);
                }
                (None, Some(b)) => self.advance_to(b),
                (None, None) => break,
            }
        }
    }

    /// Earliest break start or end after the current instant.
    fn next_break_change(&self) -> Option<SimTime> {
        self.shifted
            .iter()
            .filter_map(|&id| self.graph.station(id)?.shift.as_ref())
            .filter_map(|schedule| schedule.next_change(self.now))
            .min()
    }

    /// Move the clock forward, accruing time counters, then re-evaluate breaks.
    fn advance_to(&mut self, time: SimTime) {
        if time > self.now {
            let dt = time - self.now;
            for (id, state) in self.states.iter_mut() {
                let capacity = self.graph.station(id).map_or(1, |s| s.config.capacity());
                state.accrue(dt, capacity);
            }
            self.now = time;
        }
        self.refresh_breaks();
    }

    fn refresh_breaks(&mut self) {
        for i in 0..self.shifted.len() {
            let id = self.shifted[i];
            let on_break = self.graph.station(id).is_some_and(|s| s.is_on_break(self.now));
            let Some(state) = self.states.get_mut(id) else {
                continue;
            };
            if state.on_break == on_break {
                continue;
            }
            state.on_break = on_break;
            state.refresh_status();
            debug!(
                station = self.graph.name(id),
                on_break,
                time = to_f64(self.now),
                "shift break changed"
            );
            if !on_break {
                self.try_start(id);
            }
        }
        self.drain_notifications();
    }

    fn apply_warm_up(&mut self) {
        for state in self.states.values_mut() {
            state.reset_counters();
        }
        let wip = self.entities.len() as u64;
        self.kpi.reset(self.now, wip);
        self.warm_up_pending = false;
        info!(time = to_f64(self.now), wip, "warm-up complete, statistics reset");
    }

    // -----------------------------------------------------------------------
    // Event handlers
    // -----------------------------------------------------------------------

    fn dispatch(&mut self, event: Event) {
        trace!(
            time = to_f64(event.time),
            kind = ?event.kind,
            station = ?event.station,
            entity = ?event.entity,
            "dispatch"
        );
        if !self.graph.contains_station(event.station) {
            trace!(station = ?event.station, "dropping event for unknown station");
            return;
        }
        match (event.kind, event.entity) {
            (EventKind::Arrival, None) => self.generate(event.station),
            (EventKind::Arrival, Some(entity)) => self.deliver(event.station, entity),
            (EventKind::ProcessEnd, Some(entity)) => self.finish(event.station, entity),
            (EventKind::ProcessEnd, None) => {
                trace!(station = ?event.station, "dropping process end without entity");
            }
        }
        self.drain_notifications();
    }

    /// A Source tick: synthesize a batch and schedule the next tick.
    fn generate(&mut self, station: StationId) {
        let (interval, batch_size) = match self.graph.station(station).map(|s| &s.config) {
            Some(&StationConfig::Source {
                interval,
                batch_size,
            }) => (interval, batch_size),
            _ => {
                trace!(station = ?station, "dropping generation tick at non-source");
                return;
            }
        };
        for _ in 0..batch_size {
            let entity = self.entities.insert(Entity::new(self.now, station));
            if let Some(state) = self.states.get_mut(station) {
                state.queue.push_back(entity);
                state.counters.generated += 1;
                state.touched = true;
            }
        }
        self.kpi.record_generated(u64::from(batch_size));
        self.queue.push(Event::arrival(
            self.now.saturating_add(interval),
            station,
            None,
        ));
        self.try_start(station);
    }

    /// An entity reaches the end of its edge.
    fn deliver(&mut self, station: StationId, entity: EntityId) {
        let Some(ent) = self.entities.get_mut(entity) else {
            trace!(entity = ?entity, "dropping arrival of unknown entity");
            return;
        };
        if !matches!(ent.location, Location::Transit { to, .. } if to == station) {
            trace!(entity = ?entity, "dropping arrival of entity not bound here");
            return;
        }
        ent.location = Location::Station(station);
        ent.state = EntityState::Queued;
        ent.path.push(station);
        if let Some(state) = self.states.get_mut(station) {
            state.inbound = state.inbound.saturating_sub(1);
            state.queue.push_back(entity);
            state.touched = true;
            state.refresh_status();
        }
        self.try_start(station);
    }

    /// Service at `station` ends for `entity`.
    fn finish(&mut self, station: StationId, entity: EntityId) {
        let Some(state) = self.states.get(station) else {
            return;
        };
        if !state.in_service.contains(&entity) || !self.entities.contains_key(entity) {
            trace!(entity = ?entity, "dropping stale process end");
            return;
        }
        let already_blocked = state.blocked.is_some();

        let outcome = self.outcome(station, entity);
        match outcome {
            Outcome::Complete => {
                self.release_slot(station, entity);
                self.complete(station, entity);
                self.try_start(station);
                self.notify.push_back(station);
            }
            Outcome::Scrap => {
                self.release_slot(station, entity);
                self.scrap(station, entity);
                self.try_start(station);
                self.notify.push_back(station);
            }
            Outcome::Forward(route) if already_blocked => {
                // Keeps its service slot until the blocked one frees up.
                if let Some(state) = self.states.get_mut(station) {
                    state.awaiting.push_back(BlockedEntity { entity, route });
                }
            }
            Outcome::Forward(route) => match self.find_target(station, route) {
                Some(edge) => {
                    self.release_slot(station, entity);
                    self.depart(station, entity, edge);
                    self.try_start(station);
                    self.notify.push_back(station);
                }
                None => {
                    self.release_slot(station, entity);
                    self.block(station, BlockedEntity { entity, route });
                }
            },
        }
    }

    /// Decide the fate of a finished entity. Draws the defect roll at
    /// Quality stations that have somewhere to send good parts.
    fn outcome(&mut self, station: StationId, entity: EntityId) -> Outcome {
        let Some(spec) = self.graph.station(station) else {
            return Outcome::Complete;
        };
        let outputs = self.graph.outputs(station);
        if outputs.is_empty() || spec.kind() == StationKind::Shipping {
            return Outcome::Complete;
        }
        if spec.kind() != StationKind::Quality {
            return Outcome::Forward(Route::Any);
        }

        if !self.rng.chance(spec.config.defect_rate()) {
            return Outcome::Forward(Route::Primary);
        }
        let has_rework = outputs.len() > 1;
        if let Some(state) = self.states.get_mut(station) {
            state.counters.defects += 1;
        }
        if let Some(ent) = self.entities.get_mut(entity) {
            ent.classification = Classification::Defect;
        }
        if has_rework {
            Outcome::Forward(Route::Rework)
        } else {
            Outcome::Scrap
        }
    }

    // -----------------------------------------------------------------------
    // Flow primitives
    // -----------------------------------------------------------------------

    /// Start service for queued entities while slots are free.
    fn try_start(&mut self, station: StationId) {
        let Some(spec) = self.graph.station(station) else {
            return;
        };
        let capacity = spec.config.capacity() as usize;
        let service = ServiceTime::of(&spec.config, self.settings.pass_through);
        loop {
            let Some(state) = self.states.get_mut(station) else {
                return;
            };
            if state.blocked.is_some() || state.on_break || state.in_service.len() >= capacity {
                break;
            }
            let Some(entity) = state.queue.pop_front() else {
                break;
            };
            state.in_service.push(entity);
            let duration = service.draw(&mut self.rng);
            if let Some(ent) = self.entities.get_mut(entity) {
                ent.state = EntityState::Processing;
            }
            self.queue.push(Event::process_end(
                self.now.saturating_add(duration),
                station,
                entity,
            ));
            self.notify.push_back(station);
        }
        if let Some(state) = self.states.get_mut(station) {
            state.refresh_status();
        }
    }

    fn release_slot(&mut self, station: StationId, entity: EntityId) {
        if let Some(state) = self.states.get_mut(station) {
            if let Some(pos) = state.in_service.iter().position(|&e| e == entity) {
                state.in_service.swap_remove(pos);
            }
            state.refresh_status();
        }
    }

    /// First outgoing edge along `route` whose target has room.
    fn find_target(&self, station: StationId, route: Route) -> Option<EdgeId> {
        let outputs = self.graph.outputs(station);
        let candidates = match route {
            Route::Any => outputs,
            Route::Primary => outputs.get(..1).unwrap_or(&[]),
            Route::Rework => outputs.get(1..2).unwrap_or(&[]),
        };
        candidates
            .iter()
            .copied()
            .find(|&edge| self.graph.edge(edge).is_some_and(|e| self.has_room(e.to)))
    }

    /// Whether `station` can take one more entity. In-transit entities bound
    /// for it count as already there.
    fn has_room(&self, station: StationId) -> bool {
        let (Some(spec), Some(state)) = (self.graph.station(station), self.states.get(station))
        else {
            return false;
        };
        let capacity = spec.config.capacity() as usize;
        let inbound = state.inbound as usize;
        match spec.config {
            StationConfig::Inventory { .. } => state.occupancy() + inbound < capacity,
            _ => state.queue.len() + inbound < capacity + self.settings.staging_slack as usize,
        }
    }

    /// Send `entity` from `origin` along `edge`.
    fn depart(&mut self, origin: StationId, entity: EntityId, edge: EdgeId) {
        let Some(&EdgeData { from, to }) = self.graph.edge(edge) else {
            return;
        };
        let arrives_at = self.now.saturating_add(self.settings.transport_delay);
        if let Some(ent) = self.entities.get_mut(entity) {
            ent.location = Location::Transit {
                edge,
                from,
                to,
                departed_at: self.now,
                arrives_at,
            };
            ent.state = EntityState::Moving;
        }
        if let Some(state) = self.states.get_mut(origin) {
            state.counters.processed += 1;
            state.refresh_status();
        }
        if let Some(state) = self.states.get_mut(to) {
            state.inbound += 1;
        }
        self.queue.push(Event::arrival(arrives_at, to, Some(entity)));
    }

    fn block(&mut self, station: StationId, blocked: BlockedEntity) {
        if let Some(state) = self.states.get_mut(station) {
            state.blocked = Some(blocked);
            state.refresh_status();
        }
        debug!(
            station = self.graph.name(station),
            time = to_f64(self.now),
            route = ?blocked.route,
            "blocked, no downstream room"
        );
    }

    fn complete(&mut self, station: StationId, entity: EntityId) {
        let Some(mut ent) = self.entities.remove(entity) else {
            return;
        };
        ent.state = EntityState::Completed;
        ent.completed_at = Some(self.now);
        self.kpi.record_completion(CompletionRecord {
            entity,
            created_at: ent.created_at,
            completed_at: self.now,
            classification: ent.classification,
        });
        if let Some(state) = self.states.get_mut(station) {
            state.counters.processed += 1;
        }
    }

    fn scrap(&mut self, station: StationId, entity: EntityId) {
        if self.entities.remove(entity).is_none() {
            return;
        }
        self.kpi.record_scrapped();
        if let Some(state) = self.states.get_mut(station) {
            state.counters.scrapped += 1;
        }
    }

    // -----------------------------------------------------------------------
    // Unblock propagation
    // -----------------------------------------------------------------------

    fn drain_notifications(&mut self) {
        while let Some(changed) = self.notify.pop_front() {
            for i in 0..self.graph.upstream(changed).len() {
                let upstream = self.graph.upstream(changed)[i];
                if self.try_release(upstream) {
                    break;
                }
            }
        }
    }

    /// Forward the blocked entity at `station` if its route has room now.
    fn try_release(&mut self, station: StationId) -> bool {
        let Some(blocked) = self.states.get(station).and_then(|s| s.blocked) else {
            return false;
        };
        let Some(edge) = self.find_target(station, blocked.route) else {
            return false;
        };
        if let Some(state) = self.states.get_mut(station) {
            state.blocked = None;
        }
        debug!(
            station = self.graph.name(station),
            time = to_f64(self.now),
            "unblocked"
        );
        self.depart(station, blocked.entity, edge);
        self.promote_awaiting(station);
        self.try_start(station);
        true
    }

    /// Move entities that finished while the station was blocked out of
    /// their service slots, until one of them has to take the blocked slot.
    fn promote_awaiting(&mut self, station: StationId) {
        loop {
            let Some(next) = self
                .states
                .get_mut(station)
                .and_then(|s| s.awaiting.pop_front())
            else {
                break;
            };
            self.release_slot(station, next.entity);
            match self.find_target(station, next.route) {
                Some(edge) => self.depart(station, next.entity, edge),
                None => {
                    self.block(station, next);
                    break;
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Statistics and snapshots
    // -----------------------------------------------------------------------

    fn recompute_stats(&mut self) {
        let loads: Vec<StationLoad<'_>> = self
            .graph
            .stations()
            .filter_map(|(id, spec)| {
                let state = self.states.get(id)?;
                Some(StationLoad {
                    name: &spec.name,
                    workstation: spec.config.is_workstation(),
                    busy_time: state.counters.busy_time,
                    blocked_time: state.counters.blocked_time,
                })
            })
            .collect();
        let wip = self.entities.len() as u64;
        self.stats = self.kpi.compute(self.now, wip, &loads);
    }

    /// Snapshot of the current state without advancing time.
    pub fn snapshot(&self) -> Snapshot {
        let elapsed = self.kpi.elapsed(self.now);
        let stations = self
            .graph
            .stations()
            .filter_map(|(id, spec)| {
                let state = self.states.get(id)?;
                let c = &state.counters;
                Some((
                    spec.name.clone(),
                    StationSnapshot {
                        id: spec.name.clone(),
                        kind: spec.kind(),
                        status: state.status,
                        processed: c.processed,
                        generated: c.generated,
                        defects: c.defects,
                        scrapped: c.scrapped,
                        busy_time: to_f64(c.busy_time),
                        blocked_time: to_f64(c.blocked_time),
                        starved_time: to_f64(c.starved_time),
                        break_time: to_f64(c.break_time),
                        utilization: utilization(c.busy_time, elapsed),
                        queue_length: state.queue.len(),
                        in_service: state.in_service.len(),
                        blocked: state.blocked.is_some(),
                    },
                ))
            })
            .collect();

        let mut transit: Vec<TransitSnapshot> = self
            .entities
            .iter()
            .filter_map(|(id, ent)| match ent.location {
                Location::Transit {
                    from,
                    to,
                    departed_at,
                    arrives_at,
                    ..
                } => Some(TransitSnapshot {
                    entity: id,
                    from: self.graph.name(from).to_string(),
                    to: self.graph.name(to).to_string(),
                    departed_at: to_f64(departed_at),
                    arrives_at: to_f64(arrives_at),
                }),
                Location::Station(_) => None,
            })
            .collect();
        transit.sort_by(|a, b| a.departed_at.total_cmp(&b.departed_at));

        Snapshot {
            time: to_f64(self.now),
            stations,
            transit,
            stats: self.stats.clone(),
            history: self.kpi.history().cloned().collect(),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn now_secs(&self) -> f64 {
        to_f64(self.now)
    }

    pub fn graph(&self) -> &LineGraph {
        &self.graph
    }

    pub fn descriptor(&self) -> &LineDescriptor {
        &self.descriptor
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Runtime state of the station named `name`.
    pub fn station_state(&self, name: &str) -> Option<&StationState> {
        self.states.get(self.graph.station_id(name)?)
    }

    pub fn station_state_by_id(&self, id: StationId) -> Option<&StationState> {
        self.states.get(id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.entities.iter()
    }

    /// Entities currently in the line (the WIP).
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Statistics as of the last `update`.
    pub fn stats(&self) -> &GlobalStats {
        &self.stats
    }

    pub fn kpi(&self) -> &KpiTracker {
        &self.kpi
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub fn next_event_time(&self) -> Option<SimTime> {
        self.queue.next_time()
    }

    /// Whether the warm-up reset has happened (or none was configured).
    pub fn is_warmed_up(&self) -> bool {
        !self.warm_up_pending
    }

    /// Busy fraction of the station named `name` since the last reset.
    pub fn utilization_of(&self, name: &str) -> Option<Fixed64> {
        let state = self.station_state(name)?;
        let elapsed = Fixed64::from_num(self.kpi.elapsed(self.now));
        Some(state.counters.busy_time / elapsed)
    }
}

fn tracker(settings: &Settings) -> KpiTracker {
    KpiTracker::new(
        settings.window,
        settings.history_interval,
        settings.history_capacity,
        settings.lead_time_samples,
        settings.performance_reference,
    )
}
