//! Lineflow Core -- a discrete-event simulator for manufacturing lines.
//!
//! This crate provides the line topology, station configuration, the event
//! queue, the simulator with push-based backpressure, KPI aggregation and
//! read-only snapshots. It performs no I/O; an external driver steps it.
//!
//! # Stepping
//!
//! Each call to [`engine::Simulator::update`] advances the simulated clock
//! by `dt` seconds:
//!
//! 1. **Drain** -- pop every event due by the target time, in `(time, seq)`
//!    order, accruing station time counters between events.
//! 2. **Apply** -- generate, deliver, or finish entities; route, block or
//!    complete them; propagate unblock notifications upstream.
//! 3. **Aggregate** -- recompute throughput, WIP, lead time, OEE and the
//!    bottleneck, and sample the history series.
//! 4. **Snapshot** -- return an owned [`query::Snapshot`] for rendering or
//!    export.
//!
//! ```rust,ignore
//! let line = LineDescriptor::new()
//!     .station(StationDescriptor::new("in", StationKind::Source, 5.0))
//!     .station(StationDescriptor::new("press", StationKind::Process, 4.0))
//!     .station(StationDescriptor::new("out", StationKind::Shipping, 1.0))
//!     .edge("in", "press")
//!     .edge("press", "out");
//! let mut sim = Simulator::new(line, SimConfig::default())?;
//! let snapshot = sim.update(0.5);
//! ```
//!
//! # Key Types
//!
//! - [`engine::Simulator`] -- Owns all state and runs the event loop.
//! - [`topology::LineGraph`] -- Stations and routing edges with forward and
//!   reverse indices.
//! - [`station::StationConfig`] -- Five station kinds: Source, Process,
//!   Quality, Inventory and Shipping.
//! - [`event::EventQueue`] -- Min-heap of timed events with FIFO tie-break.
//! - [`kpi::KpiTracker`] -- Throughput, lead time, OEE and history.
//! - [`fixed::SimTime`] -- Q32.32 fixed-point seconds for deterministic time.

pub mod advisory;
pub mod config;
pub mod engine;
pub mod entity;
pub mod event;
pub mod fixed;
pub mod id;
pub mod kpi;
pub mod query;
pub mod rng;
pub mod state;
pub mod station;
pub mod topology;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
