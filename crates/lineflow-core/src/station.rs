//! Station configuration: the flat descriptor handed in by callers and the
//! validated, per-kind variant the simulator runs on.
//!
//! A [`StationDescriptor`] mirrors the record a persistence layer stores: every
//! field present for every kind. [`StationDescriptor::validate`] turns it into
//! a [`StationSpec`] whose [`StationConfig`] carries only the fields that are
//! meaningful for that kind, with times converted to [`SimTime`] and
//! percentages to fractions. Validation happens once, at initialization.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::fixed::{Fixed64, SimTime, percent_to_fraction, secs};

/// Smallest cycle time accepted. Zero or negative configured values are
/// floored to this.
pub const MIN_CYCLE_TIME: f64 = 0.1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while validating a line description.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("station id must not be empty")]
    EmptyStationId,
    #[error("duplicate station id '{0}'")]
    DuplicateStation(String),
    #[error("edge {from} -> {to} references unknown station '{missing}'")]
    UnknownStation {
        from: String,
        to: String,
        missing: String,
    },
    #[error("station '{station}' has invalid cycle time {value}")]
    InvalidCycleTime { station: String, value: f64 },
    #[error("invalid simulation setting '{name}': {value}")]
    InvalidSetting { name: &'static str, value: f64 },
}

// ---------------------------------------------------------------------------
// Descriptor (input record)
// ---------------------------------------------------------------------------

/// The kind of a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationKind {
    Source,
    Process,
    Quality,
    Inventory,
    Shipping,
}

/// A break inside a repeating shift, in minutes from the shift start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakWindow {
    pub start_minute: f64,
    pub duration_minutes: f64,
}

/// A repeating shift with scheduled breaks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftPattern {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Length of one shift cycle in minutes.
    pub shift_minutes: f64,
    #[serde(default)]
    pub breaks: Vec<BreakWindow>,
}

fn default_true() -> bool {
    true
}

fn default_one() -> u32 {
    1
}

fn default_cycle_time() -> f64 {
    1.0
}

/// One station as described by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationDescriptor {
    pub id: String,
    pub kind: StationKind,
    /// Nominal cycle time in seconds. For a Source this is the arrival
    /// interval; Inventory ignores it.
    #[serde(default = "default_cycle_time")]
    pub cycle_time: f64,
    #[serde(default)]
    pub variation_pct: f64,
    #[serde(default)]
    pub defect_rate_pct: f64,
    #[serde(default = "default_one")]
    pub batch_size: u32,
    #[serde(default = "default_one")]
    pub capacity: u32,
    #[serde(default)]
    pub shift: Option<ShiftPattern>,
}

impl StationDescriptor {
    /// A descriptor with defaults for everything but id, kind and cycle time.
    pub fn new(id: impl Into<String>, kind: StationKind, cycle_time: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            cycle_time,
            variation_pct: 0.0,
            defect_rate_pct: 0.0,
            batch_size: 1,
            capacity: 1,
            shift: None,
        }
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_variation(mut self, pct: f64) -> Self {
        self.variation_pct = pct;
        self
    }

    pub fn with_defect_rate(mut self, pct: f64) -> Self {
        self.defect_rate_pct = pct;
        self
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_shift(mut self, shift: ShiftPattern) -> Self {
        self.shift = Some(shift);
        self
    }

    /// Validate and convert into the per-kind configuration.
    pub fn validate(&self) -> Result<StationSpec, ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::EmptyStationId);
        }

        let config = match self.kind {
            StationKind::Source => StationConfig::Source {
                interval: self.cycle_time_checked()?,
                batch_size: self.floored("batch_size", self.batch_size),
            },
            StationKind::Process => StationConfig::Process {
                cycle: self.cycle()?,
                capacity: self.floored("capacity", self.capacity),
            },
            StationKind::Quality => StationConfig::Quality {
                cycle: self.cycle()?,
                capacity: self.floored("capacity", self.capacity),
                defect_rate: self.fraction("defect_rate_pct", self.defect_rate_pct),
            },
            StationKind::Inventory => StationConfig::Inventory {
                capacity: self.floored("capacity", self.capacity),
            },
            StationKind::Shipping => StationConfig::Shipping {
                cycle: self.cycle()?,
                capacity: self.floored("capacity", self.capacity),
            },
        };

        let shift = self.shift.as_ref().and_then(ShiftSchedule::from_pattern);

        Ok(StationSpec {
            name: self.id.clone(),
            config,
            shift,
        })
    }

    fn cycle(&self) -> Result<CycleTime, ConfigError> {
        Ok(CycleTime {
            nominal: self.cycle_time_checked()?,
            variation: self.fraction("variation_pct", self.variation_pct),
        })
    }

    fn cycle_time_checked(&self) -> Result<SimTime, ConfigError> {
        let invalid = || ConfigError::InvalidCycleTime {
            station: self.id.clone(),
            value: self.cycle_time,
        };
        if !self.cycle_time.is_finite() {
            return Err(invalid());
        }
        let value = if self.cycle_time < MIN_CYCLE_TIME {
            warn!(
                station = %self.id,
                value = self.cycle_time,
                floor = MIN_CYCLE_TIME,
                "cycle time below minimum, flooring"
            );
            MIN_CYCLE_TIME
        } else {
            self.cycle_time
        };
        secs(value).ok_or_else(invalid)
    }

    fn fraction(&self, field: &'static str, pct: f64) -> Fixed64 {
        if !(0.0..=100.0).contains(&pct) {
            warn!(station = %self.id, field, value = pct, "percentage out of range, clamping");
        }
        percent_to_fraction(pct)
    }

    fn floored(&self, field: &'static str, value: u32) -> u32 {
        if value == 0 {
            warn!(station = %self.id, field, "zero is not allowed, using 1");
            1
        } else {
            value
        }
    }
}

// ---------------------------------------------------------------------------
// Validated configuration
// ---------------------------------------------------------------------------

/// Nominal service time plus its uniform variation (fraction of nominal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleTime {
    pub nominal: SimTime,
    pub variation: Fixed64,
}

/// Per-kind station configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StationConfig {
    /// Emits `batch_size` new entities every `interval` and services the
    /// whole batch in parallel for the same interval before routing it
    /// onward. The interval is exact: `variation_pct` does not apply to
    /// Sources.
    Source { interval: SimTime, batch_size: u32 },
    Process { cycle: CycleTime, capacity: u32 },
    /// Inspection: finished entities are defective with probability
    /// `defect_rate` and leave through the rework edge or get scrapped.
    Quality {
        cycle: CycleTime,
        capacity: u32,
        defect_rate: Fixed64,
    },
    /// Passive storage. `capacity` bounds queue + in-service.
    Inventory { capacity: u32 },
    Shipping { cycle: CycleTime, capacity: u32 },
}

impl StationConfig {
    pub fn kind(&self) -> StationKind {
        match self {
            StationConfig::Source { .. } => StationKind::Source,
            StationConfig::Process { .. } => StationKind::Process,
            StationConfig::Quality { .. } => StationKind::Quality,
            StationConfig::Inventory { .. } => StationKind::Inventory,
            StationConfig::Shipping { .. } => StationKind::Shipping,
        }
    }

    /// Parallel service slots (storage slots for Inventory). A Source has
    /// one slot per entity of its batch.
    pub fn capacity(&self) -> u32 {
        match self {
            StationConfig::Source { batch_size, .. } => *batch_size,
            StationConfig::Process { capacity, .. }
            | StationConfig::Quality { capacity, .. }
            | StationConfig::Inventory { capacity }
            | StationConfig::Shipping { capacity, .. } => *capacity,
        }
    }

    /// Nominal cycle time, if the kind has one.
    pub fn nominal_cycle(&self) -> Option<SimTime> {
        match self {
            StationConfig::Source { interval, .. } => Some(*interval),
            StationConfig::Process { cycle, .. }
            | StationConfig::Quality { cycle, .. }
            | StationConfig::Shipping { cycle, .. } => Some(cycle.nominal),
            StationConfig::Inventory { .. } => None,
        }
    }

    /// Defect probability as a fraction. Zero for everything but Quality.
    pub fn defect_rate(&self) -> Fixed64 {
        match self {
            StationConfig::Quality { defect_rate, .. } => *defect_rate,
            _ => Fixed64::ZERO,
        }
    }

    /// Whether this station counts toward bottleneck selection.
    pub fn is_workstation(&self) -> bool {
        matches!(
            self,
            StationConfig::Process { .. } | StationConfig::Quality { .. }
        )
    }
}

/// A validated station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationSpec {
    /// The caller's station id.
    pub name: String,
    pub config: StationConfig,
    pub shift: Option<ShiftSchedule>,
}

impl StationSpec {
    pub fn kind(&self) -> StationKind {
        self.config.kind()
    }

    pub fn is_on_break(&self, now: SimTime) -> bool {
        self.shift.as_ref().is_some_and(|s| s.is_on_break(now))
    }
}

// ---------------------------------------------------------------------------
// Shift schedule
// ---------------------------------------------------------------------------

/// Shortest shift cycle a schedule accepts, in seconds.
pub const MIN_SHIFT_SECONDS: f64 = 1.0;

/// A [`ShiftPattern`] converted to fixed-point seconds. Only built for
/// enabled patterns at least [`MIN_SHIFT_SECONDS`] long.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftSchedule {
    shift: SimTime,
    /// `(start, end)` in seconds from shift start, end exclusive.
    windows: Vec<(SimTime, SimTime)>,
}

impl ShiftSchedule {
    /// Returns `None` when the pattern is disabled or too short to use.
    /// Windows with non-finite or non-positive durations are dropped.
    pub fn from_pattern(pattern: &ShiftPattern) -> Option<Self> {
        if !pattern.enabled {
            return None;
        }
        let shift = secs(pattern.shift_minutes * 60.0)
            .filter(|&s| s >= SimTime::from_num(MIN_SHIFT_SECONDS));
        let Some(shift) = shift else {
            warn!(
                shift_minutes = pattern.shift_minutes,
                "shift pattern has no usable length, ignoring"
            );
            return None;
        };
        let windows = pattern
            .breaks
            .iter()
            .filter(|b| {
                b.start_minute.is_finite()
                    && b.duration_minutes.is_finite()
                    && b.start_minute >= 0.0
                    && b.duration_minutes > 0.0
            })
            .filter_map(|b| {
                let start = secs(b.start_minute * 60.0)?;
                let end = secs((b.start_minute + b.duration_minutes) * 60.0)?;
                Some((start, end))
            })
            .collect();
        Some(Self { shift, windows })
    }

    /// Position within the current shift, in minutes.
    pub fn position(&self, now: SimTime) -> Fixed64 {
        (now % self.shift) / Fixed64::from_num(60)
    }

    pub fn is_on_break(&self, now: SimTime) -> bool {
        let pos = now % self.shift;
        self.windows
            .iter()
            .any(|&(start, end)| pos >= start && pos < end)
    }

    /// The first instant after `now` at which a break may start or end.
    /// `None` when the schedule has no breaks.
    pub fn next_change(&self, now: SimTime) -> Option<SimTime> {
        if self.windows.is_empty() {
            return None;
        }
        let pos = now % self.shift;
        let next = self
            .windows
            .iter()
            .flat_map(|&(start, end)| [start, end])
            .chain(std::iter::once(self.shift))
            .filter(|&b| b > pos && b <= self.shift)
            .min()?;
        (now - pos).checked_add(next)
    }
}
