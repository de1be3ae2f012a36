//! Engine settings.
//!
//! [`SimConfig`] is the serde-facing record (seconds as `f64`, every field
//! defaulted). The simulator converts it once into [`Settings`] with
//! fixed-point times.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::fixed::{SimTime, secs};
use crate::station::ConfigError;

/// Shortest Inventory pass-through, in seconds.
pub const MIN_PASS_THROUGH: f64 = 0.01;

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for cycle-time variation and defect draws.
    pub seed: u64,
    /// Statistics are reset once when the clock first reaches this many
    /// seconds. Zero disables the reset.
    pub warm_up: f64,
    /// Travel time on every edge, in seconds.
    pub transport_delay: f64,
    /// Service time of Inventory stations, in seconds.
    pub inventory_pass_through: f64,
    /// Extra queue slots beyond capacity at Process, Quality, Shipping and
    /// Source targets.
    pub staging_slack: u32,
    /// Trailing window for the windowed throughput, in seconds.
    pub throughput_window: f64,
    /// Minimum simulated time between history samples, in seconds.
    pub history_interval: f64,
    pub history_capacity: usize,
    /// Number of recent good completions averaged into the lead time.
    pub lead_time_samples: usize,
    /// Units per hour per station at which the performance factor reaches 100.
    pub performance_reference_per_hour: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED_u64,
            warm_up: 0.0,
            transport_delay: 1.0,
            inventory_pass_through: 0.1,
            staging_slack: 5,
            throughput_window: 60.0,
            history_interval: 5.0,
            history_capacity: 200,
            lead_time_samples: 100,
            performance_reference_per_hour: 60.0,
        }
    }
}

impl SimConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_warm_up(mut self, seconds: f64) -> Self {
        self.warm_up = seconds;
        self
    }

    pub fn with_transport_delay(mut self, seconds: f64) -> Self {
        self.transport_delay = seconds;
        self
    }

    /// Validate and convert to fixed-point settings.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let warm_up = non_negative("warm_up", self.warm_up)?;
        let window = positive("throughput_window", self.throughput_window)?;
        let history_interval = positive("history_interval", self.history_interval)?;
        if !self.performance_reference_per_hour.is_finite()
            || self.performance_reference_per_hour <= 0.0
        {
            return Err(ConfigError::InvalidSetting {
                name: "performance_reference_per_hour",
                value: self.performance_reference_per_hour,
            });
        }

        Ok(Settings {
            seed: self.seed,
            warm_up: (warm_up > SimTime::ZERO).then_some(warm_up),
            transport_delay: non_negative("transport_delay", self.transport_delay)?,
            pass_through: pass_through(self.inventory_pass_through)?,
            staging_slack: self.staging_slack,
            window,
            history_interval,
            history_capacity: floor_one("history_capacity", self.history_capacity),
            lead_time_samples: floor_one("lead_time_samples", self.lead_time_samples),
            performance_reference: self.performance_reference_per_hour,
        })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<SimTime, ConfigError> {
    match secs(value) {
        Some(t) if t >= SimTime::ZERO => Ok(t),
        _ => Err(ConfigError::InvalidSetting { name, value }),
    }
}

/// Inventory service time is floored here so a loop of Inventory stations
/// with no transport delay still advances the clock.
fn pass_through(value: f64) -> Result<SimTime, ConfigError> {
    let t = non_negative("inventory_pass_through", value)?;
    let floor = SimTime::from_num(MIN_PASS_THROUGH);
    if t < floor {
        warn!(value, floor = MIN_PASS_THROUGH, "inventory pass-through below minimum, flooring");
        return Ok(floor);
    }
    Ok(t)
}

fn positive(name: &'static str, value: f64) -> Result<SimTime, ConfigError> {
    match secs(value) {
        Some(t) if t > SimTime::ZERO => Ok(t),
        _ => Err(ConfigError::InvalidSetting { name, value }),
    }
}

fn floor_one(name: &'static str, value: usize) -> usize {
    if value == 0 {
        warn!(setting = name, "zero is not allowed, using 1");
        1
    } else {
        value
    }
}

/// Validated engine settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub seed: u64,
    pub warm_up: Option<SimTime>,
    pub transport_delay: SimTime,
    pub pass_through: SimTime,
    pub staging_slack: u32,
    pub window: SimTime,
    pub history_interval: SimTime,
    pub history_capacity: usize,
    pub lead_time_samples: usize,
    pub performance_reference: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let s = SimConfig::default().settings().unwrap();
        assert_eq!(s.warm_up, None);
        assert_eq!(s.transport_delay, secs(1.0).unwrap());
        assert_eq!(s.staging_slack, 5);
        assert_eq!(s.window, secs(60.0).unwrap());
        assert_eq!(s.history_interval, secs(5.0).unwrap());
        assert_eq!(s.history_capacity, 200);
        assert_eq!(s.lead_time_samples, 100);
    }

    #[test]
    fn zero_pass_through_is_floored() {
        let config = SimConfig {
            inventory_pass_through: 0.0,
            transport_delay: 0.0,
            ..SimConfig::default()
        };
        let s = config.settings().unwrap();
        assert_eq!(s.pass_through, SimTime::from_num(MIN_PASS_THROUGH));
        assert_eq!(s.transport_delay, SimTime::ZERO);
    }

    #[test]
    fn warm_up_becomes_some_when_positive() {
        let s = SimConfig::default().with_warm_up(30.0).settings().unwrap();
        assert_eq!(s.warm_up, secs(30.0));
    }

    #[test]
    fn negative_or_nan_settings_are_rejected() {
        let err = SimConfig::default().with_transport_delay(-1.0).settings();
        assert!(matches!(
            err,
            Err(ConfigError::InvalidSetting {
                name: "transport_delay",
                ..
            })
        ));
        let err = SimConfig::default().with_warm_up(f64::NAN).settings();
        assert!(matches!(
            err,
            Err(ConfigError::InvalidSetting { name: "warm_up", .. })
        ));
        let cfg = SimConfig {
            history_interval: 0.0,
            ..Default::default()
        };
        assert!(cfg.settings().is_err());
    }

    #[test]
    fn zero_capacities_are_floored() {
        let cfg = SimConfig {
            history_capacity: 0,
            lead_time_samples: 0,
            ..Default::default()
        };
        let s = cfg.settings().unwrap();
        assert_eq!(s.history_capacity, 1);
        assert_eq!(s.lead_time_samples, 1);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let cfg: SimConfig = serde_json::from_str(r#"{"warm_up": 120.0, "seed": 9}"#).unwrap();
        assert_eq!(cfg.warm_up, 120.0);
        assert_eq!(cfg.seed, 9);
        assert_eq!(cfg.staging_slack, 5);
    }
}
