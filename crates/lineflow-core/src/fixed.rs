use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Simulated time in seconds. Fixed-point so that event ordering is total and
/// identical across platforms.
pub type SimTime = Fixed64;

/// Convert seconds to [`SimTime`]. Non-finite input maps to `None`.
///
/// Use at the API boundary only (configuration, `update(dt)`), never inside
/// the event loop.
#[inline]
pub fn secs(v: f64) -> Option<SimTime> {
    if !v.is_finite() {
        return None;
    }
    SimTime::checked_from_num(v)
}

/// Convert [`SimTime`] (or any `Fixed64`) to `f64`. Use only for reporting.
#[inline]
pub fn to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Convert a percentage in `[0, 100]` to a `Fixed64` fraction in `[0, 1]`.
/// Out-of-range input is clamped; NaN maps to zero.
#[inline]
pub fn percent_to_fraction(pct: f64) -> Fixed64 {
    if pct.is_nan() {
        return Fixed64::ZERO;
    }
    Fixed64::from_num(pct.clamp(0.0, 100.0) / 100.0)
}

/// Checked multiplication for Fixed64 that returns None on overflow.
#[inline]
pub fn checked_mul_64(a: Fixed64, b: Fixed64) -> Option<Fixed64> {
    a.checked_mul(b)
}
