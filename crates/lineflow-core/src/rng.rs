//! Deterministic PRNG for cycle-time variation and defect draws.
//!
//! Uses the SplitMix64 algorithm: fast, 8 bytes of state, and every draw is
//! produced in fixed-point so a seeded run replays identically everywhere.

use crate::fixed::Fixed64;

/// SplitMix64 pseudo-random number generator.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    /// Create a new RNG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform value in `[0, 1)`.
    ///
    /// The upper 32 bits of the next output become the fractional bits of a
    /// Q32.32 value with a zero integer part.
    pub fn unit(&mut self) -> Fixed64 {
        let upper = self.next_u64() >> 32;
        Fixed64::from_bits(upper as i64)
    }

    /// Returns `true` with the given probability (a fraction in [0, 1]).
    ///
    /// - probability <= 0 always returns false
    /// - probability >= 1 always returns true
    pub fn chance(&mut self, probability: Fixed64) -> bool {
        if probability <= Fixed64::ZERO {
            return false;
        }
        if probability >= Fixed64::ONE {
            return true;
        }
        self.unit() < probability
    }

    /// Multiplier drawn uniformly from `[1 - variation, 1 + variation]`.
    ///
    /// A variation of zero (or less) returns exactly one without consuming a
    /// draw, so lines without variation never advance the generator.
    pub fn spread(&mut self, variation: Fixed64) -> Fixed64 {
        if variation <= Fixed64::ZERO {
            return Fixed64::ONE;
        }
        let u = self.unit();
        Fixed64::ONE - variation + variation * Fixed64::from_num(2) * u
    }

    /// Get the internal state.
    pub fn state(&self) -> u64 {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let mut a = SimRng::new(42);
        let mut b = SimRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_differ() {
        let mut a = SimRng::new(1);
        let mut b = SimRng::new(2);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn unit_stays_in_range() {
        let mut rng = SimRng::new(7);
        for _ in 0..1_000 {
            let u = rng.unit();
            assert!(u >= Fixed64::ZERO && u < Fixed64::ONE, "out of range: {u}");
        }
    }

    #[test]
    fn chance_zero_always_false() {
        let mut rng = SimRng::new(999);
        for _ in 0..100 {
            assert!(!rng.chance(Fixed64::ZERO));
        }
    }

    #[test]
    fn chance_one_always_true() {
        let mut rng = SimRng::new(999);
        for _ in 0..100 {
            assert!(rng.chance(Fixed64::ONE));
        }
    }

    #[test]
    fn chance_half_roughly_balanced() {
        let mut rng = SimRng::new(12345);
        let trials = 10_000;
        let mut hits = 0u32;
        let half = Fixed64::from_num(0.5);
        for _ in 0..trials {
            if rng.chance(half) {
                hits += 1;
            }
        }
        assert!((4000..=6000).contains(&hits), "expected ~5000, got {hits}");
    }

    #[test]
    fn spread_without_variation_is_exact_and_free() {
        let mut rng = SimRng::new(3);
        let before = rng.state();
        assert_eq!(rng.spread(Fixed64::ZERO), Fixed64::ONE);
        assert_eq!(rng.state(), before);
    }

    #[test]
    fn spread_stays_within_band() {
        let mut rng = SimRng::new(11);
        let v = Fixed64::from_num(0.2);
        let lo = Fixed64::from_num(0.799);
        let hi = Fixed64::from_num(1.201);
        for _ in 0..1_000 {
            let m = rng.spread(v);
            assert!(m >= lo && m <= hi, "multiplier {m} outside band");
        }
    }

    #[test]
    fn serialization_round_trip() {
        let mut rng = SimRng::new(42);
        for _ in 0..50 {
            rng.next_u64();
        }

        let json = serde_json::to_string(&rng).unwrap();
        let restored: SimRng = serde_json::from_str(&json).unwrap();
        assert_eq!(rng, restored);

        let mut rng2 = restored;
        for _ in 0..10 {
            assert_eq!(rng.next_u64(), rng2.next_u64());
        }
    }
}
