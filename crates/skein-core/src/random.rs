//! Deterministic random source.
//!
//! Every random decision in a session flows through a `RandomSource` seeded
//! from the session configuration. Two sources built from the same seed
//! produce the same value sequence, which is what makes explored schedules
//! reproducible.
//!
//! # Invariants
//!
//! - Determinism: the same seed yields the same sequence of values
//! - Isolation: sources are never shared across schedulers

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded pseudo-random value generator.
#[derive(Debug)]
pub struct RandomSource {
    seed: u64,
    rng: StdRng,
}

impl RandomSource {
    /// Create a source from an explicit seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The seed this source was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Next value in `[0, bound)`. Returns 0 when `bound` is 0.
    pub fn next(&mut self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        self.rng.gen_range(0..bound)
    }

    /// Next value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Next uniformly distributed boolean.
    pub fn next_bool(&mut self) -> bool {
        self.rng.gen::<bool>()
    }

    /// Next full-width unsigned value.
    pub fn next_u64(&mut self) -> u64 {
        self.rng.gen::<u64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = RandomSource::new(42);
        let mut b = RandomSource::new(42);
        for _ in 0..64 {
            assert_eq!(a.next(1000), b.next(1000));
        }
        assert_eq!(a.next_bool(), b.next_bool());
        assert_eq!(a.next_f64(), b.next_f64());
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = RandomSource::new(1);
        let mut b = RandomSource::new(2);
        let left: Vec<u64> = (0..32).map(|_| a.next(u64::MAX)).collect();
        let right: Vec<u64> = (0..32).map(|_| b.next(u64::MAX)).collect();
        assert_ne!(left, right);
    }

    #[test]
    fn next_respects_bound() {
        let mut source = RandomSource::new(7);
        for bound in [1u64, 2, 3, 17, 1000] {
            for _ in 0..100 {
                assert!(source.next(bound) < bound);
            }
        }
        assert_eq!(source.next(0), 0);
    }

    #[test]
    fn next_f64_in_unit_interval() {
        let mut source = RandomSource::new(9);
        for _ in 0..100 {
            let value = source.next_f64();
            assert!((0.0..1.0).contains(&value));
        }
    }
}
