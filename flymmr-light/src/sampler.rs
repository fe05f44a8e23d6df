//! Seeded weighted sampler.
//!
//! Draws relative-weight fractions `x = 1 - w^y` with `y` uniform on
//! `[0, 1)`. The density of `x` grows towards 1, so samples concentrate on
//! the most recent (heaviest) part of the chain while never landing in the
//! always-checked tail of relative weight `w`.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Reproducible source of relative-weight fractions.
#[derive(Debug, Clone)]
pub struct WeightSampler {
    rng: ChaCha20Rng,
    weight_fraction: f64,
}

impl WeightSampler {
    /// Create a sampler for tail fraction `w`, seeded from `seed`.
    pub fn new(seed: u64, weight_fraction: f64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            weight_fraction,
        }
    }

    /// The tail fraction `w`.
    pub fn weight_fraction(&self) -> f64 {
        self.weight_fraction
    }

    /// Draw the next fraction in `[0, 1 - w]`.
    pub fn next_fraction(&mut self) -> f64 {
        let y: f64 = self.rng.gen();
        1.0 - self.weight_fraction.powf(y)
    }
}

impl Iterator for WeightSampler {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        Some(self.next_fraction())
    }
}
