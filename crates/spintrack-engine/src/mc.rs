//! Seeded random-number generator for particle tracking.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use spintrack_core::{McGenerator, ParticleNumber};

/// [`McGenerator`] backed by ChaCha8.
///
/// Seeded from `seed XOR particle_number`, so every particle owns an
/// independent, reproducible stream no matter which worker runs it or
/// in what order.
#[derive(Clone, Debug)]
pub struct ChaChaGenerator {
    rng: ChaCha8Rng,
}

impl ChaChaGenerator {
    /// Stream for one particle of a run.
    pub fn for_particle(seed: u64, particle: ParticleNumber) -> Self {
        Self::from_seed(seed ^ particle.0)
    }

    /// Stream from a raw seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl McGenerator for ChaChaGenerator {
    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.rng.random::<f64>()
    }
}
