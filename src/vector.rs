//! Deterministic dense input vectors

use rand::distributions::{Distribution, Standard};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::constants::DEFAULT_VECTOR_SEED;

/// Seeded generator of dense vectors with entries uniform in `[0, 1)`
///
/// ChaCha8 output is fully specified, so the same seed yields the same
/// vector on every platform and every run.
pub struct VectorGenerator {
    rng: ChaCha8Rng,
}

impl VectorGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Draws the next `len` values
    pub fn generate<T>(&mut self, len: usize) -> Vec<T>
    where
        Standard: Distribution<T>,
    {
        (0..len).map(|_| self.rng.gen()).collect()
    }
}

impl Default for VectorGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_VECTOR_SEED)
    }
}

/// Generates a vector of `len` values in `[0, 1)` from a fresh generator
pub fn generate_vector<T>(len: usize, seed: u64) -> Vec<T>
where
    Standard: Distribution<T>,
{
    VectorGenerator::new(seed).generate(len)
}
