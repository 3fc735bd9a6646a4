//! Uniform random sources feeding level generation.

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::{Rng, SeedableRng};

/// Doubles drawn uniformly from `[0, 1)`.
///
/// The generator consumes draws in a documented order, so implementations
/// must hand them out one at a time, in sequence.
pub trait UniformSource {
    fn next_f64(&mut self) -> f64;
}

/// Seeded ChaCha8 stream, the production source.
pub struct ChaChaSource {
    rng: ChaCha8Rng,
}

impl ChaChaSource {
    pub fn from_seed(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed) }
    }
}

impl UniformSource for ChaChaSource {
    fn next_f64(&mut self) -> f64 {
        // 53 mantissa bits give every representable double in [0, 1) equal weight.
        let mantissa = self.rng.next_u64() >> 11;
        mantissa as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

/// Replays a fixed script of draws, panicking once the script runs dry so a
/// test that budgets too few values fails loudly.
pub struct SequenceSource {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceSource {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self { values: values.into(), cursor: 0 }
    }

    /// Draws consumed so far.
    pub fn taken(&self) -> usize {
        self.cursor
    }
}

impl UniformSource for SequenceSource {
    fn next_f64(&mut self) -> f64 {
        let Some(value) = self.values.get(self.cursor).copied() else {
            panic!("scripted source exhausted after {} draws", self.cursor);
        };
        self.cursor += 1;
        value
    }
}
