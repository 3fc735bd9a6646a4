//! Level generation: curve profiles, uniform sources, and the row generator.

pub mod model;
pub mod profile;
pub mod rng;

mod generator;

pub use generator::{GenerateError, LevelGenerator};
pub use model::{DifficultyExample, LevelSpec, RowSpec};
pub use profile::CurveProfile;
pub use rng::{ChaChaSource, SequenceSource, UniformSource};

pub fn generate_level(
    seed: u64,
    level: u32,
    profile: CurveProfile,
) -> Result<LevelSpec, GenerateError> {
    LevelGenerator::from_seed(profile, seed).generate(level)
}
