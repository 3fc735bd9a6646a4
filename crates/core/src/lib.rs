pub mod color;
pub mod endless;
pub mod levelgen;
pub mod session;
pub mod stats;

pub use color::ColorSample;
pub use endless::{EndlessOutcome, EndlessSession, PresentationMode};
pub use levelgen::{
    ChaChaSource, CurveProfile, DifficultyExample, GenerateError, LevelGenerator, LevelSpec,
    RowSpec, SequenceSource, UniformSource,
};
pub use session::{GameSession, MAX_STRIKES, MissOutcome, SessionError, SessionPhase, SolveOutcome};
pub use stats::{GameSummary, LevelResult};
