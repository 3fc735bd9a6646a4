//! Campaign session state machine built on top of the level generator.

use std::fmt;
use std::time::Duration;

use crate::levelgen::{
    ChaChaSource, CurveProfile, DifficultyExample, LevelGenerator, LevelSpec, UniformSource,
};
use crate::stats::{GameSummary, LevelResult};

/// Wrong clicks allowed within a single level before the game ends.
pub const MAX_STRIKES: u8 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    InLevel { level: u32 },
    Won,
    Lost,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SolveOutcome {
    /// The row was correct but the level still has unsolved rows.
    RowSolved { rows_remaining: usize },
    /// The level is cleared and the next one is ready.
    Advanced { level: u32, spec: LevelSpec },
    /// The final level is cleared.
    Won(GameSummary),
}

#[derive(Clone, Debug, PartialEq)]
pub enum MissOutcome {
    Strike { strikes_used: u8 },
    GameOver(GameSummary),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionError {
    /// The session already reached a terminal phase.
    Finished,
    RowOutOfRange { row: usize, rows: usize },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finished => write!(f, "the session already ended"),
            Self::RowOutOfRange { row, rows } => {
                write!(f, "row {row} does not exist; the level has {rows} rows")
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// One player's campaign from level 1 to the profile's final level.
pub struct GameSession<S> {
    generator: LevelGenerator<S>,
    phase: SessionPhase,
    spec: LevelSpec,
    solved: Vec<bool>,
    strikes_used: u8,
    history: Vec<LevelResult>,
    smallest_difference: Option<u8>,
    smallest_difference_example: Option<DifficultyExample>,
}

impl GameSession<ChaChaSource> {
    pub fn from_seed(seed: u64, profile: CurveProfile) -> Self {
        Self::new(LevelGenerator::from_seed(profile, seed))
    }
}

impl<S: UniformSource> GameSession<S> {
    pub fn new(mut generator: LevelGenerator<S>) -> Self {
        let spec = generator.build(1);
        let solved = vec![false; spec.rows];
        Self {
            generator,
            phase: SessionPhase::InLevel { level: 1 },
            spec,
            solved,
            strikes_used: 0,
            history: Vec::new(),
            smallest_difference: None,
            smallest_difference_example: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn level(&self) -> Option<u32> {
        match self.phase {
            SessionPhase::InLevel { level } => Some(level),
            SessionPhase::Won | SessionPhase::Lost => None,
        }
    }

    pub fn strikes_used(&self) -> u8 {
        self.strikes_used
    }

    pub fn current_spec(&self) -> &LevelSpec {
        &self.spec
    }

    pub fn rows_remaining(&self) -> usize {
        self.solved.iter().filter(|solved| !**solved).count()
    }

    pub fn history(&self) -> &[LevelResult] {
        &self.history
    }

    pub fn max_level(&self) -> u32 {
        self.generator.profile().max_level
    }

    /// Reports a correctly spotted odd tile in `row`.
    ///
    /// `level_elapsed` is the wall-clock time spent on the current level so
    /// far; it is only recorded when this call completes the level.
    pub fn solve_row(
        &mut self,
        row: usize,
        level_elapsed: Duration,
    ) -> Result<SolveOutcome, SessionError> {
        let level = self.live_level()?;
        if row >= self.solved.len() {
            return Err(SessionError::RowOutOfRange {
                row,
                rows: self.solved.len(),
            });
        }
        if self.solved[row] {
            // Duplicate submission; the client may retry freely.
            return Ok(SolveOutcome::RowSolved {
                rows_remaining: self.rows_remaining(),
            });
        }

        self.solved[row] = true;
        let rows_remaining = self.rows_remaining();
        if rows_remaining > 0 {
            return Ok(SolveOutcome::RowSolved { rows_remaining });
        }

        self.record_level(level, level_elapsed, false);
        if self.generator.profile().max_level <= level {
            self.phase = SessionPhase::Won;
            return Ok(SolveOutcome::Won(self.summary(true, level)));
        }

        let next = level + 1;
        self.spec = self.generator.build(next);
        self.solved = vec![false; self.spec.rows];
        self.strikes_used = 0;
        self.phase = SessionPhase::InLevel { level: next };
        Ok(SolveOutcome::Advanced {
            level: next,
            spec: self.spec.clone(),
        })
    }

    /// Reports a wrong tile click anywhere in the current level.
    pub fn miss_row(&mut self, level_elapsed: Duration) -> Result<MissOutcome, SessionError> {
        let level = self.live_level()?;
        self.strikes_used += 1;
        if self.strikes_used < MAX_STRIKES {
            return Ok(MissOutcome::Strike {
                strikes_used: self.strikes_used,
            });
        }

        self.record_level(level, level_elapsed, true);
        self.phase = SessionPhase::Lost;
        Ok(MissOutcome::GameOver(self.summary(false, level - 1)))
    }

    fn live_level(&self) -> Result<u32, SessionError> {
        match self.phase {
            SessionPhase::InLevel { level } => Ok(level),
            SessionPhase::Won | SessionPhase::Lost => Err(SessionError::Finished),
        }
    }

    fn record_level(&mut self, level: u32, elapsed: Duration, failed: bool) {
        self.history.push(LevelResult {
            level,
            time_seconds: elapsed.as_secs(),
            strikes: self.strikes_used,
            average_color_difference: self.spec.average_color_difference,
            failed,
        });

        // Strict comparison so ties keep the example from the earliest level.
        let candidate = self.spec.smallest_row_difference;
        if self
            .smallest_difference
            .is_none_or(|smallest| candidate < smallest)
        {
            self.smallest_difference = Some(candidate);
            self.smallest_difference_example = Some(self.spec.difficulty_example.clone());
        }
    }

    fn summary(&self, won: bool, levels_completed: u32) -> GameSummary {
        GameSummary {
            won,
            levels_completed,
            level_stats: self.history.clone(),
            smallest_difference: self.smallest_difference,
            smallest_difference_example: self.smallest_difference_example.clone(),
        }
    }
}
