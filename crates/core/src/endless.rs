//! Endless mode: back-to-back rounds pinned to a late-campaign difficulty band.

use serde::{Deserialize, Serialize};

use crate::levelgen::{ChaChaSource, CurveProfile, LevelGenerator, LevelSpec, UniformSource};
use crate::session::{MAX_STRIKES, SessionError};

const BAND_LOW_LEVEL: u32 = 8;
const BAND_HIGH_LEVEL: u32 = 9;

/// How a round's rows move on screen. Cosmetic: difficulty never reads it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PresentationMode {
    Scrolling,
    Bouncing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndlessOutcome {
    RowSolved { rows_remaining: usize },
    RoundCleared { round: u32 },
    Strike { strikes: u8 },
    GameOver { rounds_completed: u32 },
    /// The clicked row was already solved; nothing changes.
    Ignored,
}

/// An open-ended run of rounds; three strikes at any point end it.
pub struct EndlessSession<S> {
    generator: LevelGenerator<S>,
    round: u32,
    effective_level: u32,
    mode: PresentationMode,
    spec: LevelSpec,
    solved: Vec<bool>,
    strikes: u8,
    rounds_completed: u32,
    over: bool,
}

impl EndlessSession<ChaChaSource> {
    pub fn from_seed(seed: u64) -> Self {
        Self::new(ChaChaSource::from_seed(seed))
    }
}

impl<S: UniformSource> EndlessSession<S> {
    pub fn new(source: S) -> Self {
        let mut generator = LevelGenerator::new(CurveProfile::endless(), source);
        let (effective_level, mode, spec) = next_round(&mut generator);
        let solved = vec![false; spec.rows];
        Self {
            generator,
            round: 1,
            effective_level,
            mode,
            spec,
            solved,
            strikes: 0,
            rounds_completed: 0,
            over: false,
        }
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn effective_level(&self) -> u32 {
        self.effective_level
    }

    pub fn mode(&self) -> PresentationMode {
        self.mode
    }

    pub fn strikes(&self) -> u8 {
        self.strikes
    }

    pub fn rounds_completed(&self) -> u32 {
        self.rounds_completed
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn current_spec(&self) -> &LevelSpec {
        &self.spec
    }

    /// Resolves one tile click. Solved rows swallow clicks without a strike.
    pub fn click_tile(&mut self, row: usize, tile: usize) -> Result<EndlessOutcome, SessionError> {
        if self.over {
            return Err(SessionError::Finished);
        }
        if row >= self.spec.rows {
            return Err(SessionError::RowOutOfRange {
                row,
                rows: self.spec.rows,
            });
        }
        if self.solved[row] {
            return Ok(EndlessOutcome::Ignored);
        }

        if tile != self.spec.color_data[row].odd_tile_index {
            self.strikes += 1;
            if self.strikes >= MAX_STRIKES {
                self.over = true;
                return Ok(EndlessOutcome::GameOver {
                    rounds_completed: self.rounds_completed,
                });
            }
            return Ok(EndlessOutcome::Strike {
                strikes: self.strikes,
            });
        }

        self.solved[row] = true;
        let rows_remaining = self.solved.iter().filter(|solved| !**solved).count();
        if rows_remaining > 0 {
            return Ok(EndlessOutcome::RowSolved { rows_remaining });
        }

        let finished = self.round;
        self.rounds_completed += 1;
        self.round += 1;
        self.strikes = 0;
        let (effective_level, mode, spec) = next_round(&mut self.generator);
        self.effective_level = effective_level;
        self.mode = mode;
        self.solved = vec![false; spec.rows];
        self.spec = spec;
        Ok(EndlessOutcome::RoundCleared { round: finished })
    }
}

/// Draw order per round: band level, presentation mode, then the level spec.
fn next_round<S: UniformSource>(
    generator: &mut LevelGenerator<S>,
) -> (u32, PresentationMode, LevelSpec) {
    let effective_level = if generator.draw() < 0.5 {
        BAND_LOW_LEVEL
    } else {
        BAND_HIGH_LEVEL
    };
    let mode = if generator.draw() < 0.5 {
        PresentationMode::Scrolling
    } else {
        PresentationMode::Bouncing
    };
    let spec = generator.build(effective_level);
    (effective_level, mode, spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levelgen::SequenceSource;

    // Two round draws, then seven rows of five draws each: hue, odd index,
    // multiplier, saturation mode, direction.
    fn scripted_round_chunk(level_draw: f64, mode_draw: f64) -> Vec<f64> {
        let mut chunk = vec![level_draw, mode_draw];
        for _ in 0..7 {
            chunk.extend([0.5, 0.0, 0.0, 0.9, 0.9]);
        }
        chunk
    }

    #[test]
    fn low_band_rounds_use_the_easier_level() {
        let session = EndlessSession::new(SequenceSource::new(scripted_round_chunk(0.3, 0.7)));
        assert_eq!(session.effective_level(), 8);
        assert_eq!(session.mode(), PresentationMode::Bouncing);
        assert_eq!(session.current_spec().rows, 7);
        assert_eq!(session.current_spec().tiles_per_row, 11);
        for row in &session.current_spec().color_data {
            assert_eq!(row.color_difference, 12);
        }
    }

    #[test]
    fn high_band_rounds_use_the_harder_level() {
        let session = EndlessSession::new(SequenceSource::new(scripted_round_chunk(0.6, 0.2)));
        assert_eq!(session.effective_level(), 9);
        assert_eq!(session.mode(), PresentationMode::Scrolling);
        for row in &session.current_spec().color_data {
            assert_eq!(row.color_difference, 11);
        }
    }

    #[test]
    fn clearing_every_row_starts_a_new_round() {
        let mut script = scripted_round_chunk(0.3, 0.2);
        script.extend(scripted_round_chunk(0.8, 0.8));
        let mut session = EndlessSession::new(SequenceSource::new(script));

        // One strike first, to prove round clears reset it.
        let miss = session.click_tile(0, 5).expect("click resolves");
        assert_eq!(miss, EndlessOutcome::Strike { strikes: 1 });
        assert_eq!(session.strikes(), 1);

        for row in 0..6 {
            let outcome = session.click_tile(row, 0).expect("click resolves");
            assert_eq!(
                outcome,
                EndlessOutcome::RowSolved {
                    rows_remaining: 6 - row
                }
            );
        }
        let outcome = session.click_tile(6, 0).expect("click resolves");
        assert_eq!(outcome, EndlessOutcome::RoundCleared { round: 1 });

        assert_eq!(session.round(), 2);
        assert_eq!(session.rounds_completed(), 1);
        assert_eq!(session.strikes(), 0);
        assert_eq!(session.effective_level(), 9);
        assert_eq!(session.mode(), PresentationMode::Bouncing);
    }

    #[test]
    fn three_strikes_end_the_run() {
        let mut session = EndlessSession::new(SequenceSource::new(scripted_round_chunk(0.3, 0.2)));
        assert_eq!(
            session.click_tile(0, 3),
            Ok(EndlessOutcome::Strike { strikes: 1 })
        );
        assert_eq!(
            session.click_tile(1, 3),
            Ok(EndlessOutcome::Strike { strikes: 2 })
        );
        assert_eq!(
            session.click_tile(2, 3),
            Ok(EndlessOutcome::GameOver {
                rounds_completed: 0
            })
        );
        assert!(session.is_over());
        assert_eq!(session.click_tile(0, 0), Err(SessionError::Finished));
    }

    #[test]
    fn solved_rows_ignore_further_clicks() {
        let mut session = EndlessSession::new(SequenceSource::new(scripted_round_chunk(0.3, 0.2)));
        assert_eq!(
            session.click_tile(2, 0),
            Ok(EndlessOutcome::RowSolved { rows_remaining: 6 })
        );
        // Wrong tile on a solved row is not a strike.
        assert_eq!(session.click_tile(2, 9), Ok(EndlessOutcome::Ignored));
        assert_eq!(session.click_tile(2, 0), Ok(EndlessOutcome::Ignored));
        assert_eq!(session.strikes(), 0);
    }

    #[test]
    fn rows_outside_the_board_are_rejected() {
        let mut session = EndlessSession::new(SequenceSource::new(scripted_round_chunk(0.3, 0.2)));
        assert_eq!(
            session.click_tile(7, 0),
            Err(SessionError::RowOutOfRange { row: 7, rows: 7 })
        );
    }

    #[test]
    fn presentation_mode_serializes_in_camel_case() {
        let text = serde_json::to_string(&PresentationMode::Scrolling).expect("serialize");
        assert_eq!(text, "\"scrolling\"");
    }

    #[test]
    fn long_runs_hold_the_band_invariants() {
        let mut session = EndlessSession::from_seed(2_026);
        for _ in 0..40 {
            assert!(matches!(session.effective_level(), 8 | 9));
            let spec = session.current_spec();
            assert_eq!(spec.rows, 7);
            assert_eq!(spec.tiles_per_row, 11);

            let round = session.round();
            for row in 0..7 {
                let target = session.current_spec().color_data[row].odd_tile_index;
                let outcome = session.click_tile(row, target).expect("click resolves");
                if row < 6 {
                    assert_eq!(
                        outcome,
                        EndlessOutcome::RowSolved {
                            rows_remaining: 6 - row
                        }
                    );
                } else {
                    assert_eq!(outcome, EndlessOutcome::RoundCleared { round });
                }
            }
        }
        assert_eq!(session.rounds_completed(), 40);
        assert!(!session.is_over());
    }
}
