use std::fmt;

use crate::color::{self, ColorSample};
use crate::levelgen::model::{DifficultyExample, LevelSpec, RowSpec};
use crate::levelgen::profile::CurveProfile;
use crate::levelgen::rng::{ChaChaSource, UniformSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerateError {
    InvalidLevel { level: u32 },
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLevel { level } => {
                write!(f, "level {level} is not playable; levels start at 1")
            }
        }
    }
}

impl std::error::Error for GenerateError {}

/// Produces level payloads by walking a curve profile and a uniform source.
pub struct LevelGenerator<S> {
    profile: CurveProfile,
    source: S,
}

impl LevelGenerator<ChaChaSource> {
    pub fn from_seed(profile: CurveProfile, seed: u64) -> Self {
        Self::new(profile, ChaChaSource::from_seed(seed))
    }
}

impl<S: UniformSource> LevelGenerator<S> {
    pub fn new(profile: CurveProfile, source: S) -> Self {
        Self { profile, source }
    }

    pub fn profile(&self) -> &CurveProfile {
        &self.profile
    }

    /// Generates the payload for `level`.
    ///
    /// Each row consumes draws in a fixed order: hue, odd tile index,
    /// difficulty multiplier, the saturation-mode draw (only on
    /// saturation-eligible levels), then the direction draw. Scripted
    /// sources rely on this order.
    pub fn generate(&mut self, level: u32) -> Result<LevelSpec, GenerateError> {
        if level == 0 {
            return Err(GenerateError::InvalidLevel { level });
        }
        Ok(self.build(level))
    }

    pub(crate) fn build(&mut self, level: u32) -> LevelSpec {
        debug_assert!(level >= 1, "levels start at 1");
        let rows = self.profile.rows_for(level);
        let tiles_per_row = self.profile.tiles_per_row_for(level);
        let budget = self.profile.difference_budget_for(level);

        let color_data: Vec<RowSpec> = (0..rows)
            .map(|_| self.generate_row(level, tiles_per_row, budget))
            .collect();

        let difference_sum: u32 = color_data
            .iter()
            .map(|row| u32::from(row.color_difference))
            .sum();
        let average_color_difference = f64::from(difference_sum) / color_data.len() as f64;

        let hardest = hardest_row(&color_data);
        let smallest_row_difference = hardest.color_difference;
        let difficulty_example = DifficultyExample {
            base_color: hardest.base_color,
            odd_color: hardest.odd_color,
            difference: hardest.color_difference,
            uses_saturation_diff: hardest.uses_saturation_diff,
        };

        LevelSpec {
            rows,
            tiles_per_row,
            color_data,
            average_color_difference,
            smallest_row_difference,
            difficulty_example,
        }
    }

    /// One raw draw from the underlying source, for callers that interleave
    /// their own decisions with level generation.
    pub(crate) fn draw(&mut self) -> f64 {
        self.source.next_f64()
    }

    fn generate_row(&mut self, level: u32, tiles_per_row: usize, budget: f64) -> RowSpec {
        let hue = (self.source.next_f64() * 360.0).floor() as u16;
        let base_color = ColorSample::base(hue);
        let odd_tile_index = (self.source.next_f64() * tiles_per_row as f64).floor() as usize;
        let multiplier =
            self.source.next_f64() * self.profile.multiplier_span + self.profile.multiplier_base;
        let adjusted = (budget * multiplier).floor().max(1.0);

        // Ineligible levels skip the saturation draw entirely.
        let uses_saturation_diff = self.profile.saturation_eligible(level)
            && self.source.next_f64() < self.profile.saturation_probability;
        let negative = self.source.next_f64() < 0.5;
        let offset = if negative { -adjusted } else { adjusted };

        let channel = if uses_saturation_diff {
            base_color.saturation
        } else {
            base_color.lightness
        };
        let perturbed = color::clamp_channel(f64::from(channel) + offset);
        let odd_color = if uses_saturation_diff {
            base_color.with_saturation(perturbed)
        } else {
            base_color.with_lightness(perturbed)
        };

        RowSpec {
            base_color,
            odd_color,
            odd_tile_index,
            color_difference: perturbed.abs_diff(channel),
            uses_saturation_diff,
        }
    }
}

/// The row whose odd tile is hardest to spot. Ties keep the earliest row.
fn hardest_row(rows: &[RowSpec]) -> &RowSpec {
    debug_assert!(!rows.is_empty());
    let mut hardest = &rows[0];
    for row in &rows[1..] {
        if row.color_difference < hardest.color_difference {
            hardest = row;
        }
    }
    hardest
}
