//! Difficulty curve profiles: every tuning constant behind level generation.

/// Tuning constants for one difficulty curve. All fields are plain data so
/// variants stay values instead of code forks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurveProfile {
    /// Row count at level 1.
    pub base_rows: u32,
    /// Rows gained per level, applied as `floor((level - 1) * rows_per_level)`.
    pub rows_per_level: f64,
    /// Hard cap on rows regardless of level.
    pub max_rows: u32,
    /// Tiles per row at the curve origin.
    pub base_tiles_per_row: u32,
    /// One extra tile every this many levels.
    pub tiles_level_divisor: u32,
    /// Hard cap on tiles per row.
    pub max_tiles_per_row: u32,
    /// Budget curve intercept, in percent points of channel distance.
    pub budget_intercept: f64,
    /// Budget lost per level.
    pub budget_slope: f64,
    /// The budget never drops below this.
    pub budget_floor: f64,
    /// Rows may perturb saturation only above this level.
    pub saturation_threshold_level: u32,
    /// Chance an eligible row perturbs saturation instead of lightness.
    pub saturation_probability: f64,
    /// Low end of the per-row difficulty multiplier.
    pub multiplier_base: f64,
    /// Width of the per-row difficulty multiplier span.
    pub multiplier_span: f64,
    /// Completing this level wins a campaign session.
    pub max_level: u32,
}

impl CurveProfile {
    /// The campaign curve: ten levels from a gentle 26-point budget down to 10.
    pub fn classic() -> Self {
        Self {
            base_rows: 3,
            rows_per_level: 0.6,
            max_rows: 8,
            base_tiles_per_row: 9,
            tiles_level_divisor: 4,
            max_tiles_per_row: 12,
            budget_intercept: 28.0,
            budget_slope: 1.8,
            budget_floor: 10.0,
            saturation_threshold_level: 5,
            saturation_probability: 0.25,
            multiplier_base: 0.85,
            multiplier_span: 0.3,
            max_level: 10,
        }
    }

    /// The fixed hard band the endless variant plays in: a higher floor and
    /// saturation rows from the start.
    pub fn endless() -> Self {
        Self {
            budget_intercept: 30.0,
            budget_floor: 12.0,
            saturation_threshold_level: 0,
            ..Self::classic()
        }
    }

    /// Rows shown at `level`, saturating at `max_rows`. Never zero.
    pub fn rows_for(&self, level: u32) -> usize {
        let grown = ((f64::from(level) - 1.0) * self.rows_per_level).floor();
        let rows = f64::from(self.base_rows) + grown;
        (rows as u32).min(self.max_rows).max(1) as usize
    }

    /// Tiles in each row at `level`, saturating at `max_tiles_per_row`.
    pub fn tiles_per_row_for(&self, level: u32) -> usize {
        let tiles = self.base_tiles_per_row + level / self.tiles_level_divisor;
        tiles.min(self.max_tiles_per_row).max(1) as usize
    }

    /// Channel-distance budget at `level`; never below `budget_floor`.
    pub fn difference_budget_for(&self, level: u32) -> f64 {
        let sloped = (self.budget_intercept - f64::from(level) * self.budget_slope).floor();
        sloped.max(self.budget_floor)
    }

    /// Whether rows at `level` may perturb saturation at all.
    pub fn saturation_eligible(&self, level: u32) -> bool {
        level > self.saturation_threshold_level
    }

    /// Whether completing `level` ends a campaign with a win.
    pub fn is_final_level(&self, level: u32) -> bool {
        level >= self.max_level
    }
}
