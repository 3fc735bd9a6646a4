//! Level payload model shared with the rendering client.

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

use crate::color::ColorSample;

/// One row of tiles. Every tile renders `base_color` except the one at
/// `odd_tile_index`, which renders `odd_color`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowSpec {
    pub base_color: ColorSample,
    pub odd_color: ColorSample,
    pub odd_tile_index: usize,
    /// Post-clamp channel distance between base and odd color.
    pub color_difference: u8,
    pub uses_saturation_diff: bool,
}

/// The hardest row of a level, kept for stats displays.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyExample {
    pub base_color: ColorSample,
    pub odd_color: ColorSample,
    pub difference: u8,
    pub uses_saturation_diff: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelSpec {
    pub rows: usize,
    pub tiles_per_row: usize,
    pub color_data: Vec<RowSpec>,
    pub average_color_difference: f64,
    pub smallest_row_difference: u8,
    pub difficulty_example: DifficultyExample,
}

impl LevelSpec {
    /// Stable little-endian encoding used for fingerprinting.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend((self.rows as u32).to_le_bytes());
        bytes.extend((self.tiles_per_row as u32).to_le_bytes());

        bytes.extend((self.color_data.len() as u32).to_le_bytes());
        for row in &self.color_data {
            push_color(&mut bytes, row.base_color);
            push_color(&mut bytes, row.odd_color);
            bytes.extend((row.odd_tile_index as u32).to_le_bytes());
            bytes.push(row.color_difference);
            bytes.push(u8::from(row.uses_saturation_diff));
        }

        bytes.extend(self.average_color_difference.to_bits().to_le_bytes());
        bytes.push(self.smallest_row_difference);
        push_color(&mut bytes, self.difficulty_example.base_color);
        push_color(&mut bytes, self.difficulty_example.odd_color);
        bytes.push(self.difficulty_example.difference);
        bytes.push(u8::from(self.difficulty_example.uses_saturation_diff));

        bytes
    }

    /// xxh3 hash of the canonical bytes; equal specs hash equal.
    pub fn fingerprint(&self) -> u64 {
        xxh3_64(&self.canonical_bytes())
    }
}

fn push_color(bytes: &mut Vec<u8>, color: ColorSample) {
    bytes.extend(color.hue.to_le_bytes());
    bytes.push(color.saturation);
    bytes.push(color.lightness);
}
