//! Per-game stats shared by the session machines and the persistence layer.

use serde::{Deserialize, Serialize};

use crate::levelgen::DifficultyExample;

/// One level's outcome inside a single game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelResult {
    pub level: u32,
    pub time_seconds: u64,
    pub strikes: u8,
    pub average_color_difference: f64,
    /// Set only on the level that ended a lost game.
    #[serde(default, skip_serializing_if = "is_false")]
    pub failed: bool,
}

fn is_false(flag: &bool) -> bool {
    !flag
}

/// Everything the player sees when a game ends.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub won: bool,
    pub levels_completed: u32,
    pub level_stats: Vec<LevelResult>,
    pub smallest_difference: Option<u8>,
    pub smallest_difference_example: Option<DifficultyExample>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_flag_stays_off_the_wire_until_set() {
        let mut result = LevelResult {
            level: 3,
            time_seconds: 41,
            strikes: 1,
            average_color_difference: 19.5,
            failed: false,
        };
        let clean = serde_json::to_string(&result).expect("serialize");
        assert!(!clean.contains("failed"));

        result.failed = true;
        let failed = serde_json::to_string(&result).expect("serialize");
        assert!(failed.contains("\"failed\":true"));
    }

    #[test]
    fn missing_failed_field_defaults_to_false() {
        let text = r#"{"level":1,"timeSeconds":30,"strikes":0,"averageColorDifference":22.0}"#;
        let result: LevelResult = serde_json::from_str(text).expect("deserialize");
        assert!(!result.failed);
        assert_eq!(result.level, 1);
    }

    #[test]
    fn empty_summaries_serialize_null_difficulty_fields() {
        let summary = GameSummary {
            won: false,
            levels_completed: 0,
            level_stats: Vec::new(),
            smallest_difference: None,
            smallest_difference_example: None,
        };
        let value = serde_json::to_value(&summary).expect("serialize");
        assert_eq!(value["smallestDifference"], serde_json::Value::Null);
        assert_eq!(value["smallestDifferenceExample"], serde_json::Value::Null);
    }
}
