//! Stats persistence seam shared by the in-memory and file-backed stores.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::time::{SystemTime, UNIX_EPOCH};

use huehunt_core::{DifficultyExample, LevelResult};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameId(pub u64);

/// One finished game as the stats stores see it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub started_at_unix_ms: u64,
    pub completed_at_unix_ms: u64,
    pub levels_completed: u32,
    pub total_time_seconds: u64,
    pub total_strikes: u32,
    pub game_completed: bool,
    pub smallest_difference: Option<u8>,
    pub smallest_difference_example: Option<DifficultyExample>,
}

#[derive(Debug)]
pub enum RepositoryError {
    Io(io::Error),
    Corrupt { line: usize, message: String },
    UnknownGame(GameId),
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(error) => write!(f, "stats repository I/O error: {error}"),
            Self::Corrupt { line, message } => {
                write!(f, "corrupt stats log at line {line}: {message}")
            }
            Self::UnknownGame(game) => write!(f, "no recorded game with id {}", game.0),
        }
    }
}

impl std::error::Error for RepositoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(error) => Some(error),
            Self::Corrupt { .. } | Self::UnknownGame(_) => None,
        }
    }
}

impl From<io::Error> for RepositoryError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

/// Where finished games land. Implementations decide durability; callers
/// only see game ids.
pub trait StatsRepository {
    fn record_game_session(
        &mut self,
        user: UserId,
        record: &GameRecord,
    ) -> Result<GameId, RepositoryError>;

    fn record_level_result(
        &mut self,
        game: GameId,
        result: &LevelResult,
    ) -> Result<(), RepositoryError>;

    fn aggregate_for_user(&self, user: UserId) -> Result<AggregateStats, RepositoryError>;
}

/// Aggregate shape served to the stats screen.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub overall: OverallStats,
    pub best: BestStats,
    #[serde(rename = "byLevel")]
    pub by_level: Vec<LevelAggregate>,
    pub recent: Vec<RecentGame>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverallStats {
    pub total_games: u32,
    pub games_won: u32,
    pub avg_levels_per_game: f64,
    pub hardest_challenge_faced: Option<u8>,
    pub total_time_played: u64,
    pub total_strikes: u32,
}

/// Personal bests; only completed games qualify.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BestStats {
    pub fastest_completion: Option<u64>,
    pub fewest_strikes_completion: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelAggregate {
    pub level_number: u32,
    pub times_played: u32,
    pub avg_time: f64,
    pub avg_strikes: f64,
    pub times_completed: u32,
    pub success_rate: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecentGame {
    pub started_at_unix_ms: u64,
    pub levels_completed: u32,
    pub total_time_seconds: u64,
    pub total_strikes: u32,
    pub game_completed: bool,
    pub smallest_difference: Option<u8>,
}

const RECENT_GAMES_LIMIT: usize = 10;

/// A game plus its per-level rows, the unit both stores hold.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredGame {
    pub user: UserId,
    pub record: GameRecord,
    pub levels: Vec<LevelResult>,
}

#[derive(Default)]
struct LevelBucket {
    times_played: u32,
    time_sum: u64,
    strike_sum: u32,
    times_completed: u32,
}

impl LevelBucket {
    fn into_aggregate(self, level_number: u32) -> LevelAggregate {
        let played = f64::from(self.times_played);
        LevelAggregate {
            level_number,
            times_played: self.times_played,
            avg_time: self.time_sum as f64 / played,
            avg_strikes: f64::from(self.strike_sum) / played,
            times_completed: self.times_completed,
            success_rate: f64::from(self.times_completed) * 100.0 / played,
        }
    }
}

/// Folds a set of stored games into the aggregate shape.
pub fn aggregate_games<'a, I>(games: I) -> AggregateStats
where
    I: IntoIterator<Item = &'a StoredGame>,
{
    let mut total_games = 0_u32;
    let mut games_won = 0_u32;
    let mut levels_sum = 0_u64;
    let mut total_time_played = 0_u64;
    let mut total_strikes = 0_u32;
    let mut hardest: Option<u8> = None;
    let mut fastest_completion: Option<u64> = None;
    let mut fewest_strikes_completion: Option<u32> = None;
    let mut buckets: BTreeMap<u32, LevelBucket> = BTreeMap::new();
    let mut recent: Vec<RecentGame> = Vec::new();

    for game in games {
        let record = &game.record;
        total_games += 1;
        levels_sum += u64::from(record.levels_completed);
        total_time_played += record.total_time_seconds;
        total_strikes += record.total_strikes;

        if let Some(difference) = record.smallest_difference
            && hardest.is_none_or(|current| difference < current)
        {
            hardest = Some(difference);
        }

        if record.game_completed {
            games_won += 1;
            if fastest_completion.is_none_or(|current| record.total_time_seconds < current) {
                fastest_completion = Some(record.total_time_seconds);
            }
            if fewest_strikes_completion.is_none_or(|current| record.total_strikes < current) {
                fewest_strikes_completion = Some(record.total_strikes);
            }
        }

        for result in &game.levels {
            let bucket = buckets.entry(result.level).or_default();
            bucket.times_played += 1;
            bucket.time_sum += result.time_seconds;
            bucket.strike_sum += u32::from(result.strikes);
            if !result.failed {
                bucket.times_completed += 1;
            }
        }

        recent.push(RecentGame {
            started_at_unix_ms: record.started_at_unix_ms,
            levels_completed: record.levels_completed,
            total_time_seconds: record.total_time_seconds,
            total_strikes: record.total_strikes,
            game_completed: record.game_completed,
            smallest_difference: record.smallest_difference,
        });
    }

    recent.sort_by(|a, b| b.started_at_unix_ms.cmp(&a.started_at_unix_ms));
    recent.truncate(RECENT_GAMES_LIMIT);

    let avg_levels_per_game = if total_games == 0 {
        0.0
    } else {
        levels_sum as f64 / f64::from(total_games)
    };

    AggregateStats {
        overall: OverallStats {
            total_games,
            games_won,
            avg_levels_per_game,
            hardest_challenge_faced: hardest,
            total_time_played,
            total_strikes,
        },
        best: BestStats { fastest_completion, fewest_strikes_completion },
        by_level: buckets
            .into_iter()
            .map(|(level, bucket)| bucket.into_aggregate(level))
            .collect(),
        recent,
    }
}

/// Keeps every game in process memory. The default repository for tests
/// and anonymous-only deployments.
#[derive(Default)]
pub struct MemoryRepository {
    games: Vec<StoredGame>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn games(&self) -> &[StoredGame] {
        &self.games
    }
}

impl StatsRepository for MemoryRepository {
    fn record_game_session(
        &mut self,
        user: UserId,
        record: &GameRecord,
    ) -> Result<GameId, RepositoryError> {
        let id = GameId(self.games.len() as u64);
        self.games.push(StoredGame { user, record: record.clone(), levels: Vec::new() });
        Ok(id)
    }

    fn record_level_result(
        &mut self,
        game: GameId,
        result: &LevelResult,
    ) -> Result<(), RepositoryError> {
        let index = usize::try_from(game.0).map_err(|_| RepositoryError::UnknownGame(game))?;
        let Some(stored) = self.games.get_mut(index) else {
            return Err(RepositoryError::UnknownGame(game));
        };
        stored.levels.push(result.clone());
        Ok(())
    }

    fn aggregate_for_user(&self, user: UserId) -> Result<AggregateStats, RepositoryError> {
        Ok(aggregate_games(self.games.iter().filter(|game| game.user == user)))
    }
}

pub(crate) fn unix_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_millis() as u64)
}
