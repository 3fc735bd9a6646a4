pub mod entropy;
pub mod repository;
pub mod service;
pub mod session_store;
pub mod stats_file;

pub use repository::{
    AggregateStats, BestStats, GameId, GameRecord, LevelAggregate, MemoryRepository,
    OverallStats, RecentGame, RepositoryError, StatsRepository, StoredGame, UserId,
    aggregate_games,
};
pub use service::{
    FinalStats, GameService, LevelAdvance, MemoryGameService, MissResponse, ServiceError,
    SessionEntry, SolveResponse, StartedGame,
};
pub use session_store::{DEFAULT_SESSION_TTL, MemoryStore, SessionId, SessionStore};
pub use stats_file::{FileRepository, LoadedStats, load_stats_file};
