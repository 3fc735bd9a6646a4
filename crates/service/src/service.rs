//! Game orchestration: sessions in, stats out.

use std::fmt;
use std::time::Instant;

use huehunt_core::{
    ChaChaSource, CurveProfile, DifficultyExample, GameSession, GameSummary, LevelResult,
    LevelSpec, MAX_STRIKES, MissOutcome, SessionError, SolveOutcome,
};
use log::{debug, warn};
use serde::Serialize;

use crate::entropy::runtime_entropy;
use crate::repository::{
    AggregateStats, GameRecord, MemoryRepository, RepositoryError, StatsRepository, UserId,
    unix_now_ms,
};
use crate::session_store::{MemoryStore, SessionId, SessionStore};

#[derive(Debug)]
pub enum ServiceError {
    SessionNotFound(SessionId),
    RowOutOfRange { row: usize, rows: usize },
    Repository(RepositoryError),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionNotFound(session) => write!(f, "no active session {session}"),
            Self::RowOutOfRange { row, rows } => {
                write!(f, "row {row} does not exist; the level has {rows} rows")
            }
            Self::Repository(error) => write!(f, "stats lookup failed: {error}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Repository(error) => Some(error),
            Self::SessionNotFound(_) | Self::RowOutOfRange { .. } => None,
        }
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(error: RepositoryError) -> Self {
        Self::Repository(error)
    }
}

fn map_session_error(error: SessionError, session: SessionId) -> ServiceError {
    match error {
        // Terminal sessions are deleted eagerly, so the store never holds one.
        SessionError::Finished => ServiceError::SessionNotFound(session),
        SessionError::RowOutOfRange { row, rows } => ServiceError::RowOutOfRange { row, rows },
    }
}

/// The level payload handed to the client whenever a new level begins.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelAdvance {
    pub level: u32,
    pub total_levels: u32,
    pub max_strikes: u8,
    pub strikes_used: u8,
    #[serde(flatten)]
    pub spec: LevelSpec,
}

/// Response to a new-game request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedGame {
    pub session_id: SessionId,
    #[serde(flatten)]
    pub level: LevelAdvance,
    pub is_authenticated: bool,
}

/// Terminal summary returned when a game ends, win or lose.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalStats {
    pub won: bool,
    pub level_stats: Vec<LevelResult>,
    pub smallest_difference: Option<u8>,
    pub smallest_difference_example: Option<DifficultyExample>,
    pub total_time_seconds: u64,
}

#[derive(Debug)]
pub enum SolveResponse {
    RowSolved { rows_remaining: usize },
    NextLevel(LevelAdvance),
    GameWon(FinalStats),
}

#[derive(Debug)]
pub enum MissResponse {
    Strike { strikes_used: u8, strikes_remaining: u8 },
    GameOver(FinalStats),
}

/// One live game as the store holds it.
pub struct SessionEntry {
    session: GameSession<ChaChaSource>,
    user: Option<UserId>,
    started_at: Instant,
    level_started_at: Instant,
    started_at_unix_ms: u64,
}

/// Front door for campaign play: owns the session store and the stats
/// repository, and keeps per-level timing for both.
pub struct GameService<S, R> {
    store: S,
    repository: R,
    profile: CurveProfile,
}

/// The all-in-process wiring used by tests and anonymous-only deployments.
pub type MemoryGameService = GameService<MemoryStore<SessionEntry>, MemoryRepository>;

impl MemoryGameService {
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::default(), MemoryRepository::new(), CurveProfile::classic())
    }
}

impl<S, R> GameService<S, R>
where
    S: SessionStore<State = SessionEntry>,
    R: StatsRepository,
{
    pub fn new(store: S, repository: R, profile: CurveProfile) -> Self {
        Self { store, repository, profile }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Drops idle sessions and reports how many were dropped.
    pub fn evict_idle(&mut self) -> usize {
        self.store.expire_idle(Instant::now())
    }

    /// Starts a fresh campaign and returns its first level.
    ///
    /// Passing a user links the finished game to that user's stats;
    /// anonymous games are discarded when they end.
    pub fn start_game(&mut self, user: Option<UserId>) -> StartedGame {
        let now = Instant::now();
        let evicted = self.store.expire_idle(now);
        if evicted > 0 {
            debug!("evicted {evicted} idle session(s)");
        }

        let seed = runtime_entropy();
        let session = GameSession::from_seed(seed, self.profile);
        let session_id = SessionId::generate();
        let level = LevelAdvance {
            level: 1,
            total_levels: self.profile.max_level,
            max_strikes: MAX_STRIKES,
            strikes_used: 0,
            spec: session.current_spec().clone(),
        };

        let entry = SessionEntry {
            session,
            user,
            started_at: now,
            level_started_at: now,
            started_at_unix_ms: unix_now_ms(),
        };
        self.store.create(session_id, entry, now);
        debug!("session {session_id} started at level 1");

        StartedGame { session_id, level, is_authenticated: user.is_some() }
    }

    /// Reports a correctly spotted odd tile in `row` of the current level.
    pub fn solve_row(
        &mut self,
        session_id: SessionId,
        row: usize,
    ) -> Result<SolveResponse, ServiceError> {
        let now = Instant::now();
        let outcome = self
            .store
            .update(session_id, now, |entry| {
                let elapsed = now.duration_since(entry.level_started_at);
                let outcome = entry.session.solve_row(row, elapsed)?;
                if matches!(outcome, SolveOutcome::Advanced { .. }) {
                    entry.level_started_at = now;
                }
                Ok(outcome)
            })
            .ok_or(ServiceError::SessionNotFound(session_id))?
            .map_err(|error| map_session_error(error, session_id))?;

        match outcome {
            SolveOutcome::RowSolved { rows_remaining } => {
                Ok(SolveResponse::RowSolved { rows_remaining })
            }
            SolveOutcome::Advanced { level, spec } => {
                debug!("session {session_id} advanced to level {level}");
                Ok(SolveResponse::NextLevel(LevelAdvance {
                    level,
                    total_levels: self.profile.max_level,
                    max_strikes: MAX_STRIKES,
                    strikes_used: 0,
                    spec,
                }))
            }
            SolveOutcome::Won(summary) => {
                debug!("session {session_id} won the campaign");
                Ok(SolveResponse::GameWon(self.finalize(session_id, summary)))
            }
        }
    }

    /// Reports a wrong tile click anywhere in the current level.
    pub fn miss_row(&mut self, session_id: SessionId) -> Result<MissResponse, ServiceError> {
        let now = Instant::now();
        let outcome = self
            .store
            .update(session_id, now, |entry| {
                let elapsed = now.duration_since(entry.level_started_at);
                entry.session.miss_row(elapsed)
            })
            .ok_or(ServiceError::SessionNotFound(session_id))?
            .map_err(|error| map_session_error(error, session_id))?;

        match outcome {
            MissOutcome::Strike { strikes_used } => Ok(MissResponse::Strike {
                strikes_used,
                strikes_remaining: MAX_STRIKES - strikes_used,
            }),
            MissOutcome::GameOver(summary) => {
                debug!("session {session_id} struck out");
                Ok(MissResponse::GameOver(self.finalize(session_id, summary)))
            }
        }
    }

    /// Forgets a session without recording anything.
    pub fn abandon(&mut self, session_id: SessionId) -> Result<(), ServiceError> {
        match self.store.delete(session_id) {
            Some(_) => {
                debug!("session {session_id} abandoned");
                Ok(())
            }
            None => Err(ServiceError::SessionNotFound(session_id)),
        }
    }

    pub fn aggregate_stats(&self, user: UserId) -> Result<AggregateStats, ServiceError> {
        Ok(self.repository.aggregate_for_user(user)?)
    }

    fn finalize(&mut self, session_id: SessionId, summary: GameSummary) -> FinalStats {
        let (user, started_at_unix_ms, total_time_seconds) = match self.store.delete(session_id) {
            Some(entry) => {
                (entry.user, entry.started_at_unix_ms, entry.started_at.elapsed().as_secs())
            }
            None => (None, unix_now_ms(), 0),
        };

        let stats = FinalStats {
            won: summary.won,
            level_stats: summary.level_stats.clone(),
            smallest_difference: summary.smallest_difference,
            smallest_difference_example: summary.smallest_difference_example.clone(),
            total_time_seconds,
        };

        // Persistence is best-effort; the player still gets their summary.
        if let Some(user) = user
            && let Err(error) =
                self.persist(user, &summary, started_at_unix_ms, total_time_seconds)
        {
            warn!("failed to persist game for user {}: {error}", user.0);
        }

        stats
    }

    fn persist(
        &mut self,
        user: UserId,
        summary: &GameSummary,
        started_at_unix_ms: u64,
        total_time_seconds: u64,
    ) -> Result<(), RepositoryError> {
        let record = GameRecord {
            started_at_unix_ms,
            completed_at_unix_ms: unix_now_ms(),
            levels_completed: summary.levels_completed,
            total_time_seconds,
            total_strikes: summary
                .level_stats
                .iter()
                .map(|stat| u32::from(stat.strikes))
                .sum(),
            game_completed: summary.won,
            smallest_difference: summary.smallest_difference,
            smallest_difference_example: summary.smallest_difference_example.clone(),
        };
        let game = self.repository.record_game_session(user, &record)?;
        for stat in &summary.level_stats {
            self.repository.record_level_result(game, stat)?;
        }
        Ok(())
    }
}
