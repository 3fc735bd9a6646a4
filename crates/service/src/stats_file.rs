//! File-backed stats repository: an append-only JSONL log.
//!
//! Line 1 is a header carrying `format_version` and `created_at_unix_ms`.
//! Every later line is one finished game or one of its per-level rows, and
//! each record links to its predecessor through a SHA-256 chain
//! (`prev_sha256_hex`, `sha256_hex`), so an edited, reordered, or deleted
//! line surfaces as a verification failure with a line number.
//!
//! Appends flush immediately; a crash loses at most the record being
//! written. The loader walks and verifies the whole file before the log is
//! trusted for aggregation or further appends.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use huehunt_core::LevelResult;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::repository::{
    AggregateStats, GameId, GameRecord, RepositoryError, StatsRepository, StoredGame, UserId,
    aggregate_games, unix_now_ms,
};

// ---------------------------------------------------------------------------
// File format structs
// ---------------------------------------------------------------------------

const FORMAT_VERSION: u16 = 1;

/// First line of the JSONL stats log.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
struct FileHeader {
    format_version: u16,
    created_at_unix_ms: u64,
}

/// One logged event: a finished game or one of its per-level rows.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RecordPayload {
    Game { game: GameId, user: UserId, record: GameRecord },
    Level { game: GameId, result: LevelResult },
}

/// Fields used to compute the canonical SHA-256 for a record.
/// Serialized to JSON as the hash input (concatenated with `prev_sha256_hex`).
#[derive(Serialize)]
struct RecordBody<'a> {
    seq: u64,
    payload: &'a RecordPayload,
}

/// Full record line written to the JSONL file.
#[derive(Serialize, Deserialize, Debug, Clone)]
struct FileRecord {
    seq: u64,
    payload: RecordPayload,
    prev_sha256_hex: String,
    sha256_hex: String,
}

// ---------------------------------------------------------------------------
// SHA-256 helpers
// ---------------------------------------------------------------------------

/// The initial previous-hash used for the first record in a chain.
const INITIAL_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Compute `hex(SHA-256(body_json || prev_sha256_hex))`.
fn compute_record_sha256(body_json: &str, prev_sha256_hex: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body_json.as_bytes());
    hasher.update(prev_sha256_hex.as_bytes());
    let result = hasher.finalize();
    format!("{result:064x}")
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// Stats repository that appends every finished game to a JSONL log.
pub struct FileRepository {
    path: PathBuf,
    writer: BufWriter<File>,
    last_sha256_hex: String,
    next_seq: u64,
    next_game: u64,
}

impl FileRepository {
    /// Create a new stats log, writing the header line immediately.
    pub fn create(path: &Path) -> Result<Self, RepositoryError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        let header =
            FileHeader { format_version: FORMAT_VERSION, created_at_unix_ms: unix_now_ms() };
        let header_json = serde_json::to_string(&header).map_err(io::Error::other)?;
        writeln!(writer, "{header_json}")?;
        writer.flush()?;

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            last_sha256_hex: INITIAL_HASH.to_string(),
            next_seq: 0,
            next_game: 0,
        })
    }

    /// Validate an existing log, then resume appending to it.
    pub fn open(path: &Path) -> Result<Self, RepositoryError> {
        let loaded = load_stats_file(path)?;
        let file = OpenOptions::new().append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            last_sha256_hex: loaded.last_sha256_hex,
            next_seq: loaded.next_seq,
            next_game: loaded.next_game,
        })
    }

    pub fn open_or_create(path: &Path) -> Result<Self, RepositoryError> {
        if path.exists() { Self::open(path) } else { Self::create(path) }
    }

    /// Platform data directory location for the stats log, if one exists.
    pub fn default_path() -> Option<PathBuf> {
        let dirs = ProjectDirs::from("", "", "Huehunt")?;
        Some(dirs.data_dir().join("stats.jsonl"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record and flush immediately.
    fn append(&mut self, payload: &RecordPayload) -> Result<(), RepositoryError> {
        let body = RecordBody { seq: self.next_seq, payload };
        let body_json = serde_json::to_string(&body).map_err(io::Error::other)?;
        let sha256_hex = compute_record_sha256(&body_json, &self.last_sha256_hex);

        let record = FileRecord {
            seq: self.next_seq,
            payload: payload.clone(),
            prev_sha256_hex: self.last_sha256_hex.clone(),
            sha256_hex: sha256_hex.clone(),
        };

        let record_json = serde_json::to_string(&record).map_err(io::Error::other)?;
        writeln!(self.writer, "{record_json}")?;
        self.writer.flush()?;

        self.last_sha256_hex = sha256_hex;
        self.next_seq += 1;

        Ok(())
    }
}

impl StatsRepository for FileRepository {
    fn record_game_session(
        &mut self,
        user: UserId,
        record: &GameRecord,
    ) -> Result<GameId, RepositoryError> {
        let game = GameId(self.next_game);
        self.append(&RecordPayload::Game { game, user, record: record.clone() })?;
        self.next_game += 1;
        Ok(game)
    }

    fn record_level_result(
        &mut self,
        game: GameId,
        result: &LevelResult,
    ) -> Result<(), RepositoryError> {
        // Game ids are dense, so a bound check is an existence check.
        if game.0 >= self.next_game {
            return Err(RepositoryError::UnknownGame(game));
        }
        self.append(&RecordPayload::Level { game, result: result.clone() })
    }

    fn aggregate_for_user(&self, user: UserId) -> Result<AggregateStats, RepositoryError> {
        let loaded = load_stats_file(&self.path)?;
        Ok(aggregate_games(loaded.games.iter().filter(|game| game.user == user)))
    }
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Successfully loaded stats log with metadata needed for resuming appends.
#[derive(Debug)]
pub struct LoadedStats {
    pub games: Vec<StoredGame>,
    pub created_at_unix_ms: u64,
    /// SHA-256 hex of the last valid record (or the initial hash if empty).
    pub last_sha256_hex: String,
    /// Sequence number for the next record to be appended.
    pub next_seq: u64,
    /// Game id for the next recorded game.
    pub next_game: u64,
}

/// Load and validate a JSONL stats log.
///
/// Stops at the first invalid, incomplete, or hash-broken line and returns
/// an error describing the problem.
pub fn load_stats_file(path: &Path) -> Result<LoadedStats, RepositoryError> {
    let content = fs::read_to_string(path)?;
    if content.is_empty() {
        return Err(RepositoryError::Corrupt { line: 1, message: "empty stats log".to_string() });
    }
    let has_trailing_newline = content.ends_with('\n');
    let lines: Vec<&str> = content.lines().collect();
    if !has_trailing_newline {
        return Err(RepositoryError::Corrupt {
            line: lines.len(),
            message: "incomplete final line".to_string(),
        });
    }

    // --- header (line 1) ---
    let header: FileHeader = serde_json::from_str(lines[0])
        .map_err(|e| RepositoryError::Corrupt { line: 1, message: e.to_string() })?;
    if header.format_version != FORMAT_VERSION {
        return Err(RepositoryError::Corrupt {
            line: 1,
            message: format!("unsupported format_version {}", header.format_version),
        });
    }

    let mut games: Vec<StoredGame> = Vec::new();
    let mut prev_sha256_hex = INITIAL_HASH.to_string();
    let mut next_seq: u64 = 0;

    // --- records (lines 2+) ---
    for (line_index, line) in lines.iter().skip(1).enumerate() {
        let line_number = line_index + 2; // 1-indexed; header is line 1

        if line.is_empty() {
            return Err(RepositoryError::Corrupt {
                line: line_number,
                message: "empty line".to_string(),
            });
        }

        let record: FileRecord = serde_json::from_str(line).map_err(|e| {
            RepositoryError::Corrupt { line: line_number, message: e.to_string() }
        })?;

        if record.seq != next_seq {
            return Err(RepositoryError::Corrupt {
                line: line_number,
                message: format!("expected seq {next_seq}, found {}", record.seq),
            });
        }

        // Verify prev_sha256 link
        if record.prev_sha256_hex != prev_sha256_hex {
            return Err(RepositoryError::Corrupt {
                line: line_number,
                message: "hash chain broken".to_string(),
            });
        }

        // Recompute canonical hash and verify
        let body = RecordBody { seq: record.seq, payload: &record.payload };
        let body_json = serde_json::to_string(&body).map_err(|e| {
            RepositoryError::Corrupt { line: line_number, message: e.to_string() }
        })?;
        let expected_sha256 = compute_record_sha256(&body_json, &prev_sha256_hex);

        if record.sha256_hex != expected_sha256 {
            return Err(RepositoryError::Corrupt {
                line: line_number,
                message: "record hash mismatch".to_string(),
            });
        }

        match record.payload {
            RecordPayload::Game { game, user, record: game_record } => {
                if game.0 != games.len() as u64 {
                    return Err(RepositoryError::Corrupt {
                        line: line_number,
                        message: format!("expected game id {}, found {}", games.len(), game.0),
                    });
                }
                games.push(StoredGame { user, record: game_record, levels: Vec::new() });
            }
            RecordPayload::Level { game, result } => {
                let Some(stored) =
                    usize::try_from(game.0).ok().and_then(|index| games.get_mut(index))
                else {
                    return Err(RepositoryError::Corrupt {
                        line: line_number,
                        message: format!("level result for unknown game {}", game.0),
                    });
                };
                stored.levels.push(result);
            }
        }

        prev_sha256_hex = record.sha256_hex;
        next_seq += 1;
    }

    Ok(LoadedStats {
        next_game: games.len() as u64,
        games,
        created_at_unix_ms: header.created_at_unix_ms,
        last_sha256_hex: prev_sha256_hex,
        next_seq,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
