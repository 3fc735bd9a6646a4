//! Session ids and the expiring in-memory session store.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

use crate::entropy::runtime_entropy;

/// Sessions idle longer than this are eligible for eviction.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Opaque 128-bit session handle, rendered as 32 hex digits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u128);

impl SessionId {
    pub fn generate() -> Self {
        Self((u128::from(runtime_entropy()) << 64) | u128::from(runtime_entropy()))
    }

    pub fn from_raw(raw: u128) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseSessionIdError;

impl fmt::Display for ParseSessionIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session ids are exactly 32 hex digits")
    }
}

impl std::error::Error for ParseSessionIdError {}

impl FromStr for SessionId {
    type Err = ParseSessionIdError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if text.len() != 32 || !text.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return Err(ParseSessionIdError);
        }
        let raw = u128::from_str_radix(text, 16).map_err(|_| ParseSessionIdError)?;
        Ok(Self(raw))
    }
}

impl Serialize for SessionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

/// Storage seam for live sessions.
///
/// Reads and writes refresh the idle clock; only `expire_idle` drops
/// entries, so callers control when sweeps happen.
pub trait SessionStore {
    type State;

    fn create(&mut self, id: SessionId, state: Self::State, now: Instant);

    fn get(&mut self, id: SessionId, now: Instant) -> Option<&Self::State>;

    fn update<T>(
        &mut self,
        id: SessionId,
        now: Instant,
        apply: impl FnOnce(&mut Self::State) -> T,
    ) -> Option<T>;

    fn delete(&mut self, id: SessionId) -> Option<Self::State>;

    /// Drops every entry idle longer than the store's window and reports
    /// how many were dropped.
    fn expire_idle(&mut self, now: Instant) -> usize;
}

struct StoredEntry<S> {
    state: S,
    last_touched: Instant,
}

/// Single-process store that forgets sessions after a fixed idle window.
pub struct MemoryStore<S> {
    entries: HashMap<SessionId, StoredEntry<S>>,
    ttl: Duration,
}

impl<S> MemoryStore<S> {
    pub fn new(ttl: Duration) -> Self {
        Self { entries: HashMap::new(), ttl }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl<S> Default for MemoryStore<S> {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

impl<S> SessionStore for MemoryStore<S> {
    type State = S;

    fn create(&mut self, id: SessionId, state: S, now: Instant) {
        self.entries.insert(id, StoredEntry { state, last_touched: now });
    }

    fn get(&mut self, id: SessionId, now: Instant) -> Option<&S> {
        let entry = self.entries.get_mut(&id)?;
        entry.last_touched = now;
        Some(&entry.state)
    }

    fn update<T>(
        &mut self,
        id: SessionId,
        now: Instant,
        apply: impl FnOnce(&mut S) -> T,
    ) -> Option<T> {
        let entry = self.entries.get_mut(&id)?;
        entry.last_touched = now;
        Some(apply(&mut entry.state))
    }

    fn delete(&mut self, id: SessionId) -> Option<S> {
        self.entries.remove(&id).map(|entry| entry.state)
    }

    fn expire_idle(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.last_touched) <= ttl);
        before - self.entries.len()
    }
}
