/// Score store: the persistent top-10 leaderboard.
///
/// ## Ordering
///   Entries are kept sorted by score, highest first. A new score goes after
///   any existing entries with the same score, so earlier runs keep their rank.
///
/// ## Eviction
///   A score qualifies while the table has fewer than `MAX_SCORES` entries,
///   or when it is strictly higher than the lowest stored score. At capacity
///   the lowest entry is evicted before the insert.
///
/// ## File format
///   JSON via serde_json: `{ "next_id": 4, "entries": [ {id, score, player_name}, ... ] }`.
///   Ids behave like an autoincrement column and are never reused.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

pub const MAX_SCORES: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub id: u64,
    pub score: u32,
    pub player_name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTable {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    entries: Vec<ScoreEntry>,
}

impl ScoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn qualifies(&self, score: u32) -> bool {
        if self.entries.len() < MAX_SCORES {
            return true;
        }
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Insert a score. Returns the new entry's id, or None if it did not qualify.
    pub fn insert(&mut self, score: u32, player_name: &str) -> Option<u64> {
        if !self.qualifies(score) {
            return None;
        }
        if self.entries.len() >= MAX_SCORES {
            if let Some(lowest) = self.entries.last().map(|e| e.id) {
                self.remove(lowest);
            }
        }

        self.next_id += 1;
        let id = self.next_id;
        let entry = ScoreEntry { id, score, player_name: player_name.to_string() };

        let pos = self.entries.iter().position(|e| score > e.score);
        match pos {
            Some(i) => self.entries.insert(i, entry),
            None => self.entries.push(entry),
        }
        Some(id)
    }

    /// All entries, highest score first.
    pub fn list_all(&self) -> &[ScoreEntry] {
        &self.entries
    }

    /// Remove by id. Returns the removed entry if it existed.
    pub fn remove(&mut self, id: u64) -> Option<ScoreEntry> {
        let idx = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(idx))
    }

    pub fn best(&self) -> Option<u32> {
        self.entries.first().map(|e| e.score)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Restore the ordering and size contract on data read from disk.
    fn normalize(&mut self) {
        // Stable sort keeps file order among equal scores
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(MAX_SCORES);
        let max_id = self.entries.iter().map(|e| e.id).max().unwrap_or(0);
        self.next_id = self.next_id.max(max_id);
    }
}

// ══════════════════════════════════════════════════════════════
// Persistence
// ══════════════════════════════════════════════════════════════

/// Load the table from `path`. A missing file is an empty table; so is a
/// corrupt one (with a warning). Other read errors propagate.
pub fn load(path: &Path) -> io::Result<ScoreTable> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::info!("No score file at {}, starting fresh", path.display());
            return Ok(ScoreTable::new());
        }
        Err(e) => return Err(e),
    };

    match serde_json::from_str::<ScoreTable>(&text) {
        Ok(mut table) => {
            table.normalize();
            log::info!("Loaded {} scores from {}", table.len(), path.display());
            Ok(table)
        }
        Err(e) => {
            log::warn!("score file {} is corrupt ({e}); starting fresh", path.display());
            Ok(ScoreTable::new())
        }
    }
}

/// Write the table to `path` via a temp file and rename.
pub fn save(table: &ScoreTable, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(table).map_err(io::Error::other)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    log::info!("Saved {} scores to {}", table.len(), path.display());
    Ok(())
}
