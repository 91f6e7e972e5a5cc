//! Score log persistence.
//!
//! One [`ScoreRecord`] is appended per completed game. The log is
//! append-only; nothing is ever rewritten.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gambit_core::state::GameSummary;

/// Error type for score log operations.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Reading or writing the log failed.
    #[error("Score log I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// A record could not be encoded.
    #[error("Failed to encode score record: {0}")]
    Encode(#[from] serde_json::Error),
    /// A line in the log is not a valid record.
    #[error("Corrupt score record on line {line}: {source}")]
    Corrupt {
        /// 1-based line number.
        line: usize,
        /// Decode error.
        source: serde_json::Error,
    },
}

/// Final scores of one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Player rounds won.
    pub player_score: u32,
    /// Enemy rounds won.
    pub enemy_score: u32,
    /// Seconds since the Unix epoch when the game finished.
    pub timestamp: u64,
}

impl ScoreRecord {
    /// Record for `summary`, stamped with the current time.
    #[must_use]
    pub fn now(summary: &GameSummary) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        Self::at(summary, timestamp)
    }

    /// Record for `summary` with an explicit timestamp.
    #[must_use]
    pub fn at(summary: &GameSummary, timestamp: u64) -> Self {
        Self {
            player_score: summary.player_score,
            enemy_score: summary.enemy_score,
            timestamp,
        }
    }
}

/// Append-only store of game results.
pub trait ScoreStore {
    /// Add one record to the end of the log.
    fn append(&mut self, record: &ScoreRecord) -> Result<(), PersistenceError>;

    /// Every record, oldest first.
    fn load_all(&self) -> Result<Vec<ScoreRecord>, PersistenceError>;
}

/// In-memory store, for tests and runs without a log file.
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreStore {
    records: Vec<ScoreRecord>,
}

impl MemoryScoreStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn append(&mut self, record: &ScoreRecord) -> Result<(), PersistenceError> {
        self.records.push(*record);
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<ScoreRecord>, PersistenceError> {
        Ok(self.records.clone())
    }
}

/// File store holding one JSON object per line.
#[derive(Debug, Clone)]
pub struct JsonLinesScoreStore {
    path: PathBuf,
}

impl JsonLinesScoreStore {
    /// Store backed by `path`. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Log file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScoreStore for JsonLinesScoreStore {
    fn append(&mut self, record: &ScoreRecord) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        tracing::debug!(path = %self.path.display(), "Score record appended");
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<ScoreRecord>, PersistenceError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(std::fs::File::open(&self.path)?);
        let mut records = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|source| {
                PersistenceError::Corrupt {
                    line: index + 1,
                    source,
                }
            })?;
            records.push(record);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gambit_core::combatant::Side;

    fn summary(player: u32, enemy: u32) -> GameSummary {
        GameSummary {
            rounds: player + enemy,
            player_score: player,
            enemy_score: enemy,
            winner: (player != enemy).then(|| if player > enemy { Side::Player } else { Side::Enemy }),
        }
    }

    #[test]
    fn test_memory_store_keeps_order() {
        let mut store = MemoryScoreStore::new();
        store.append(&ScoreRecord::at(&summary(2, 1), 10)).unwrap();
        store.append(&ScoreRecord::at(&summary(0, 3), 20)).unwrap();

        let records = store.load_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].player_score, 2);
        assert_eq!(records[1].timestamp, 20);
    }

    #[test]
    fn test_json_lines_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("scores.jsonl");
        let mut store = JsonLinesScoreStore::new(&path);
        assert!(store.load_all().unwrap().is_empty());

        store.append(&ScoreRecord::at(&summary(2, 1), 100)).unwrap();
        // A fresh handle sees earlier records and appends after them.
        let mut reopened = JsonLinesScoreStore::new(&path);
        reopened.append(&ScoreRecord::at(&summary(1, 2), 200)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert_eq!(
            text.lines().next().unwrap(),
            r#"{"player_score":2,"enemy_score":1,"timestamp":100}"#
        );

        let records = reopened.load_all().unwrap();
        assert_eq!(
            records,
            vec![
                ScoreRecord::at(&summary(2, 1), 100),
                ScoreRecord::at(&summary(1, 2), 200),
            ]
        );
    }

    #[test]
    fn test_corrupt_line_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.jsonl");
        std::fs::write(
            &path,
            "{\"player_score\":1,\"enemy_score\":2,\"timestamp\":5}\nnot json\n",
        )
        .unwrap();

        let err = JsonLinesScoreStore::new(&path).load_all().unwrap_err();
        assert!(matches!(err, PersistenceError::Corrupt { line: 2, .. }));
    }

    #[test]
    fn test_now_uses_summary_scores() {
        let record = ScoreRecord::now(&summary(3, 0));
        assert_eq!((record.player_score, record.enemy_score), (3, 0));
        assert!(record.timestamp > 0);
    }
}
