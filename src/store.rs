use chrono::{DateTime, Local, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;

use crate::app_dirs::AppDirs;
use crate::error::{Error, Result};

/// Which value decides "better" on the leaderboard
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ComparisonKey {
    #[default]
    Taps,
    Tps,
}

impl ComparisonKey {
    fn column(self) -> &'static str {
        match self {
            ComparisonKey::Taps => "best_taps",
            ComparisonKey::Tps => "best_tps",
        }
    }

    pub fn value_of(self, record: &ScoreRecord) -> f64 {
        match self {
            ComparisonKey::Taps => record.best_taps as f64,
            ComparisonKey::Tps => record.best_tps,
        }
    }

    /// Descending by key, earlier record first on ties
    pub fn rank_order(self, a: &ScoreRecord, b: &ScoreRecord) -> Ordering {
        self.value_of(b)
            .partial_cmp(&self.value_of(a))
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.recorded_at.cmp(&b.recorded_at))
    }
}

/// A player's personal best
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub player_id: String,
    pub best_taps: u32,
    pub best_tps: f64,
    pub flagged: bool,
    pub recorded_at: DateTime<Local>,
}

/// Ranked storage for personal bests, keyed by player id
pub trait ScoreStore {
    fn get_best(&self, player_id: &str, key: ComparisonKey) -> Result<Option<ScoreRecord>>;
    /// Insert or overwrite the single row for `record.player_id`
    fn replace(&mut self, record: &ScoreRecord) -> Result<()>;
    fn get_top_n(&self, n: usize, key: ComparisonKey) -> Result<Vec<ScoreRecord>>;
}

impl<S: ScoreStore + ?Sized> ScoreStore for Box<S> {
    fn get_best(&self, player_id: &str, key: ComparisonKey) -> Result<Option<ScoreRecord>> {
        (**self).get_best(player_id, key)
    }

    fn replace(&mut self, record: &ScoreRecord) -> Result<()> {
        (**self).replace(record)
    }

    fn get_top_n(&self, n: usize, key: ComparisonKey) -> Result<Vec<ScoreRecord>> {
        (**self).get_top_n(n, key)
    }
}

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS scores (
        player_id TEXT PRIMARY KEY NOT NULL,
        best_taps INTEGER NOT NULL,
        best_tps REAL NOT NULL,
        flagged BOOLEAN NOT NULL DEFAULT 0,
        recorded_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_scores_best_taps ON scores(best_taps);
    CREATE INDEX IF NOT EXISTS idx_scores_best_tps ON scores(best_tps);
"#;

/// SQLite-backed store; `player_id` is the primary key so a replace is a native upsert
#[derive(Debug)]
pub struct SqliteScoreStore {
    conn: Connection,
}

impl SqliteScoreStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    /// Open the database under the user's state directory
    pub fn open_default() -> Result<Self> {
        let path = AppDirs::db_path()
            .ok_or_else(|| Error::Storage("no state directory available".to_string()))?;
        Self::open(path)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Rows stored for one player (never more than one)
    pub fn count_for(&self, player_id: &str) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM scores WHERE player_id = ?1",
            [player_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Fixed-width UTC text, so SQL string order matches time order
    fn encode_recorded_at(at: &DateTime<Local>) -> String {
        at.with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Nanos, true)
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<ScoreRecord> {
        let recorded_at: String = row.get(4)?;
        let recorded_at = DateTime::parse_from_rfc3339(&recorded_at)
            .map_err(|_| {
                rusqlite::Error::InvalidColumnType(
                    4,
                    "recorded_at".to_string(),
                    rusqlite::types::Type::Text,
                )
            })?
            .with_timezone(&Local);

        Ok(ScoreRecord {
            player_id: row.get(0)?,
            best_taps: row.get(1)?,
            best_tps: row.get(2)?,
            flagged: row.get(3)?,
            recorded_at,
        })
    }
}

impl ScoreStore for SqliteScoreStore {
    fn get_best(&self, player_id: &str, key: ComparisonKey) -> Result<Option<ScoreRecord>> {
        let sql = format!(
            "SELECT player_id, best_taps, best_tps, flagged, recorded_at
             FROM scores WHERE player_id = ?1
             ORDER BY {} DESC LIMIT 1",
            key.column()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query_map([player_id], Self::map_row)?;
        match rows.next() {
            Some(record) => Ok(Some(record?)),
            None => Ok(None),
        }
    }

    fn replace(&mut self, record: &ScoreRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO scores (player_id, best_taps, best_tps, flagged, recorded_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(player_id) DO UPDATE SET
                best_taps = excluded.best_taps,
                best_tps = excluded.best_tps,
                flagged = excluded.flagged,
                recorded_at = excluded.recorded_at
            "#,
            params![
                record.player_id,
                record.best_taps,
                record.best_tps,
                record.flagged,
                Self::encode_recorded_at(&record.recorded_at),
            ],
        )?;
        Ok(())
    }

    fn get_top_n(&self, n: usize, key: ComparisonKey) -> Result<Vec<ScoreRecord>> {
        let sql = format!(
            "SELECT player_id, best_taps, best_tps, flagged, recorded_at
             FROM scores
             ORDER BY {} DESC, recorded_at ASC
             LIMIT ?1",
            key.column()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([n as i64], Self::map_row)?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }
}

/// Process-local store used when the database cannot be opened
#[derive(Debug, Default)]
pub struct MemoryScoreStore {
    records: Vec<ScoreRecord>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn get_best(&self, player_id: &str, key: ComparisonKey) -> Result<Option<ScoreRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.player_id == player_id)
            .min_by(|a, b| key.rank_order(a, b))
            .cloned())
    }

    fn replace(&mut self, record: &ScoreRecord) -> Result<()> {
        self.records.retain(|r| r.player_id != record.player_id);
        self.records.push(record.clone());
        Ok(())
    }

    fn get_top_n(&self, n: usize, key: ComparisonKey) -> Result<Vec<ScoreRecord>> {
        let mut records = self.records.clone();
        records.sort_by(|a, b| key.rank_order(a, b));
        records.truncate(n);
        Ok(records)
    }
}
