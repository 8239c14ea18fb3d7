//! SQLite-backed store.
//!
//! Timers and entries live in two tables keyed by owner. Timestamps are
//! stored as RFC3339 text, tags as a JSON array. The compound commits run
//! inside one transaction each, which is what makes `start` and `end`
//! atomic at the persistence layer.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::error::StoreError;
use crate::storage::{data_dir, TimerStore};
use crate::timer::{TimeEntry, Timer};

/// SQLite implementation of [`TimerStore`].
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open the database at `~/.config/timekeep[-dev]/timekeep.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let path = data_dir()?.join("timekeep.db");
        Self::open_at(&path)
    }

    /// Open (or create) the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: PathBuf::from(path),
            source,
        })?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        tracing::debug!("opened sqlite store at {}", path.display());
        Ok(store)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::from)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS timers (
                id           TEXT PRIMARY KEY,
                owner_id     TEXT NOT NULL,
                name         TEXT NOT NULL,
                tags         TEXT NOT NULL DEFAULT '[]',
                created_at   TEXT NOT NULL,
                finalized_at TEXT
            );

            CREATE TABLE IF NOT EXISTS entries (
                id               TEXT PRIMARY KEY,
                owner_id         TEXT NOT NULL,
                timer_id         TEXT NOT NULL,
                name             TEXT NOT NULL,
                started_at       TEXT NOT NULL,
                ended_at         TEXT,
                duration_minutes INTEGER NOT NULL DEFAULT 0,
                notes            TEXT
            );

            -- Covering indexes for the owner-scoped scans
            CREATE INDEX IF NOT EXISTS idx_timers_owner ON timers(owner_id);
            CREATE INDEX IF NOT EXISTS idx_entries_owner ON entries(owner_id);
            CREATE INDEX IF NOT EXISTS idx_entries_timer ON entries(owner_id, timer_id);
            CREATE INDEX IF NOT EXISTS idx_entries_open ON entries(owner_id, timer_id, ended_at);",
        )
        .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn upsert_timer(conn: &Connection, timer: &Timer) -> Result<(), StoreError> {
        let tags = serde_json::to_string(&timer.tags)?;
        conn.execute(
            "INSERT OR REPLACE INTO timers (id, owner_id, name, tags, created_at, finalized_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                timer.id,
                timer.owner_id,
                timer.name,
                tags,
                timer.created_at.to_rfc3339(),
                timer.finalized_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    fn upsert_entry(conn: &Connection, entry: &TimeEntry) -> Result<(), rusqlite::Error> {
        conn.execute(
            "INSERT OR REPLACE INTO entries
             (id, owner_id, timer_id, name, started_at, ended_at, duration_minutes, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entry.id,
                entry.owner_id,
                entry.timer_id,
                entry.name,
                entry.started_at.to_rfc3339(),
                entry.ended_at.map(|t| t.to_rfc3339()),
                entry.duration_minutes,
                entry.notes,
            ],
        )?;
        Ok(())
    }
}

fn parse_ts(idx: usize, raw: String) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn row_to_timer(row: &Row<'_>) -> Result<Timer, rusqlite::Error> {
    let tags_json: String = row.get(3)?;
    let tags: BTreeSet<String> = serde_json::from_str(&tags_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let created_at = parse_ts(4, row.get::<_, String>(4)?)?;
    let finalized_at = row
        .get::<_, Option<String>>(5)?
        .map(|raw| parse_ts(5, raw))
        .transpose()?;
    Ok(Timer {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        tags,
        created_at,
        finalized_at,
    })
}

fn row_to_entry(row: &Row<'_>) -> Result<TimeEntry, rusqlite::Error> {
    let started_at = parse_ts(4, row.get::<_, String>(4)?)?;
    let ended_at = row
        .get::<_, Option<String>>(5)?
        .map(|raw| parse_ts(5, raw))
        .transpose()?;
    Ok(TimeEntry {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        timer_id: row.get(2)?,
        name: row.get(3)?,
        started_at,
        ended_at,
        duration_minutes: row.get(6)?,
        notes: row.get(7)?,
    })
}

const TIMER_COLS: &str = "id, owner_id, name, tags, created_at, finalized_at";
const ENTRY_COLS: &str = "id, owner_id, timer_id, name, started_at, ended_at, duration_minutes, notes";

impl TimerStore for SqliteStore {
    fn insert_timer(&self, timer: &Timer) -> Result<(), StoreError> {
        let conn = self.lock()?;
        Self::upsert_timer(&conn, timer)?;
        Ok(())
    }

    fn update_timer(&self, timer: &Timer) -> Result<(), StoreError> {
        let conn = self.lock()?;
        Self::upsert_timer(&conn, timer)?;
        Ok(())
    }

    fn get_timer(&self, owner: &str, timer_id: &str) -> Result<Option<Timer>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TIMER_COLS} FROM timers WHERE id = ?1 AND owner_id = ?2"
        ))?;
        match stmt.query_row(params![timer_id, owner], row_to_timer) {
            Ok(timer) => Ok(Some(timer)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list_timers(&self, owner: &str) -> Result<Vec<Timer>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TIMER_COLS} FROM timers WHERE owner_id = ?1"
        ))?;
        let rows = stmt.query_map(params![owner], row_to_timer)?;
        let timers = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(timers)
    }

    fn remove_timer(&self, owner: &str, timer_id: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM entries WHERE timer_id = ?1 AND owner_id = ?2",
            params![timer_id, owner],
        )?;
        tx.execute(
            "DELETE FROM timers WHERE id = ?1 AND owner_id = ?2",
            params![timer_id, owner],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn get_entry(&self, owner: &str, entry_id: &str) -> Result<Option<TimeEntry>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLS} FROM entries WHERE id = ?1 AND owner_id = ?2"
        ))?;
        match stmt.query_row(params![entry_id, owner], row_to_entry) {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list_entries(&self, owner: &str) -> Result<Vec<TimeEntry>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLS} FROM entries WHERE owner_id = ?1"
        ))?;
        let rows = stmt.query_map(params![owner], row_to_entry)?;
        let entries = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn open_entries(&self, owner: &str, timer_id: &str) -> Result<Vec<TimeEntry>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLS} FROM entries
             WHERE owner_id = ?1 AND timer_id = ?2 AND ended_at IS NULL"
        ))?;
        let rows = stmt.query_map(params![owner, timer_id], row_to_entry)?;
        let entries = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn update_entry(&self, entry: &TimeEntry) -> Result<(), StoreError> {
        let conn = self.lock()?;
        Self::upsert_entry(&conn, entry)?;
        Ok(())
    }

    fn close_entries(&self, entries: &[TimeEntry]) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        for entry in entries {
            Self::upsert_entry(&tx, entry)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn commit_start(
        &self,
        new_timer: Option<&Timer>,
        closing: &[TimeEntry],
        opening: &TimeEntry,
    ) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        if let Some(timer) = new_timer {
            Self::upsert_timer(&tx, timer)?;
        }
        for entry in closing {
            Self::upsert_entry(&tx, entry)?;
        }
        Self::upsert_entry(&tx, opening)?;
        tx.commit()?;
        Ok(())
    }

    fn commit_end(&self, timer: &Timer, closing: &[TimeEntry]) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        for entry in closing {
            Self::upsert_entry(&tx, entry)?;
        }
        Self::upsert_timer(&tx, timer)?;
        tx.commit()?;
        Ok(())
    }
}
