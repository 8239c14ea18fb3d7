//! Storage seam and concrete stores.
//!
//! `TimerStore` is the collaborator boundary the domain layer talks to.
//! Everything above it works against the trait, so the in-memory store used
//! in tests and the SQLite store used by the CLI are interchangeable.

mod config;
mod memory;
mod sqlite;

pub use config::{Config, DatabaseConfig, IdentityConfig};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::path::PathBuf;

use crate::error::StoreError;
use crate::timer::{TimeEntry, Timer};

/// Owner-scoped persistence for timers and entries.
///
/// Every query and mutation is keyed by owner; an id that exists under a
/// different owner behaves exactly like a missing one. The two compound
/// commits must be atomic per implementation: either every row lands or
/// none does.
pub trait TimerStore: Send + Sync {
    fn insert_timer(&self, timer: &Timer) -> Result<(), StoreError>;

    fn update_timer(&self, timer: &Timer) -> Result<(), StoreError>;

    fn get_timer(&self, owner: &str, timer_id: &str) -> Result<Option<Timer>, StoreError>;

    fn list_timers(&self, owner: &str) -> Result<Vec<Timer>, StoreError>;

    /// Delete a timer and cascade to all of its entries.
    fn remove_timer(&self, owner: &str, timer_id: &str) -> Result<(), StoreError>;

    fn get_entry(&self, owner: &str, entry_id: &str) -> Result<Option<TimeEntry>, StoreError>;

    fn list_entries(&self, owner: &str) -> Result<Vec<TimeEntry>, StoreError>;

    /// Entries with `ended_at == None` for one timer.
    fn open_entries(&self, owner: &str, timer_id: &str) -> Result<Vec<TimeEntry>, StoreError>;

    fn update_entry(&self, entry: &TimeEntry) -> Result<(), StoreError>;

    /// Persist a batch of closed entries in one shot (pause path).
    fn close_entries(&self, entries: &[TimeEntry]) -> Result<(), StoreError>;

    /// Atomic close-before-open: persist `closing` (now closed), insert the
    /// freshly created timer when `start` implied one, and insert `opening`.
    fn commit_start(
        &self,
        new_timer: Option<&Timer>,
        closing: &[TimeEntry],
        opening: &TimeEntry,
    ) -> Result<(), StoreError>;

    /// Atomic end: persist `closing` (now closed) and the finalized timer,
    /// so no counted time is lost between entry close and timer end.
    fn commit_end(&self, timer: &Timer, closing: &[TimeEntry]) -> Result<(), StoreError>;
}

/// Returns `~/.config/timekeep[-dev]/` based on TIMEKEEP_ENV.
///
/// Set TIMEKEEP_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, StoreError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TIMEKEEP_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("timekeep-dev")
    } else {
        base_dir.join("timekeep")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
