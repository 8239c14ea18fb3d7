pub mod config;
pub mod entry;
pub mod stats;
pub mod timer;

use timekeep_core::storage::{Config, SqliteStore};
use timekeep_core::Tracker;

/// Open the tracker over the configured SQLite database.
pub fn open_tracker() -> Result<Tracker<SqliteStore>, Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let store = SqliteStore::open_at(&config.database_path()?)?;
    Ok(Tracker::new(store))
}

/// Owner every call is scoped to: `TIMEKEEP_OWNER` env wins over the config.
pub fn resolve_owner() -> String {
    Config::load_or_default().resolve_owner()
}
