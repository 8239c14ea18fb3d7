//! TOML-based application configuration.
//!
//! Stores the local identity (owner id used to scope every store call) and
//! an optional database path override.
//!
//! Configuration is stored at `~/.config/timekeep/config.toml`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{Result, StoreError};

/// Identity configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Owner id every CLI call is scoped to.
    #[serde(default = "default_owner")]
    pub owner: String,
}

/// Database configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path override for the SQLite database file (optional).
    #[serde(default)]
    pub path: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/timekeep/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

fn default_owner() -> String {
    "local".to_string()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            identity: IdentityConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, StoreError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(StoreError::from)?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(StoreError::from)?;
        std::fs::write(Self::path()?, content).map_err(StoreError::from)?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Owner to scope CLI calls to: `TIMEKEEP_OWNER` env wins over the
    /// configured identity.
    pub fn resolve_owner(&self) -> String {
        std::env::var("TIMEKEEP_OWNER").unwrap_or_else(|_| self.identity.owner.clone())
    }

    /// Database file path: configured override or the default under
    /// [`data_dir`].
    pub fn database_path(&self) -> Result<PathBuf, StoreError> {
        match &self.database.path {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(data_dir()?.join("timekeep.db")),
        }
    }
}
