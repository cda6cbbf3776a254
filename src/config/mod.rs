//! Configuration Management
//!
//! This module loads and saves the settings that tell Roster where its
//! database lives and what the tool server may do.
//!
//! # Configuration Locations
//! - Local: `.roster/config.json` (per working directory)
//! - Global: `~/.config/roster/config.json` (per user)
//!
//! # Resolution Precedence (lowest to highest)
//! 1. Built-in defaults
//! 2. Global config file
//! 3. Local config file
//! 4. `ROSTER_DB` environment variable (database path only)
//! 5. Explicit `--db` flag
//!
//! Files are partial: any field a file leaves out falls through to the layer below.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::capability::{Capabilities, DEFAULT_MAX_ROWS};
use crate::error::{Result, RosterError};
use crate::store::Gateway;

/// Environment variable overriding the database path
pub const DB_ENV_VAR: &str = "ROSTER_DB";

/// Database file used when nothing else is configured
pub const DEFAULT_DATABASE: &str = "employees.db";

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Settings as stored in a config file, every field optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,

    /// Seed sample rows when the database file is first created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_sample_data: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub busy_timeout_ms: Option<u64>,

    /// Let `execute_sql` run INSERT / UPDATE / DELETE / REPLACE
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_sql_writes: Option<bool>,

    /// Row cap for `execute_sql` reads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<usize>,
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub database: PathBuf,
    pub seed_sample_data: bool,
    pub busy_timeout_ms: u64,
    pub allow_sql_writes: bool,
    pub max_rows: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            seed_sample_data: true,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            allow_sql_writes: false,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

impl Settings {
    /// Overlay every field `file` sets
    pub fn apply(&mut self, file: &SettingsFile) {
        if let Some(database) = &file.database {
            self.database.clone_from(database);
        }
        if let Some(seed) = file.seed_sample_data {
            self.seed_sample_data = seed;
        }
        if let Some(timeout) = file.busy_timeout_ms {
            self.busy_timeout_ms = timeout;
        }
        if let Some(allow) = file.allow_sql_writes {
            self.allow_sql_writes = allow;
        }
        if let Some(max_rows) = file.max_rows {
            self.max_rows = max_rows;
        }
    }

    /// Gateway for the configured database
    #[must_use]
    pub fn gateway(&self) -> Gateway {
        Gateway::new(&self.database).with_busy_timeout(self.busy_timeout_ms)
    }

    /// Raw SQL capabilities for the tool server
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            allow_write: self.allow_sql_writes,
            max_rows: self.max_rows,
        }
    }

    /// Every field, in file form
    #[must_use]
    pub fn to_file(&self) -> SettingsFile {
        SettingsFile {
            database: Some(self.database.clone()),
            seed_sample_data: Some(self.seed_sample_data),
            busy_timeout_ms: Some(self.busy_timeout_ms),
            allow_sql_writes: Some(self.allow_sql_writes),
            max_rows: Some(self.max_rows),
        }
    }
}

/// Configuration file location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLocation {
    /// `.roster/config.json` in the current directory
    Local,
    /// `~/.config/roster/config.json`
    Global,
}

/// Get path to local config file (`.roster/config.json`)
pub fn local_config_path() -> Result<PathBuf> {
    let current_dir = std::env::current_dir().map_err(|e| {
        RosterError::config_error(format!("Could not determine current directory: {e}"))
    })?;

    Ok(current_dir.join(".roster").join("config.json"))
}

/// Get path to global config file (`~/.config/roster/config.json`)
pub fn global_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| RosterError::config_error("Could not determine user config directory"))?;

    Ok(config_dir.join("roster").join("config.json"))
}

pub fn config_path(location: ConfigLocation) -> Result<PathBuf> {
    match location {
        ConfigLocation::Local => local_config_path(),
        ConfigLocation::Global => global_config_path(),
    }
}

/// Load a settings file; a missing file is an empty one
pub fn load_file(path: &Path) -> Result<SettingsFile> {
    if !path.exists() {
        return Ok(SettingsFile::default());
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        RosterError::config_error(format!("Could not read config file {}: {e}", path.display()))
    })?;

    serde_json::from_str(&contents).map_err(|e| {
        RosterError::config_error(format!("Invalid config file {}: {e}", path.display()))
    })
}

/// Write a settings file, creating its directory if needed
pub fn save_file(path: &Path, file: &SettingsFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            RosterError::config_error(format!("Could not create config directory: {e}"))
        })?;
    }

    let contents = serde_json::to_string_pretty(file)
        .map_err(|e| RosterError::config_error(format!("Could not serialize config: {e}")))?;

    fs::write(path, contents)
        .map_err(|e| RosterError::config_error(format!("Could not write config file: {e}")))
}

/// Resolve settings from explicit layers
///
/// `global` and `local` are config file paths (missing files are skipped),
/// `env_db` is the value of [`DB_ENV_VAR`], `cli_db` the `--db` flag.
pub fn resolve_from(
    global: Option<&Path>,
    local: Option<&Path>,
    env_db: Option<String>,
    cli_db: Option<&Path>,
) -> Result<Settings> {
    let mut settings = Settings::default();

    for path in [global, local].into_iter().flatten() {
        let file = load_file(path)?;
        debug!(path = %path.display(), ?file, "applying config file");
        settings.apply(&file);
    }

    if let Some(db) = env_db.filter(|db| !db.trim().is_empty()) {
        settings.database = PathBuf::from(db);
    }

    if let Some(db) = cli_db {
        settings.database = db.to_path_buf();
    }

    if settings.max_rows == 0 {
        return Err(RosterError::config_error("max_rows must be at least 1"));
    }

    Ok(settings)
}

/// Resolve settings with the standard locations and the process environment
pub fn resolve_settings(cli_db: Option<&Path>) -> Result<Settings> {
    // No home directory just means no global layer
    let global = global_config_path().ok();
    let local = local_config_path()?;

    resolve_from(global.as_deref(), Some(&local), std::env::var(DB_ENV_VAR).ok(), cli_db)
}

/// Persist resolved settings to `location`, returning the file written
pub fn save_settings(settings: &Settings, location: ConfigLocation) -> Result<PathBuf> {
    let path = config_path(location)?;
    save_file(&path, &settings.to_file())?;
    Ok(path)
}
