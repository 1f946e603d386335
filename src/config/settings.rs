use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SpwdError};
use crate::policy::{Mode, RngKind};

/// Tool-level configuration, loaded from `<data_dir>/spwd.toml`.
///
/// Every field has a sensible default so spwd works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Store file name (relative to the data directory).
    #[serde(default = "default_database_file")]
    pub database_file: String,

    /// Key config file name (relative to the data directory).
    #[serde(default = "default_key_file")]
    pub key_file: String,

    /// Mode used when `generate` gets no `--mode`.
    #[serde(default = "default_mode")]
    pub default_mode: String,

    /// Length used when `generate` gets no `--length`.
    #[serde(default = "default_length")]
    pub default_length: usize,

    /// Randomness source for generated passwords.
    #[serde(default)]
    pub rng: RngKind,

    /// How long to wait for another process holding the store lock.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_database_file() -> String {
    "passwords.db".to_string()
}

fn default_key_file() -> String {
    "config.json".to_string()
}

fn default_mode() -> String {
    "medium".to_string()
}

fn default_length() -> usize {
    12
}

fn default_lock_timeout_ms() -> u64 {
    1_000
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_file: default_database_file(),
            key_file: default_key_file(),
            default_mode: default_mode(),
            default_length: default_length(),
            rng: RngKind::default(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the data directory.
    pub const FILE_NAME: &'static str = "spwd.toml";

    /// Load settings from `<data_dir>/spwd.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            SpwdError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Full path to the store file, e.g. `data_dir/passwords.db`.
    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.database_file)
    }

    /// Full path to the key config, e.g. `data_dir/config.json`.
    pub fn key_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.key_file)
    }

    /// The configured default mode, validated.
    pub fn mode(&self) -> Result<Mode> {
        Mode::parse(&self.default_mode)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
