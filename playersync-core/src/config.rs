//! Runtime configuration
//!
//! Options are read from an optional TOML file; the binary then applies
//! command-line overrides on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Default end-of-track window (0.5s)
pub const DEFAULT_END_OF_TRACK_WINDOW_US: i64 = 500_000;

/// Default seek debounce window
pub const DEFAULT_SEEK_DEBOUNCE_MS: u64 = 1000;

/// Config file name inside the config directory
const CONFIG_FILE: &str = "config.toml";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// How the engine propagates events between synced players
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    /// Mirror Stopped to the other synced players
    pub propagate_stop: bool,
    /// Mirror pauses that happen at the very end of a track
    pub propagate_pause_at_end: bool,
    /// A pause this close to the track length counts as end-of-track (us)
    pub end_of_track_window_us: i64,
    /// Seek notifications closer together than this are dropped (ms)
    pub seek_debounce_ms: u64,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            propagate_stop: false,
            propagate_pause_at_end: false,
            end_of_track_window_us: DEFAULT_END_OF_TRACK_WINDOW_US,
            seek_debounce_ms: DEFAULT_SEEK_DEBOUNCE_MS,
        }
    }
}

impl SyncOptions {
    pub fn seek_debounce(&self) -> Duration {
        Duration::from_millis(self.seek_debounce_ms)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load options from `path`, or from the default location if it exists.
    /// Falls back to defaults when no file is found at the default location.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => {
                    debug!("No config file, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        debug!("Loaded config from {}", path.display());
        Self::from_toml_str(&text)
    }
}

/// `$XDG_CONFIG_HOME/playersync/config.toml`, falling back to `~/.config`
pub fn default_config_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("playersync").join(CONFIG_FILE))
}
