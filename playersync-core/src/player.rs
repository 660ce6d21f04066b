//! Media player abstraction
//!
//! The engine only ever talks to players through [`MediaPlayer`] and learns
//! about them through [`PlayerBackend`]. The MPRIS implementation lives in
//! [`crate::mpris`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::sync::EngineEvent;

/// Well-known bus name prefix shared by every MPRIS player
pub const MPRIS_PREFIX: &str = "org.mpris.MediaPlayer2.";

/// Unique identifier for a media player (its bus name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(bus_name: impl Into<String>) -> Self {
        Self(bus_name.into())
    }

    /// Full bus name, e.g. `org.mpris.MediaPlayer2.vlc`
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short name shown to the user, e.g. `vlc`
    pub fn display_name(&self) -> &str {
        self.0.strip_prefix(MPRIS_PREFIX).unwrap_or(&self.0)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Playback status as reported by the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    Stopped,
    #[default]
    Unknown,
}

impl PlaybackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
            PlaybackStatus::Stopped => "Stopped",
            PlaybackStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur when talking to a single player
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Player {0} is gone")]
    Gone(String),

    #[error("D-Bus error: {0}")]
    Bus(zbus::Error),

    #[error("Invalid property {name}: {reason}")]
    Property { name: &'static str, reason: String },
}

/// A controllable media player.
///
/// Positions, lengths and seek offsets are in microseconds.
#[async_trait]
pub trait MediaPlayer: Send + Sync {
    fn id(&self) -> &PlayerId;

    async fn status(&self) -> Result<PlaybackStatus, PlayerError>;
    async fn title(&self) -> Result<String, PlayerError>;
    /// Absolute playback position
    async fn position(&self) -> Result<i64, PlayerError>;
    /// Track length, `None` when the player does not report one
    async fn length(&self) -> Result<Option<i64>, PlayerError>;
    async fn can_play(&self) -> Result<bool, PlayerError>;
    async fn can_pause(&self) -> Result<bool, PlayerError>;

    async fn play(&self) -> Result<(), PlayerError>;
    async fn pause(&self) -> Result<(), PlayerError>;
    async fn stop(&self) -> Result<(), PlayerError>;
    /// Seek relative to the current position
    async fn seek(&self, offset: i64) -> Result<(), PlayerError>;

    /// Stop delivering events for this player
    fn unsubscribe(&self) {}
}

/// Discovery service and event source for players
#[async_trait]
pub trait PlayerBackend: Send + Sync {
    /// Names of the players that exist right now
    async fn player_names(&self) -> Result<Vec<String>, PlayerError>;

    /// Open a player by bus name and subscribe `events` to its status,
    /// metadata and seek notifications
    async fn open(
        &self,
        name: &str,
        events: mpsc::UnboundedSender<EngineEvent>,
    ) -> Result<Arc<dyn MediaPlayer>, PlayerError>;

    /// Subscribe `events` to player appeared/vanished notifications
    async fn watch(&self, events: mpsc::UnboundedSender<EngineEvent>) -> Result<(), PlayerError>;
}
