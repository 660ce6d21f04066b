//! playersync - Core Library
//!
//! This library keeps several local media players (MPRIS over D-Bus) in
//! synchronized playback: when one synced player plays, pauses, stops or
//! seeks, the other synced players follow while keeping their relative
//! offsets.

pub mod config;
pub mod engine;
pub mod logging;
pub mod mpris;
pub mod offsets;
pub mod player;
pub mod seek_guard;
pub mod sync;

// Re-exports for convenience
pub use config::{ConfigError, SyncOptions};
pub use engine::{Cell, Column, RowData, RowId, RowSink, SyncEngine, SyncError, SyncHandle};
pub use mpris::MprisBackend;
pub use player::{MediaPlayer, PlaybackStatus, PlayerBackend, PlayerError, PlayerId};
pub use sync::EngineEvent;
