//! Engine events
//!
//! Everything the engine reacts to arrives as an [`EngineEvent`] on a single
//! queue, so events are handled one at a time in arrival order.

use crate::player::{PlaybackStatus, PlayerId};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    // === Discovery ===
    /// A player with this bus name showed up
    PlayerAppeared { name: String },

    /// A player went away
    PlayerVanished { player: PlayerId },

    // === Per-player notifications ===
    /// Playback status changed
    StatusChanged {
        player: PlayerId,
        status: PlaybackStatus,
    },

    /// Track metadata changed (title may differ)
    MetadataChanged { player: PlayerId },

    /// Player jumped to a new absolute position (microseconds)
    Seeked { player: PlayerId, position: i64 },
}
