//! Status, metadata and seek handlers
//!
//! None of these hold the state lock across an `.await`: peers are
//! snapshotted under the lock, commands are issued without it, and offsets
//! are written back under the lock only for peers that are still registered.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::player::{MediaPlayer, PlaybackStatus, PlayerId};

use super::session::SyncEngine;
use super::types::SyncError;

impl SyncEngine {
    /// React to a playback status change of `id`
    pub(super) async fn handle_status(
        &self,
        id: &PlayerId,
        status: PlaybackStatus,
    ) -> Result<(), SyncError> {
        let Some((origin, row, synced)) = self.state.lock().lookup(id) else {
            debug!("Status for unknown player {}", id);
            return Ok(());
        };

        if status == PlaybackStatus::Paused
            && !self.options.propagate_pause_at_end
            && self.is_at_track_end(origin.as_ref()).await
        {
            debug!("{} paused at end of track, not propagating", id);
            return self.view.status_changed(row, status).await;
        }

        if synced {
            match status {
                PlaybackStatus::Playing => self.propagate_play(origin.as_ref()).await,
                PlaybackStatus::Paused => self.propagate_pause(origin.as_ref()).await,
                PlaybackStatus::Stopped if self.options.propagate_stop => {
                    self.propagate_stop(origin.as_ref()).await
                }
                PlaybackStatus::Stopped | PlaybackStatus::Unknown => {}
            }
        }

        self.view.status_changed(row, status).await
    }

    /// React to a metadata change of `id` (title refresh)
    pub(super) async fn handle_metadata(&self, id: &PlayerId) -> Result<(), SyncError> {
        let Some((player, row, _)) = self.state.lock().lookup(id) else {
            return Ok(());
        };

        let title = match player.title().await {
            Ok(title) => title,
            Err(e) => {
                debug!("No title for {}: {}", id, e);
                String::new()
            }
        };
        self.view.title_changed(row, title).await
    }

    /// React to `id` jumping to absolute `position`
    pub(super) async fn handle_seek(&self, id: &PlayerId, position: i64) -> Result<(), SyncError> {
        let (origin_synced, peers) = {
            let mut state = self.state.lock();
            // A seek still queued behind its player's removal must not arm the guard
            if !state.registry.contains(id) {
                debug!("Seek for unknown player {}", id);
                return Ok(());
            }
            if !state.seek_guard.try_accept(Instant::now()) {
                return Ok(());
            }
            (
                state.registry.is_synced(id).unwrap_or(false),
                state.registry.synced_peers(id),
            )
        };

        if !origin_synced {
            return Ok(());
        }

        for peer in peers {
            // No offset means this pair was never anchored
            let Some(offset) = self.state.lock().offsets.get(id, peer.id()) else {
                continue;
            };

            let current = match peer.position().await {
                Ok(current) => current,
                Err(e) => {
                    warn!("Cannot read position of {}: {}", peer.id(), e);
                    continue;
                }
            };

            let Some((target, delta)) = position
                .checked_sub(offset)
                .and_then(|target| Some((target, target.checked_sub(current)?)))
            else {
                warn!(
                    "Seek {} -> {} out of range: position={}us, offset={}us, current={}us",
                    id,
                    peer.id(),
                    position,
                    offset,
                    current
                );
                continue;
            };
            debug!(
                "Seek {} -> {}: target={}us, current={}us, delta={:+}us",
                id,
                peer.id(),
                target,
                current,
                delta
            );

            if let Err(e) = peer.seek(delta).await {
                warn!("Seek on {} failed: {}", peer.id(), e);
            }
        }

        Ok(())
    }

    /// True when the player is within the end-of-track window of its length.
    /// Unknown length never counts as end of track.
    async fn is_at_track_end(&self, player: &dyn MediaPlayer) -> bool {
        let length = match player.length().await {
            Ok(Some(length)) => length,
            Ok(None) => return false,
            Err(e) => {
                debug!("No length for {}: {}", player.id(), e);
                return false;
            }
        };
        let position = match player.position().await {
            Ok(position) => position,
            Err(e) => {
                debug!("No position for {}: {}", player.id(), e);
                return false;
            }
        };

        // Values that overflow come from a confused player; treat as mid-track
        length
            .checked_sub(position)
            .and_then(i64::checked_abs)
            .is_some_and(|remaining| remaining < self.options.end_of_track_window_us)
    }

    /// Re-anchor the whole synced group on `origin` and start every peer.
    ///
    /// Positions are sampled once up front so every offset written by this
    /// pass refers to the same instant. For each peer that can play, the
    /// offsets origin<->peer and peer<->every other peer are (re)written,
    /// then the peer is told to play. A later pass overwrites an earlier one.
    async fn propagate_play(&self, origin: &dyn MediaPlayer) {
        let peers = self.state.lock().registry.synced_peers(origin.id());
        if peers.is_empty() {
            return;
        }

        let origin_position = match origin.position().await {
            Ok(position) => position,
            Err(e) => {
                warn!("Cannot read position of {}, not propagating play: {}", origin.id(), e);
                return;
            }
        };

        let mut positions = Vec::with_capacity(peers.len());
        for peer in &peers {
            positions.push(match peer.position().await {
                Ok(position) => Some(position),
                Err(e) => {
                    warn!("Cannot read position of {}: {}", peer.id(), e);
                    None
                }
            });
        }

        for (i, peer) in peers.iter().enumerate() {
            match peer.can_play().await {
                Ok(true) => {}
                Ok(false) => {
                    debug!("{} cannot play, skipping", peer.id());
                    continue;
                }
                Err(e) => {
                    warn!("Cannot query {}: {}", peer.id(), e);
                    continue;
                }
            }

            let Some(peer_position) = positions[i] else {
                continue;
            };

            if !self.anchor(origin.id(), origin_position, &peers, &positions, i, peer_position) {
                debug!("{} vanished during propagation, skipping", peer.id());
                continue;
            }

            info!("Play {} -> {}", origin.id(), peer.id());
            if let Err(e) = peer.play().await {
                warn!("Play on {} failed: {}", peer.id(), e);
            }
        }
    }

    /// Write the offsets for peer `i`. Returns false if the peer is no longer
    /// registered.
    fn anchor(
        &self,
        origin: &PlayerId,
        origin_position: i64,
        peers: &[Arc<dyn MediaPlayer>],
        positions: &[Option<i64>],
        i: usize,
        peer_position: i64,
    ) -> bool {
        let peer = peers[i].id();
        let mut state = self.state.lock();
        if !state.registry.contains(peer) {
            return false;
        }

        state.offsets.capture(origin, origin_position, peer, peer_position);

        for (j, other) in peers.iter().enumerate() {
            if j == i || !state.registry.contains(other.id()) {
                continue;
            }
            if let Some(other_position) = positions[j] {
                state
                    .offsets
                    .capture(peer, peer_position, other.id(), other_position);
            }
        }
        true
    }

    /// Pause every synced peer that can pause; offsets go stale
    async fn propagate_pause(&self, origin: &dyn MediaPlayer) {
        let peers = self.state.lock().registry.synced_peers(origin.id());

        for peer in peers {
            match peer.can_pause().await {
                Ok(true) => {}
                Ok(false) => {
                    debug!("{} cannot pause, skipping", peer.id());
                    continue;
                }
                Err(e) => {
                    warn!("Cannot query {}: {}", peer.id(), e);
                    continue;
                }
            }

            info!("Pause {} -> {}", origin.id(), peer.id());
            if let Err(e) = peer.pause().await {
                warn!("Pause on {} failed: {}", peer.id(), e);
            }
            self.state.lock().offsets.clear();
        }
    }

    /// Stop every synced peer; offsets go stale
    async fn propagate_stop(&self, origin: &dyn MediaPlayer) {
        let peers = self.state.lock().registry.synced_peers(origin.id());

        for peer in peers {
            info!("Stop {} -> {}", origin.id(), peer.id());
            if let Err(e) = peer.stop().await {
                warn!("Stop on {} failed: {}", peer.id(), e);
            }
            self.state.lock().offsets.clear();
        }
    }
}
