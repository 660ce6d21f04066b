//! Player registry and shared sync state

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::engine::{RowBinding, RowId};
use crate::offsets::OffsetTable;
use crate::player::{MediaPlayer, PlayerId};
use crate::seek_guard::SeekGuard;

/// A monitored player and whether it is synced
#[derive(Clone)]
pub struct RegisteredPlayer {
    pub player: Arc<dyn MediaPlayer>,
    pub synced: bool,
}

/// Live players in discovery order
#[derive(Default)]
pub struct Registry {
    players: IndexMap<PlayerId, RegisteredPlayer>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a player with sync off. Returns false if it was already known.
    pub fn insert(&mut self, player: Arc<dyn MediaPlayer>) -> bool {
        let id = player.id().clone();
        if self.players.contains_key(&id) {
            return false;
        }
        self.players.insert(
            id,
            RegisteredPlayer {
                player,
                synced: false,
            },
        );
        true
    }

    /// Remove a player, keeping the order of the others
    pub fn remove(&mut self, id: &PlayerId) -> Option<RegisteredPlayer> {
        self.players.shift_remove(id)
    }

    pub fn get(&self, id: &PlayerId) -> Option<&RegisteredPlayer> {
        self.players.get(id)
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.players.contains_key(id)
    }

    pub fn is_synced(&self, id: &PlayerId) -> Option<bool> {
        self.players.get(id).map(|p| p.synced)
    }

    /// Flip the sync flag. Returns the new value, or None for unknown players.
    pub fn toggle_sync(&mut self, id: &PlayerId) -> Option<bool> {
        let entry = self.players.get_mut(id)?;
        entry.synced = !entry.synced;
        Some(entry.synced)
    }

    /// Synced players other than `except`, in registry order
    pub fn synced_peers(&self, except: &PlayerId) -> Vec<Arc<dyn MediaPlayer>> {
        self.players
            .iter()
            .filter(|(id, entry)| entry.synced && *id != except)
            .map(|(_, entry)| Arc::clone(&entry.player))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlayerId, &RegisteredPlayer)> {
        self.players.iter()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

/// Everything the worker and the UI both touch
pub struct SyncState {
    pub registry: Registry,
    pub rows: RowBinding,
    pub offsets: OffsetTable,
    pub seek_guard: SeekGuard,
}

impl SyncState {
    pub fn new(seek_debounce: Duration) -> Self {
        Self {
            registry: Registry::new(),
            rows: RowBinding::default(),
            offsets: OffsetTable::new(),
            seek_guard: SeekGuard::new(seek_debounce),
        }
    }

    /// Look up a player together with its row and sync flag
    pub fn lookup(&self, id: &PlayerId) -> Option<(Arc<dyn MediaPlayer>, RowId, bool)> {
        let entry = self.registry.get(id)?;
        let row = self.rows.row_for(id)?;
        Some((Arc::clone(&entry.player), row, entry.synced))
    }

    /// Drop every trace of a player. Returns its entry and row if it was known.
    pub fn forget(&mut self, id: &PlayerId) -> (Option<RegisteredPlayer>, Option<RowId>) {
        let entry = self.registry.remove(id);
        self.offsets.purge(id);
        let row = self.rows.unbind_player(id);
        (entry, row)
    }
}

/// Thread-safe wrapper for SyncState
pub type SharedSyncState = Arc<Mutex<SyncState>>;

/// Create a new shared sync state
pub fn new_shared_state(seek_debounce: Duration) -> SharedSyncState {
    Arc::new(Mutex::new(SyncState::new(seek_debounce)))
}
