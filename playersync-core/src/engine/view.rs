//! Presentation adapter
//!
//! Turns registry and engine changes into table row operations and row
//! selections into sync toggles.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::player::{PlaybackStatus, PlayerId};
use crate::sync::SyncState;

use super::types::{Cell, CellUpdate, Column, RowData, RowId, RowSink, SyncError};

/// Player <-> row association
#[derive(Debug, Default)]
pub struct RowBinding {
    by_player: HashMap<PlayerId, RowId>,
    by_row: HashMap<RowId, PlayerId>,
}

impl RowBinding {
    pub fn bind(&mut self, player: PlayerId, row: RowId) {
        if let Some(old_row) = self.by_player.insert(player.clone(), row) {
            self.by_row.remove(&old_row);
        }
        self.by_row.insert(row, player);
    }

    pub fn row_for(&self, player: &PlayerId) -> Option<RowId> {
        self.by_player.get(player).copied()
    }

    pub fn player_for(&self, row: RowId) -> Option<&PlayerId> {
        self.by_row.get(&row)
    }

    pub fn unbind_player(&mut self, player: &PlayerId) -> Option<RowId> {
        let row = self.by_player.remove(player)?;
        self.by_row.remove(&row);
        Some(row)
    }

    pub fn len(&self) -> usize {
        self.by_player.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_player.is_empty()
    }
}

/// Worker-side half of the adapter: pushes display changes to the UI
#[derive(Clone)]
pub struct PresentationAdapter {
    sink: Arc<dyn RowSink>,
}

impl PresentationAdapter {
    pub fn new(sink: Arc<dyn RowSink>) -> Self {
        Self { sink }
    }

    /// Add a row for a newly discovered player, sync off
    pub async fn player_added(
        &self,
        player: &PlayerId,
        status: PlaybackStatus,
        title: String,
    ) -> Result<RowId, SyncError> {
        self.sink
            .add_row(RowData {
                synced: false,
                app: player.display_name().to_string(),
                status,
                title,
            })
            .await
    }

    pub async fn player_removed(&self, row: RowId) -> Result<(), SyncError> {
        self.sink.remove_row(row).await
    }

    pub async fn status_changed(&self, row: RowId, status: PlaybackStatus) -> Result<(), SyncError> {
        self.sink
            .update_cell(CellUpdate {
                row,
                column: Column::Status,
                value: Cell::from(status),
            })
            .await
    }

    pub async fn title_changed(&self, row: RowId, title: String) -> Result<(), SyncError> {
        self.sink
            .update_cell(CellUpdate {
                row,
                column: Column::Title,
                value: Cell::Text(title),
            })
            .await
    }
}

/// UI-side half of the adapter: a selected row toggles its player's sync
/// flag. Returns the player and the Sync cell to repaint.
pub fn row_selected(state: &mut SyncState, row: RowId) -> Option<(PlayerId, CellUpdate)> {
    let player = state.rows.player_for(row)?.clone();
    let synced = state.registry.toggle_sync(&player)?;
    debug!("Sync for {} is now {}", player, synced);
    Some((
        player,
        CellUpdate {
            row,
            column: Column::Sync,
            value: Cell::Synced(synced),
        },
    ))
}
