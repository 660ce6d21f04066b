//! Engine session: owns the event queue and the shared state

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::SyncOptions;
use crate::player::{MediaPlayer, PlaybackStatus, PlayerBackend, PlayerId};
use crate::sync::{new_shared_state, EngineEvent, SharedSyncState};

use super::types::{CellUpdate, RowId, RowSink, SyncError};
use super::view::{row_selected, PresentationAdapter};

/// The sync engine. Runs on the worker; see [`SyncEngine::run`].
pub struct SyncEngine {
    pub(super) backend: Arc<dyn PlayerBackend>,
    pub(super) view: PresentationAdapter,
    pub(super) state: SharedSyncState,
    pub(super) options: SyncOptions,
    events_tx: mpsc::UnboundedSender<EngineEvent>,
    events_rx: mpsc::UnboundedReceiver<EngineEvent>,
    shutdown_rx: oneshot::Receiver<()>,
}

/// Handle for the UI thread: sync toggles and shutdown
#[derive(Clone)]
pub struct SyncHandle {
    state: SharedSyncState,
    shutdown_tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl SyncHandle {
    /// A row was selected: toggle that player's sync flag.
    /// Returns the player and the Sync cell to repaint, or None for an
    /// unknown row.
    pub fn toggle_row(&self, row: RowId) -> Option<(PlayerId, CellUpdate)> {
        let mut state = self.state.lock();
        let toggled = row_selected(&mut state, row);
        if let Some((player, update)) = &toggled {
            info!("Sync toggled for {}: {}", player, update.value.text());
        }
        toggled
    }

    /// Ask the engine loop to stop. Safe to call more than once.
    pub fn shutdown(&self) {
        if let Some(tx) = self.shutdown_tx.lock().take() {
            let _ = tx.send(());
        }
    }
}

impl SyncEngine {
    pub fn new(
        backend: Arc<dyn PlayerBackend>,
        sink: Arc<dyn RowSink>,
        options: SyncOptions,
    ) -> (Self, SyncHandle) {
        let state = new_shared_state(options.seek_debounce());
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = SyncHandle {
            state: Arc::clone(&state),
            shutdown_tx: Arc::new(Mutex::new(Some(shutdown_tx))),
        };

        let engine = Self {
            backend,
            view: PresentationAdapter::new(sink),
            state,
            options,
            events_tx,
            events_rx,
            shutdown_rx,
        };

        (engine, handle)
    }

    /// Sender feeding this engine's event queue
    pub fn events(&self) -> mpsc::UnboundedSender<EngineEvent> {
        self.events_tx.clone()
    }

    /// Subscribe to discovery, add the players that already exist, then
    /// handle events until shutdown is requested or the UI goes away.
    pub async fn run(mut self) -> Result<(), SyncError> {
        self.backend.watch(self.events_tx.clone()).await?;

        for name in self.backend.player_names().await? {
            match self.add_player(&name).await {
                Ok(_) => {}
                Err(SyncError::UiClosed) => return Ok(()),
                Err(e) => warn!("Failed to add player {}: {}", name, e),
            }
        }

        info!("Sync engine running");

        loop {
            let event = tokio::select! {
                _ = &mut self.shutdown_rx => {
                    info!("Sync engine shutting down");
                    None
                }
                event = self.events_rx.recv() => event,
            };
            let Some(event) = event else {
                break;
            };

            match self.handle_event(event).await {
                Ok(()) => {}
                Err(SyncError::UiClosed) => {
                    info!("UI closed, stopping sync engine");
                    break;
                }
                Err(e) => warn!("Event handling failed: {}", e),
            }
        }

        self.unsubscribe_all();
        Ok(())
    }

    /// Handle a single event
    pub async fn handle_event(&self, event: EngineEvent) -> Result<(), SyncError> {
        debug!("Event: {:?}", event);

        match event {
            EngineEvent::PlayerAppeared { name } => match self.add_player(&name).await {
                Err(SyncError::Backend(e)) => {
                    warn!("Failed to add player {}: {}", name, e);
                    Ok(())
                }
                other => other.map(|_| ()),
            },
            EngineEvent::PlayerVanished { player } => self.remove_player(&player).await,
            EngineEvent::StatusChanged { player, status } => self.handle_status(&player, status).await,
            EngineEvent::MetadataChanged { player } => self.handle_metadata(&player).await,
            EngineEvent::Seeked { player, position } => self.handle_seek(&player, position).await,
        }
    }

    /// Open and subscribe to a player, register it with sync off and give it
    /// a row. Adding a known player returns the existing handle.
    pub async fn add_player(&self, name: &str) -> Result<Arc<dyn MediaPlayer>, SyncError> {
        let id = PlayerId::new(name);
        if let Some(existing) = self.state.lock().registry.get(&id) {
            debug!("Player {} already registered", id);
            return Ok(Arc::clone(&existing.player));
        }

        let player = self.backend.open(name, self.events_tx.clone()).await?;

        let status = player.status().await.unwrap_or_else(|e| {
            debug!("No status for {}: {}", id, e);
            PlaybackStatus::Unknown
        });
        let title = player.title().await.unwrap_or_default();

        let row = match self.view.player_added(player.id(), status, title).await {
            Ok(row) => row,
            Err(e) => {
                player.unsubscribe();
                return Err(e);
            }
        };

        {
            let mut state = self.state.lock();
            state.registry.insert(Arc::clone(&player));
            state.rows.bind(player.id().clone(), row);
        }

        info!("Player added: {} ({})", player.id(), status);
        Ok(player)
    }

    /// Forget a player: sync flag, offsets, row. Idempotent.
    pub async fn remove_player(&self, id: &PlayerId) -> Result<(), SyncError> {
        let (entry, row) = self.state.lock().forget(id);

        if let Some(entry) = entry {
            entry.player.unsubscribe();
            info!("Player removed: {}", id);
        }

        if let Some(row) = row {
            self.view.player_removed(row).await?;
        }
        Ok(())
    }

    fn unsubscribe_all(&self) {
        for (_, entry) in self.state.lock().registry.iter() {
            entry.player.unsubscribe();
        }
    }
}
