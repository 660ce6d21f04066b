//! In-memory players, backend and row sink for engine tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::config::SyncOptions;
use crate::player::{PlaybackStatus, PlayerBackend, PlayerError, PlayerId};
use crate::sync::EngineEvent;

pub use crate::player::MediaPlayer;

use super::session::{SyncEngine, SyncHandle};
use super::types::{CellUpdate, Column, RowData, RowId, RowSink, SyncError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Play,
    Pause,
    Stop,
    Seek(i64),
}

#[derive(Debug, Clone)]
pub struct FakeState {
    pub position: i64,
    pub length: Option<i64>,
    pub can_play: bool,
    pub can_pause: bool,
    pub status: PlaybackStatus,
    pub title: String,
    /// Commands return an error and are not recorded
    pub fail_commands: bool,
    /// Property reads return an error
    pub fail_queries: bool,
}

type Hook = Box<dyn FnMut() + Send>;

pub struct FakePlayer {
    id: PlayerId,
    state: Mutex<FakeState>,
    commands: Mutex<Vec<Command>>,
    unsubscribed: AtomicBool,
    on_can_play: Mutex<Option<Hook>>,
}

impl FakePlayer {
    pub fn new(name: &str, position: i64) -> Self {
        Self {
            id: PlayerId::new(name),
            state: Mutex::new(FakeState {
                position,
                length: None,
                can_play: true,
                can_pause: true,
                status: PlaybackStatus::Paused,
                title: format!("{} track", name),
                fail_commands: false,
                fail_queries: false,
            }),
            commands: Mutex::new(Vec::new()),
            unsubscribed: AtomicBool::new(false),
            on_can_play: Mutex::new(None),
        }
    }

    pub fn set(&self, f: impl FnOnce(&mut FakeState)) {
        f(&mut self.state.lock());
    }

    /// Run `hook` every time the engine asks whether this player can play
    pub fn on_can_play(&self, hook: impl FnMut() + Send + 'static) {
        *self.on_can_play.lock() = Some(Box::new(hook));
    }

    pub fn commands(&self) -> Vec<Command> {
        self.commands.lock().clone()
    }

    pub fn is_unsubscribed(&self) -> bool {
        self.unsubscribed.load(Ordering::SeqCst)
    }

    fn query<T>(&self, f: impl FnOnce(&FakeState) -> T) -> Result<T, PlayerError> {
        let state = self.state.lock();
        if state.fail_queries {
            return Err(PlayerError::Gone(self.id.to_string()));
        }
        Ok(f(&state))
    }

    fn command(&self, command: Command) -> Result<(), PlayerError> {
        let mut state = self.state.lock();
        if state.fail_commands {
            return Err(PlayerError::Gone(self.id.to_string()));
        }
        match command {
            Command::Play => state.status = PlaybackStatus::Playing,
            Command::Pause => state.status = PlaybackStatus::Paused,
            Command::Stop => state.status = PlaybackStatus::Stopped,
            Command::Seek(delta) => state.position += delta,
        }
        self.commands.lock().push(command);
        Ok(())
    }
}

#[async_trait]
impl MediaPlayer for FakePlayer {
    fn id(&self) -> &PlayerId {
        &self.id
    }

    async fn status(&self) -> Result<PlaybackStatus, PlayerError> {
        self.query(|s| s.status)
    }

    async fn title(&self) -> Result<String, PlayerError> {
        self.query(|s| s.title.clone())
    }

    async fn position(&self) -> Result<i64, PlayerError> {
        self.query(|s| s.position)
    }

    async fn length(&self) -> Result<Option<i64>, PlayerError> {
        self.query(|s| s.length)
    }

    async fn can_play(&self) -> Result<bool, PlayerError> {
        if let Some(hook) = self.on_can_play.lock().as_mut() {
            hook();
        }
        self.query(|s| s.can_play)
    }

    async fn can_pause(&self) -> Result<bool, PlayerError> {
        self.query(|s| s.can_pause)
    }

    async fn play(&self) -> Result<(), PlayerError> {
        self.command(Command::Play)
    }

    async fn pause(&self) -> Result<(), PlayerError> {
        self.command(Command::Pause)
    }

    async fn stop(&self) -> Result<(), PlayerError> {
        self.command(Command::Stop)
    }

    async fn seek(&self, offset: i64) -> Result<(), PlayerError> {
        self.command(Command::Seek(offset))
    }

    fn unsubscribe(&self) {
        self.unsubscribed.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeBackend {
    players: Mutex<HashMap<String, Arc<FakePlayer>>>,
    watcher: Mutex<Option<mpsc::UnboundedSender<EngineEvent>>>,
}

impl FakeBackend {
    pub fn insert(&self, player: Arc<FakePlayer>) {
        self.players
            .lock()
            .insert(player.id().as_str().to_string(), player);
    }

    pub fn is_watched(&self) -> bool {
        self.watcher.lock().is_some()
    }
}

#[async_trait]
impl PlayerBackend for FakeBackend {
    async fn player_names(&self) -> Result<Vec<String>, PlayerError> {
        let mut names: Vec<String> = self.players.lock().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn open(
        &self,
        name: &str,
        _events: mpsc::UnboundedSender<EngineEvent>,
    ) -> Result<Arc<dyn MediaPlayer>, PlayerError> {
        let player = self
            .players
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| PlayerError::Gone(name.to_string()))?;
        Ok(player as Arc<dyn MediaPlayer>)
    }

    async fn watch(&self, events: mpsc::UnboundedSender<EngineEvent>) -> Result<(), PlayerError> {
        *self.watcher.lock() = Some(events);
        Ok(())
    }
}

/// Row sink that records every operation
#[derive(Default)]
pub struct RecordingSink {
    next_row: AtomicU64,
    rows: Mutex<Vec<(RowId, RowData)>>,
    updates: Mutex<Vec<CellUpdate>>,
    removed: Mutex<Vec<RowId>>,
    closed: AtomicBool,
}

impl RecordingSink {
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn rows(&self) -> Vec<(RowId, RowData)> {
        self.rows.lock().clone()
    }

    pub fn updates(&self) -> Vec<CellUpdate> {
        self.updates.lock().clone()
    }

    pub fn removed(&self) -> Vec<RowId> {
        self.removed.lock().clone()
    }

    fn last_text(&self, row: RowId, column: Column) -> Option<String> {
        self.updates
            .lock()
            .iter()
            .rev()
            .find(|u| u.row == row && u.column == column)
            .map(|u| u.value.text().to_string())
    }

    pub fn last_status(&self, row: RowId) -> Option<String> {
        self.last_text(row, Column::Status)
    }

    pub fn last_title(&self, row: RowId) -> Option<String> {
        self.last_text(row, Column::Title)
    }

    fn check_open(&self) -> Result<(), SyncError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SyncError::UiClosed);
        }
        Ok(())
    }
}

#[async_trait]
impl RowSink for RecordingSink {
    async fn add_row(&self, row: RowData) -> Result<RowId, SyncError> {
        self.check_open()?;
        let id = RowId(self.next_row.fetch_add(1, Ordering::SeqCst));
        self.rows.lock().push((id, row));
        Ok(id)
    }

    async fn update_cell(&self, update: CellUpdate) -> Result<(), SyncError> {
        self.check_open()?;
        self.updates.lock().push(update);
        Ok(())
    }

    async fn remove_row(&self, row: RowId) -> Result<(), SyncError> {
        self.check_open()?;
        self.removed.lock().push(row);
        Ok(())
    }
}

/// Engine wired to a fake backend and a recording sink
pub struct Harness {
    pub engine: SyncEngine,
    pub handle: SyncHandle,
    pub backend: Arc<FakeBackend>,
    pub sink: Arc<RecordingSink>,
}

impl Harness {
    pub fn new(options: SyncOptions) -> Self {
        let backend = Arc::new(FakeBackend::default());
        let sink = Arc::new(RecordingSink::default());
        let (engine, handle) = SyncEngine::new(backend.clone(), sink.clone(), options);
        Self {
            engine,
            handle,
            backend,
            sink,
        }
    }

    /// Create a fake player at `position` and add it through the engine
    pub async fn add(&self, name: &str, position: i64) -> Arc<FakePlayer> {
        let player = Arc::new(FakePlayer::new(
            &format!("org.mpris.MediaPlayer2.{}", name),
            position,
        ));
        self.backend.insert(Arc::clone(&player));
        self.engine
            .add_player(player.id().as_str())
            .await
            .expect("add player");
        player
    }

    pub fn sync(&self, player: &FakePlayer) {
        let synced = self.engine.state.lock().registry.toggle_sync(player.id());
        assert_eq!(synced, Some(true));
    }

    pub fn offset(&self, from: &PlayerId, to: &PlayerId) -> Option<i64> {
        self.engine.state.lock().offsets.get(from, to)
    }

    pub fn row(&self, player: &FakePlayer) -> RowId {
        self.engine
            .state
            .lock()
            .rows
            .row_for(player.id())
            .expect("player has a row")
    }
}
