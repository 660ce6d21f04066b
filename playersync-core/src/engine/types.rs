//! Engine types shared with the UI

use async_trait::async_trait;

use crate::config::ConfigError;
use crate::player::{PlaybackStatus, PlayerError};

/// Engine and wiring errors
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Player backend error: {0}")]
    Backend(#[from] PlayerError),

    #[error("UI is gone")]
    UiClosed,

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Opaque row identifier handed out by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(pub u64);

/// Table columns, left to right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Sync,
    App,
    Status,
    Title,
}

impl Column {
    pub const ALL: [Column; 4] = [Column::Sync, Column::App, Column::Status, Column::Title];

    pub fn header(&self) -> &'static str {
        match self {
            Column::Sync => "Sync",
            Column::App => "App",
            Column::Status => "Status",
            Column::Title => "Title",
        }
    }
}

/// Cell contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    /// Sync indicator, rendered as a styled Yes/No
    Synced(bool),
    Text(String),
}

impl Cell {
    pub fn text(&self) -> &str {
        match self {
            Cell::Synced(true) => "Yes",
            Cell::Synced(false) => "No",
            Cell::Text(text) => text,
        }
    }
}

impl From<PlaybackStatus> for Cell {
    fn from(status: PlaybackStatus) -> Self {
        Cell::Text(status.as_str().to_string())
    }
}

/// Initial contents of a new row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowData {
    pub synced: bool,
    pub app: String,
    pub status: PlaybackStatus,
    pub title: String,
}

impl RowData {
    pub fn cell(&self, column: Column) -> Cell {
        match column {
            Column::Sync => Cell::Synced(self.synced),
            Column::App => Cell::Text(self.app.clone()),
            Column::Status => Cell::from(self.status),
            Column::Title => Cell::Text(self.title.clone()),
        }
    }
}

/// A single cell change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub row: RowId,
    pub column: Column,
    pub value: Cell,
}

/// Row-oriented table the engine renders into.
///
/// Every call returns once the UI has applied the change, so the worker never
/// runs ahead of what is on screen. An `Err(SyncError::UiClosed)` means the
/// UI has shut down.
#[async_trait]
pub trait RowSink: Send + Sync {
    async fn add_row(&self, row: RowData) -> Result<RowId, SyncError>;
    async fn update_cell(&self, update: CellUpdate) -> Result<(), SyncError>;
    async fn remove_row(&self, row: RowId) -> Result<(), SyncError>;
}
