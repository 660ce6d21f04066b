//! Channel between the engine worker and the UI loop
//!
//! The engine talks to the table through [`UiHandle`], which implements
//! [`RowSink`]. Each call is queued as a [`UiRequest`] and waits until the UI
//! loop has applied it and answered.

use async_trait::async_trait;
use playersync_core::engine::CellUpdate;
use playersync_core::{RowData, RowId, RowSink, SyncError};
use tokio::sync::{mpsc, oneshot};

use crate::table::TableModel;

/// A table change waiting for the UI loop
#[derive(Debug)]
pub enum UiRequest {
    AddRow {
        row: RowData,
        reply: oneshot::Sender<RowId>,
    },
    UpdateCell {
        update: CellUpdate,
        reply: oneshot::Sender<()>,
    },
    RemoveRow {
        row: RowId,
        reply: oneshot::Sender<()>,
    },
}

impl UiRequest {
    /// Apply to the table and wake the waiting engine
    pub fn apply(self, table: &mut TableModel) {
        // A dropped reply means the engine stopped waiting, nothing to do
        match self {
            UiRequest::AddRow { row, reply } => {
                let id = table.add_row(row);
                let _ = reply.send(id);
            }
            UiRequest::UpdateCell { update, reply } => {
                table.update_cell(update);
                let _ = reply.send(());
            }
            UiRequest::RemoveRow { row, reply } => {
                table.remove_row(row);
                let _ = reply.send(());
            }
        }
    }
}

/// Engine side of the bridge
#[derive(Clone)]
pub struct UiHandle {
    tx: mpsc::UnboundedSender<UiRequest>,
}

/// Create a connected handle and request receiver
pub fn channel() -> (UiHandle, mpsc::UnboundedReceiver<UiRequest>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (UiHandle { tx }, rx)
}

impl UiHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> UiRequest,
    ) -> Result<T, SyncError> {
        let (reply, response) = oneshot::channel();
        self.tx.send(make(reply)).map_err(|_| SyncError::UiClosed)?;
        response.await.map_err(|_| SyncError::UiClosed)
    }
}

#[async_trait]
impl RowSink for UiHandle {
    async fn add_row(&self, row: RowData) -> Result<RowId, SyncError> {
        self.request(|reply| UiRequest::AddRow { row, reply }).await
    }

    async fn update_cell(&self, update: CellUpdate) -> Result<(), SyncError> {
        self.request(|reply| UiRequest::UpdateCell { update, reply })
            .await
    }

    async fn remove_row(&self, row: RowId) -> Result<(), SyncError> {
        self.request(|reply| UiRequest::RemoveRow { row, reply }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playersync_core::{Cell, Column, PlaybackStatus};

    fn data(app: &str) -> RowData {
        RowData {
            synced: false,
            app: app.to_string(),
            status: PlaybackStatus::Playing,
            title: String::new(),
        }
    }

    #[tokio::test]
    async fn test_requests_wait_for_the_ui() {
        let (handle, mut rx) = channel();

        let ui = tokio::spawn(async move {
            let mut table = TableModel::new();
            for _ in 0..3 {
                let request = rx.recv().await.expect("request");
                request.apply(&mut table);
            }
            table
        });

        let id = handle.add_row(data("vlc")).await.unwrap();
        handle
            .update_cell(CellUpdate {
                row: id,
                column: Column::Sync,
                value: Cell::Synced(true),
            })
            .await
            .unwrap();
        let other = handle.add_row(data("mpv")).await.unwrap();
        assert_ne!(id, other);

        let table = ui.await.unwrap();
        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.rows()[0].cell(Column::Sync), &Cell::Synced(true));
    }

    #[tokio::test]
    async fn test_closed_ui_reports_ui_closed() {
        let (handle, rx) = channel();
        drop(rx);

        let err = handle.add_row(data("vlc")).await.unwrap_err();
        assert!(matches!(err, SyncError::UiClosed));
        let err = handle.remove_row(RowId(0)).await.unwrap_err();
        assert!(matches!(err, SyncError::UiClosed));
    }

    #[tokio::test]
    async fn test_unanswered_request_reports_ui_closed() {
        let (handle, mut rx) = channel();

        let ui = tokio::spawn(async move {
            // Drop the request without replying
            let _ = rx.recv().await;
        });

        let err = handle.remove_row(RowId(3)).await.unwrap_err();
        assert!(matches!(err, SyncError::UiClosed));
        ui.await.unwrap();
    }
}
