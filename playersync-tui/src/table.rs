//! Player table and activity log shown by the dashboard

use chrono::{DateTime, Local};
use playersync_core::engine::CellUpdate;
use playersync_core::{Cell, Column, RowData, RowId};
use std::collections::VecDeque;

/// Maximum number of log entries to keep
const MAX_LOG_ENTRIES: usize = 100;

/// A log entry for the dashboard
#[derive(Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum LogLevel {
    Info,
    Warning,
    Player,
    Sync,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARN",
            LogLevel::Player => "PLAYER",
            LogLevel::Sync => "SYNC",
        }
    }
}

/// One table row, cells in [`Column::ALL`] order
#[derive(Clone, Debug)]
pub struct Row {
    pub id: RowId,
    pub cells: [Cell; 4],
}

impl Row {
    pub fn cell(&self, column: Column) -> &Cell {
        &self.cells[column_index(column)]
    }
}

fn column_index(column: Column) -> usize {
    match column {
        Column::Sync => 0,
        Column::App => 1,
        Column::Status => 2,
        Column::Title => 3,
    }
}

/// Everything the dashboard renders
pub struct TableModel {
    rows: Vec<Row>,
    next_id: u64,
    /// Index of the highlighted row
    selected: usize,
    /// Log entries
    pub logs: VecDeque<LogEntry>,
}

impl TableModel {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 0,
            selected: 0,
            logs: VecDeque::with_capacity(MAX_LOG_ENTRIES),
        }
    }

    /// Add a log entry
    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        if self.logs.len() >= MAX_LOG_ENTRIES {
            self.logs.pop_front();
        }
        self.logs.push_back(LogEntry {
            timestamp: Local::now(),
            level,
            message: message.into(),
        });
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Append a row and hand out its id
    pub fn add_row(&mut self, data: RowData) -> RowId {
        let id = RowId(self.next_id);
        self.next_id += 1;

        self.log(LogLevel::Player, format!("Player added: {}", data.app));
        self.rows.push(Row {
            id,
            cells: Column::ALL.map(|column| data.cell(column)),
        });
        id
    }

    /// Replace one cell. Unknown rows are ignored.
    pub fn update_cell(&mut self, update: CellUpdate) {
        let Some(row) = self.rows.iter_mut().find(|r| r.id == update.row) else {
            return;
        };
        row.cells[column_index(update.column)] = update.value;
    }

    /// Drop a row, keeping the highlight in range
    pub fn remove_row(&mut self, id: RowId) {
        let Some(index) = self.rows.iter().position(|r| r.id == id) else {
            return;
        };
        let row = self.rows.remove(index);
        self.log(
            LogLevel::Player,
            format!("Player removed: {}", row.cell(Column::App).text()),
        );

        if index < self.selected || self.selected >= self.rows.len() {
            self.selected = self.selected.saturating_sub(1);
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_row(&self) -> Option<RowId> {
        self.rows.get(self.selected).map(|r| r.id)
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.rows.len() {
            self.selected += 1;
        }
    }

    /// Widest text per column, header included
    pub fn column_widths(&self) -> [u16; 4] {
        Column::ALL.map(|column| {
            self.rows
                .iter()
                .map(|row| row.cell(column).text().chars().count())
                .chain(std::iter::once(column.header().len()))
                .max()
                .unwrap_or(0)
                .min(u16::MAX as usize) as u16
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playersync_core::PlaybackStatus;

    fn data(app: &str) -> RowData {
        RowData {
            synced: false,
            app: app.to_string(),
            status: PlaybackStatus::Paused,
            title: format!("{} track", app),
        }
    }

    #[test]
    fn test_add_row_fills_cells_in_column_order() {
        let mut table = TableModel::new();
        let id = table.add_row(data("vlc"));

        let row = &table.rows()[0];
        assert_eq!(row.id, id);
        assert_eq!(row.cell(Column::Sync), &Cell::Synced(false));
        assert_eq!(row.cell(Column::App).text(), "vlc");
        assert_eq!(row.cell(Column::Status).text(), "Paused");
        assert_eq!(row.cell(Column::Title).text(), "vlc track");
        assert_eq!(table.logs.len(), 1);
    }

    #[test]
    fn test_row_ids_are_not_reused() {
        let mut table = TableModel::new();
        let first = table.add_row(data("vlc"));
        table.remove_row(first);
        let second = table.add_row(data("mpv"));
        assert_ne!(first, second);
    }

    #[test]
    fn test_update_cell() {
        let mut table = TableModel::new();
        let id = table.add_row(data("vlc"));

        table.update_cell(CellUpdate {
            row: id,
            column: Column::Status,
            value: Cell::Text("Playing".to_string()),
        });
        table.update_cell(CellUpdate {
            row: RowId(99),
            column: Column::Status,
            value: Cell::Text("Stopped".to_string()),
        });

        assert_eq!(table.rows()[0].cell(Column::Status).text(), "Playing");
    }

    #[test]
    fn test_remove_keeps_selection_in_range() {
        let mut table = TableModel::new();
        let a = table.add_row(data("a"));
        let _b = table.add_row(data("b"));
        let c = table.add_row(data("c"));

        table.select_next();
        table.select_next();
        table.select_next();
        assert_eq!(table.selected(), 2);

        table.remove_row(c);
        assert_eq!(table.selected(), 1);

        table.remove_row(a);
        assert_eq!(table.selected(), 0);
        assert_eq!(table.rows()[0].cell(Column::App).text(), "b");
    }

    #[test]
    fn test_column_widths_grow_to_fit() {
        let mut table = TableModel::new();
        assert_eq!(table.column_widths(), [4, 3, 6, 5]);

        table.add_row(data("firefox.instance_1_42"));
        let widths = table.column_widths();
        assert_eq!(widths[1], "firefox.instance_1_42".len() as u16);
        assert_eq!(widths[3], "firefox.instance_1_42 track".len() as u16);
    }

    #[test]
    fn test_log_is_bounded() {
        let mut table = TableModel::new();
        for i in 0..(MAX_LOG_ENTRIES + 5) {
            table.log(LogLevel::Info, format!("entry {}", i));
        }
        assert_eq!(table.logs.len(), MAX_LOG_ENTRIES);
        assert_eq!(table.logs.front().map(|e| e.message.as_str()), Some("entry 5"));
    }
}
