//! Terminal dashboard: player table, activity log and key handling

use crate::bridge::UiRequest;
use crate::table::{LogLevel, TableModel};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use playersync_core::{Cell, Column, SyncHandle, SyncOptions};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io::stdout;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::info;

/// How long to wait for a key before servicing the engine again
const TICK_RATE: Duration = Duration::from_millis(50);

/// Dashboard state that is not part of the table itself
struct DashboardState {
    /// Engine dropped its end of the bridge
    engine_stopped: bool,
    propagate_stop: bool,
    propagate_pause_at_end: bool,
}

/// Run the dashboard until the user quits
pub fn run(
    handle: &SyncHandle,
    requests: &mut mpsc::UnboundedReceiver<UiRequest>,
    options: &SyncOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = DashboardState {
        engine_stopped: false,
        propagate_stop: options.propagate_stop,
        propagate_pause_at_end: options.propagate_pause_at_end,
    };
    let mut table = TableModel::new();
    table.log(LogLevel::Info, "Watching for MPRIS players");

    let result = event_loop(&mut terminal, handle, requests, &mut table, &mut state);

    // Cleanup, even when the loop failed
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    handle: &SyncHandle,
    requests: &mut mpsc::UnboundedReceiver<UiRequest>,
    table: &mut TableModel,
    state: &mut DashboardState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        // Apply everything the engine queued since the last tick
        loop {
            match requests.try_recv() {
                Ok(request) => request.apply(table),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !state.engine_stopped {
                        state.engine_stopped = true;
                        table.log(LogLevel::Warning, "Sync engine stopped");
                    }
                    break;
                }
            }
        }

        terminal.draw(|f| draw(f, table, state))?;

        if !event::poll(TICK_RATE)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
            KeyCode::Up | KeyCode::Char('k') => table.select_previous(),
            KeyCode::Down | KeyCode::Char('j') => table.select_next(),
            KeyCode::Enter | KeyCode::Char(' ') => toggle_selected(handle, table),
            _ => {}
        }
    }
}

/// Flip sync on the highlighted row and repaint its Sync cell
fn toggle_selected(handle: &SyncHandle, table: &mut TableModel) {
    let Some(row) = table.selected_row() else {
        return;
    };
    let Some((player, update)) = handle.toggle_row(row) else {
        return;
    };

    let synced = update.value == Cell::Synced(true);
    table.update_cell(update);
    table.log(
        LogLevel::Sync,
        format!(
            "{} {}",
            if synced { "Syncing" } else { "Stopped syncing" },
            player.display_name()
        ),
    );
    info!("Row {:?} toggled from the dashboard", row);
}

fn draw(f: &mut Frame, table: &TableModel, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(6),    // Players
            Constraint::Length(8), // Logs
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    draw_header(f, chunks[0], table, state);
    draw_players(f, chunks[1], table);
    draw_logs(f, chunks[2], table);
    draw_footer(f, chunks[3]);
}

fn draw_header(f: &mut Frame, area: Rect, table: &TableModel, state: &DashboardState) {
    let synced = table
        .rows()
        .iter()
        .filter(|r| r.cell(Column::Sync) == &Cell::Synced(true))
        .count();

    let (engine_text, engine_style) = if state.engine_stopped {
        ("STOPPED", Style::default().fg(Color::Red))
    } else {
        ("RUNNING", Style::default().fg(Color::Green))
    };

    let on_off = |flag: bool| if flag { "on" } else { "off" };

    let title = vec![Line::from(vec![
        Span::styled("playersync", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  │  Engine: "),
        Span::styled(engine_text, engine_style),
        Span::raw("  │  Synced: "),
        Span::styled(
            format!("{} / {}", synced, table.rows().len()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("  │  Stop: "),
        Span::styled(on_off(state.propagate_stop), Style::default().fg(Color::Yellow)),
        Span::raw("  Pause at end: "),
        Span::styled(
            on_off(state.propagate_pause_at_end),
            Style::default().fg(Color::Yellow),
        ),
    ])];

    let header = Paragraph::new(title)
        .block(Block::default().borders(Borders::ALL).title(" Players "));

    f.render_widget(header, area);
}

fn draw_players(f: &mut Frame, area: Rect, table: &TableModel) {
    let widths = table.column_widths();
    let constraints = [
        Constraint::Length(widths[0]),
        Constraint::Length(widths[1]),
        Constraint::Length(widths[2]),
        Constraint::Min(widths[3]),
    ];

    let header = Row::new(Column::ALL.map(|c| c.header()))
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows = table.rows().iter().map(|row| {
        Row::new(Column::ALL.map(|column| {
            let cell = row.cell(column);
            let style = match cell {
                Cell::Synced(true) => Style::default().fg(Color::White).bg(Color::Green),
                Cell::Synced(false) | Cell::Text(_) => Style::default(),
            };
            ratatui::widgets::Cell::from(cell.text().to_string()).style(style)
        }))
    });

    let widget = Table::new(rows, constraints)
        .header(header)
        .column_spacing(2)
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ")
        .block(Block::default().borders(Borders::ALL));

    let mut table_state = TableState::default();
    if !table.rows().is_empty() {
        table_state.select(Some(table.selected()));
    }

    f.render_stateful_widget(widget, area, &mut table_state);
}

fn draw_logs(f: &mut Frame, area: Rect, table: &TableModel) {
    let visible_height = area.height.saturating_sub(2) as usize;

    // Newest at the bottom
    let mut log_items: Vec<ListItem> = table
        .logs
        .iter()
        .rev()
        .take(visible_height)
        .map(|entry| {
            let level_style = match entry.level {
                LogLevel::Info => Style::default().fg(Color::Blue),
                LogLevel::Warning => Style::default().fg(Color::Yellow),
                LogLevel::Player => Style::default().fg(Color::Green),
                LogLevel::Sync => Style::default().fg(Color::Magenta),
            };

            let time = entry.timestamp.format("%H:%M:%S").to_string();

            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", time), Style::default().fg(Color::DarkGray)),
                Span::styled(format!("[{}] ", entry.level.as_str()), level_style),
                Span::raw(entry.message.clone()),
            ]))
        })
        .collect();
    log_items.reverse();

    let logs = List::new(log_items)
        .block(Block::default().borders(Borders::ALL).title(" Activity Log "));

    f.render_widget(logs, area);
}

fn draw_footer(f: &mut Frame, area: Rect) {
    let key = Style::default().fg(Color::Black).bg(Color::White);

    let footer = Paragraph::new(Line::from(vec![
        Span::styled(" Q ", key),
        Span::raw(" Quit  "),
        Span::styled(" ↑↓ ", key),
        Span::raw(" Select  "),
        Span::styled(" Enter ", key),
        Span::raw(" Toggle sync"),
    ]));

    f.render_widget(footer, area);
}
