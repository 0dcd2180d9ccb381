// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use bulkgrid_app::{
    ActiveFilters, AppCommand, AppEvent, AppMode, AppState, BulkEditForm, CellCoord, CellTarget,
    ChangeBuffer, ClickModifier, FilterOption, LoadedSchema, SaveReport, Schema, SchemaId, Value,
    format_cell,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs};
use std::io;
use std::ops::Range;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const DISPLAY_COLUMN_WIDTH: u16 = 28;
const DATA_COLUMN_WIDTH: u16 = 18;
const FILTER_MARK_ACTIVE: &str = "▼";
const EDIT_CARET: &str = "▏";

/// What the grid panel needs from its host: a schema list, fully resolved
/// schema loads, and a way to persist the change buffer.
pub trait GridRuntime {
    fn list_schemas(&mut self) -> Result<Vec<Schema>>;
    fn load_schema(&mut self, schema_id: &SchemaId) -> Result<LoadedSchema>;
    fn save_changes(
        &mut self,
        schema: &Schema,
        changes: &ChangeBuffer,
        locale: &str,
    ) -> Result<SaveReport>;
    fn initial_schema(&self) -> Option<SchemaId> {
        None
    }
}

pub enum InternalEvent {
    ClearStatus { token: u64 },
}

/// Cursor column 0 is the sticky display column; data column `n` sits at
/// cursor column `n + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    cursor_row: usize,
    cursor_col: usize,
    edit_buffer: String,
    filter_cursor: usize,
    quit_armed: bool,
    status_token: u64,
}

impl ViewData {
    fn target(&self) -> CellTarget {
        match self.cursor_col.checked_sub(1) {
            None => CellTarget::Display {
                row: self.cursor_row,
            },
            Some(col) => CellTarget::Data(CellCoord::new(col, self.cursor_row)),
        }
    }

    fn data_coord(&self) -> Option<CellCoord> {
        match self.target() {
            CellTarget::Data(coord) => Some(coord),
            CellTarget::Display { .. } => None,
        }
    }
}

pub fn run_app<R: GridRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    let events = bootstrap(state, runtime);
    settle(state, &mut view_data, &internal_tx, &events);

    let mut result = Ok(());
    loop {
        process_internal_events(state, &view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

/// Lists schemas and loads the runtime's initial schema, falling back to the
/// first one listed.
pub fn bootstrap<R: GridRuntime>(state: &mut AppState, runtime: &mut R) -> Vec<AppEvent> {
    let schemas = match runtime.list_schemas() {
        Ok(schemas) => schemas,
        Err(error) => return state.dispatch(AppCommand::LoadFailed(format!("{error:#}"))),
    };
    let mut events = state.dispatch(AppCommand::SchemasLoaded(schemas));

    let initial = runtime
        .initial_schema()
        .filter(|id| state.schemas.iter().any(|schema| &schema.id == id))
        .or_else(|| state.schemas.first().map(|schema| schema.id.clone()));
    match initial {
        Some(schema_id) => events.extend(load_schema(state, runtime, &schema_id, true)),
        None => events.extend(state.dispatch(AppCommand::SetStatus(
            "no schemas in this space -- create a content type and press r".to_owned(),
        ))),
    }
    events
}

/// Loads `schema_id` into the grid. Refused while another load or save is
/// in flight.
pub fn load_schema<R: GridRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    schema_id: &SchemaId,
    reset_filters: bool,
) -> Vec<AppEvent> {
    let mut events = state.dispatch(AppCommand::BeginBusy(format!("loading {schema_id}")));
    if events.contains(&AppEvent::BusyRefused) {
        return events;
    }
    events.extend(fetch_schema(state, runtime, schema_id, reset_filters));
    events
}

/// Saves every pending edit, then reloads the active schema keeping its
/// filters. Edits of records that failed to save stay buffered.
pub fn save_pending<R: GridRuntime>(state: &mut AppState, runtime: &mut R) -> Vec<AppEvent> {
    let Some(schema) = state.active.as_ref().map(|view| view.schema.clone()) else {
        return state.dispatch(AppCommand::SetStatus(
            "no schema loaded -- pick a schema and retry".to_owned(),
        ));
    };
    if state.changes.is_empty() {
        return state.dispatch(AppCommand::SetStatus("no pending edits".to_owned()));
    }

    let mut events = state.dispatch(AppCommand::BeginBusy(format!(
        "saving {} edits",
        state.changes.edit_count()
    )));
    if events.contains(&AppEvent::BusyRefused) {
        return events;
    }

    let report = match runtime.save_changes(&schema, &state.changes, &state.locale) {
        Ok(report) => report,
        Err(error) => {
            events.extend(state.dispatch(AppCommand::SaveFailed(format!("{error:#}"))));
            return events;
        }
    };
    let summary = report.summary();
    events.extend(state.dispatch(AppCommand::SaveFinished(report)));

    let reloaded = fetch_schema(state, runtime, &schema.id, false);
    let status = if reloaded
        .iter()
        .any(|event| matches!(event, AppEvent::SchemaActivated(_)))
    {
        summary
    } else {
        format!("{summary}; reload failed -- press r to retry")
    };
    events.extend(reloaded);
    events.extend(state.dispatch(AppCommand::SetStatus(status)));
    events
}

fn fetch_schema<R: GridRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    schema_id: &SchemaId,
    reset_filters: bool,
) -> Vec<AppEvent> {
    match runtime.load_schema(schema_id) {
        Ok(loaded) => state.dispatch(AppCommand::SchemaLoaded {
            loaded,
            reset_filters,
        }),
        Err(error) => state.dispatch(AppCommand::LoadFailed(format!("{error:#}"))),
    }
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

/// Brings view-local state in line with what the controller just reported.
fn settle(
    state: &AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    events: &[AppEvent],
) {
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::RowsChanged(_)))
    {
        clamp_cursor(state, view_data);
    }
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::StatusUpdated(_)))
    {
        view_data.status_token = view_data.status_token.saturating_add(1);
        schedule_status_clear(internal_tx, view_data.status_token);
    }
}

fn dispatch(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: AppCommand,
) -> Vec<AppEvent> {
    let events = state.dispatch(command);
    settle(state, view_data, internal_tx, &events);
    events
}

fn clamp_cursor(state: &AppState, view_data: &mut ViewData) {
    let rows = state.visible.len();
    let cols = state
        .active
        .as_ref()
        .map_or(0, |view| view.projection.len())
        + 1;
    view_data.cursor_row = view_data.cursor_row.min(rows.saturating_sub(1));
    view_data.cursor_col = view_data.cursor_col.min(cols - 1);
}

fn handle_key_event<R: GridRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    match state.mode {
        AppMode::Nav => handle_nav_key(state, runtime, view_data, internal_tx, key),
        AppMode::EditCell(coord) => {
            handle_edit_key(state, view_data, internal_tx, coord, key);
            false
        }
        AppMode::BulkEdit => {
            handle_bulk_key(state, view_data, internal_tx, key);
            false
        }
        AppMode::FilterMenu(col) => {
            handle_filter_key(state, view_data, internal_tx, col, key);
            false
        }
    }
}

fn handle_nav_key<R: GridRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let quit_armed = std::mem::take(&mut view_data.quit_armed);
    match key.code {
        KeyCode::Char('q') => {
            if quit_armed || state.changes.is_empty() {
                return true;
            }
            view_data.quit_armed = true;
            let message = format!(
                "{} unsaved edits -- press q again to quit or s to save",
                state.changes.edit_count()
            );
            dispatch(state, view_data, internal_tx, AppCommand::SetStatus(message));
        }
        KeyCode::Char('h') | KeyCode::Left => {
            view_data.cursor_col = view_data.cursor_col.saturating_sub(1);
        }
        KeyCode::Char('l') | KeyCode::Right => {
            view_data.cursor_col = view_data.cursor_col.saturating_add(1);
            clamp_cursor(state, view_data);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.cursor_row = view_data.cursor_row.saturating_sub(1);
        }
        KeyCode::Char('j') | KeyCode::Down => {
            view_data.cursor_row = view_data.cursor_row.saturating_add(1);
            clamp_cursor(state, view_data);
        }
        KeyCode::Char('g') => view_data.cursor_row = 0,
        KeyCode::Char('G') => {
            view_data.cursor_row = state.visible.len().saturating_sub(1);
        }
        KeyCode::Enter => {
            let target = view_data.target();
            dispatch(
                state,
                view_data,
                internal_tx,
                AppCommand::ClickCell {
                    target,
                    modifier: ClickModifier::Plain,
                },
            );
        }
        KeyCode::Char(' ') => {
            let target = view_data.target();
            dispatch(
                state,
                view_data,
                internal_tx,
                AppCommand::ClickCell {
                    target,
                    modifier: ClickModifier::Extend,
                },
            );
        }
        KeyCode::Esc => {
            dispatch(state, view_data, internal_tx, AppCommand::ClickOutside);
        }
        KeyCode::Char('e') | KeyCode::Char('i') => {
            let Some(coord) = view_data.data_coord() else {
                return false;
            };
            dispatch(state, view_data, internal_tx, AppCommand::StartEdit(coord));
            if state.mode == AppMode::EditCell(coord) {
                view_data.edit_buffer = state
                    .cell_value(coord)
                    .map(Value::edit_text)
                    .unwrap_or_default();
            }
        }
        KeyCode::Char('u') => {
            if let Some(coord) = view_data.data_coord() {
                dispatch(state, view_data, internal_tx, AppCommand::RevertCell(coord));
            }
        }
        KeyCode::Char('b') => {
            dispatch(state, view_data, internal_tx, AppCommand::OpenBulkEdit);
        }
        KeyCode::Char('f') => {
            let Some(coord) = view_data.data_coord() else {
                dispatch(
                    state,
                    view_data,
                    internal_tx,
                    AppCommand::SetStatus("title column has no link filter".to_owned()),
                );
                return false;
            };
            view_data.filter_cursor = 0;
            dispatch(
                state,
                view_data,
                internal_tx,
                AppCommand::OpenFilterMenu(coord.col),
            );
        }
        KeyCode::Char('F') => {
            dispatch(state, view_data, internal_tx, AppCommand::ClearFilters);
        }
        KeyCode::Char('s') => {
            let events = save_pending(state, runtime);
            settle(state, view_data, internal_tx, &events);
        }
        KeyCode::Char('r') => {
            let events = match state.active_schema_id().cloned() {
                Some(schema_id) => load_schema(state, runtime, &schema_id, false),
                None => bootstrap(state, runtime),
            };
            settle(state, view_data, internal_tx, &events);
        }
        KeyCode::Tab | KeyCode::Char(']') => {
            switch_schema(state, runtime, view_data, internal_tx, 1);
        }
        KeyCode::BackTab | KeyCode::Char('[') => {
            switch_schema(state, runtime, view_data, internal_tx, -1);
        }
        _ => {}
    }
    false
}

fn switch_schema<R: GridRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    step: isize,
) {
    if state.schemas.is_empty() {
        return;
    }
    let current = state
        .active_schema_id()
        .and_then(|id| state.schemas.iter().position(|schema| &schema.id == id));
    let next = match current {
        Some(index) => index
            .checked_add_signed(step)
            .unwrap_or(state.schemas.len() - 1)
            % state.schemas.len(),
        None => 0,
    };
    let schema_id = state.schemas[next].id.clone();
    let events = load_schema(state, runtime, &schema_id, true);
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::SchemaActivated(_)))
    {
        view_data.cursor_row = 0;
        view_data.cursor_col = 0;
    }
    settle(state, view_data, internal_tx, &events);
}

fn handle_edit_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    coord: CellCoord,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => {
            view_data.edit_buffer.clear();
            dispatch(state, view_data, internal_tx, AppCommand::CancelModal);
        }
        KeyCode::Enter => {
            let input = std::mem::take(&mut view_data.edit_buffer);
            dispatch(
                state,
                view_data,
                internal_tx,
                AppCommand::CommitEdit { coord, input },
            );
        }
        KeyCode::Backspace => {
            view_data.edit_buffer.pop();
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            view_data.edit_buffer.push(ch);
        }
        _ => {}
    }
}

fn handle_bulk_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(mut value) = state.bulk_form.as_ref().map(|form| form.value.clone()) else {
        return;
    };
    match key.code {
        KeyCode::Esc => {
            dispatch(state, view_data, internal_tx, AppCommand::CancelModal);
        }
        KeyCode::Enter => {
            dispatch(state, view_data, internal_tx, AppCommand::ApplyBulkEdit);
        }
        KeyCode::Backspace => {
            value.pop();
            dispatch(state, view_data, internal_tx, AppCommand::SetBulkValue(value));
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            value.push(ch);
            dispatch(state, view_data, internal_tx, AppCommand::SetBulkValue(value));
        }
        _ => {}
    }
}

fn handle_filter_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    col: usize,
    key: KeyEvent,
) {
    let option_count = state.filter_options(col).len();
    match key.code {
        KeyCode::Esc => {
            dispatch(state, view_data, internal_tx, AppCommand::CancelModal);
        }
        KeyCode::Char('j') | KeyCode::Down => {
            view_data.filter_cursor =
                (view_data.filter_cursor + 1).min(option_count.saturating_sub(1));
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.filter_cursor = view_data.filter_cursor.saturating_sub(1);
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            let Some(option) = state.filter_options(col).get(view_data.filter_cursor).cloned()
            else {
                return;
            };
            dispatch(state, view_data, internal_tx, AppCommand::ToggleFilter(option));
        }
        KeyCode::Char('c') | KeyCode::Char('F') => {
            dispatch(state, view_data, internal_tx, AppCommand::ClearFilters);
        }
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let selected = state
        .active_schema_id()
        .and_then(|id| state.schemas.iter().position(|schema| &schema.id == id))
        .unwrap_or(0);
    let tab_titles = state
        .schemas
        .iter()
        .map(|schema| schema.name.clone())
        .collect::<Vec<_>>();
    let tabs = Tabs::new(tab_titles)
        .block(Block::default().title("bulkgrid").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    render_grid(frame, layout[1], state, view_data);

    let status_widget = Paragraph::new(status_text(state))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status_widget, layout[2]);

    match state.mode {
        AppMode::BulkEdit => {
            if let Some(form) = &state.bulk_form {
                let area = centered_rect(50, 30, frame.area());
                frame.render_widget(Clear, area);
                let text = bulk_overlay_text(form, column_name(state, form.column));
                let overlay = Paragraph::new(text)
                    .block(Block::default().title("bulk edit").borders(Borders::ALL));
                frame.render_widget(overlay, area);
            }
        }
        AppMode::FilterMenu(col) => {
            let area = centered_rect(45, 60, frame.area());
            frame.render_widget(Clear, area);
            let overlay = Paragraph::new(filter_overlay_text(
                state.filter_options(col),
                &state.filters,
                view_data.filter_cursor,
            ))
            .block(
                Block::default()
                    .title(format!("filter {}", column_name(state, col)))
                    .borders(Borders::ALL),
            );
            frame.render_widget(overlay, area);
        }
        AppMode::Nav | AppMode::EditCell(_) => {}
    }
}

fn render_grid(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let Some(view) = &state.active else {
        let empty = Paragraph::new(if state.loading { "loading..." } else { "" })
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    };

    let fits = usize::from(
        area.width.saturating_sub(DISPLAY_COLUMN_WIDTH + 3) / (DATA_COLUMN_WIDTH + 1),
    );
    let window = column_window(
        view_data.cursor_col.saturating_sub(1),
        view.projection.len(),
        fits,
    );
    let mut widths = vec![Constraint::Length(DISPLAY_COLUMN_WIDTH)];
    widths.extend(window.clone().map(|_| Constraint::Length(DATA_COLUMN_WIDTH)));

    let header_style = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);
    let header = Row::new(header_labels(state, window.clone())).style(header_style);

    let display_field = view.projection.display_field(&view.schema);
    let rows = state.visible.iter().enumerate().map(|(row, index)| {
        let record = &view.records[*index];
        let title = display_field.map_or_else(
            || record.id.to_string(),
            |field| {
                format_cell(
                    field.kind,
                    record.value(&field.id, &state.locale),
                    &state.locale,
                )
            },
        );
        let mut display_style = Style::default().fg(Color::Gray);
        if row == view_data.cursor_row && view_data.cursor_col == 0 {
            display_style = display_style.bg(Color::DarkGray);
        }
        let mut cells = vec![
            Cell::from(format!("{} {title}", record.status().badge())).style(display_style),
        ];

        for col in window.clone() {
            let coord = CellCoord::new(col, row);
            let text = match state.mode {
                AppMode::EditCell(editing) if editing == coord => {
                    format!("{}{EDIT_CARET}", view_data.edit_buffer)
                }
                _ => view
                    .projection
                    .field(&view.schema, col)
                    .map(|field| format_cell(field.kind, state.cell_value(coord), &state.locale))
                    .unwrap_or_default(),
            };
            cells.push(Cell::from(text).style(cell_style(state, view_data, coord)));
        }
        Row::new(cells)
    });

    let title = format!(
        "{} ({} of {})",
        view.schema.name,
        state.visible.len(),
        view.records.len()
    );
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(Block::default().title(title).borders(Borders::ALL));
    let mut table_state = TableState::default().with_selected(Some(view_data.cursor_row));
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn cell_style(state: &AppState, view_data: &ViewData, coord: CellCoord) -> Style {
    if view_data.data_coord() == Some(coord) {
        return Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
    }
    let mut style = Style::default();
    if state.is_cell_edited(coord) {
        style = style.fg(Color::Yellow).add_modifier(Modifier::ITALIC);
    }
    if state.selection.contains(coord) {
        style = style.bg(Color::Blue);
    }
    style
}

fn header_labels(state: &AppState, window: Range<usize>) -> Vec<String> {
    let Some(view) = &state.active else {
        return Vec::new();
    };
    let mut labels = vec![
        view.projection
            .display_field(&view.schema)
            .map_or_else(|| "id".to_owned(), |field| field.name.clone()),
    ];
    for col in window {
        let (Some(entry), Some(field)) = (
            view.projection.column(col),
            view.projection.field(&view.schema, col),
        ) else {
            continue;
        };
        let filtered = state
            .filters
            .iter()
            .any(|filter| filter.field_id == entry.field_id);
        labels.push(if filtered {
            format!("{} {FILTER_MARK_ACTIVE}", field.name)
        } else {
            field.name.clone()
        });
    }
    labels
}

fn column_name(state: &AppState, col: usize) -> &str {
    state
        .active
        .as_ref()
        .and_then(|view| view.projection.field(&view.schema, col))
        .map_or("", |field| field.name.as_str())
}

/// The range of data columns that fit, scrolled just far enough to keep
/// `focus` in view.
fn column_window(focus: usize, total: usize, fits: usize) -> Range<usize> {
    let fits = fits.max(1).min(total);
    let start = (focus + 1).saturating_sub(fits).min(total - fits);
    start..start + fits
}

fn status_text(state: &AppState) -> String {
    let mode = match state.mode {
        AppMode::Nav => "NAV",
        AppMode::EditCell(_) => "EDIT",
        AppMode::BulkEdit => "BULK",
        AppMode::FilterMenu(_) => "FILTER",
    };
    let mut summary = format!(
        "{} rows | {} edits | {} selected",
        state.visible.len(),
        state.changes.edit_count(),
        state.selection.len()
    );
    if !state.filters.is_empty() {
        summary.push_str(&format!(" | {} filters", state.filters.len()));
    }
    if state.loading {
        summary.push_str(" | busy");
    }
    let hints = match state.mode {
        AppMode::Nav => {
            "hjkl | enter select | space extend | e edit | u revert | b bulk | f filter | s save | r reload | tab schema | q quit"
        }
        AppMode::EditCell(_) => "enter commit | esc cancel",
        AppMode::BulkEdit => "enter stage | esc cancel",
        AppMode::FilterMenu(_) => "j/k move | enter toggle | c clear | esc close",
    };
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {summary} | {hints}"),
        None => format!("{mode} | {summary} | {hints}"),
    }
}

fn bulk_overlay_text(form: &BulkEditForm, column: &str) -> String {
    format!(
        "{} cells in {column} ({})\n\nvalue: {}{EDIT_CARET}\n\nenter stage | esc cancel",
        form.targets,
        form.kind.as_str(),
        form.value
    )
}

fn filter_overlay_text(
    options: &[FilterOption],
    active: &ActiveFilters,
    cursor: usize,
) -> String {
    if options.is_empty() {
        return "no link targets in this column\n\nesc close".to_owned();
    }
    let mut lines = options
        .iter()
        .enumerate()
        .map(|(index, option)| {
            let pointer = if index == cursor { ">" } else { " " };
            let mark = if active.is_active(option) { "x" } else { " " };
            format!("{pointer} [{mark}] {}", option.title)
        })
        .collect::<Vec<_>>();
    lines.push(String::new());
    lines.push("enter toggle | c clear | esc close".to_owned());
    lines.join("\n")
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
