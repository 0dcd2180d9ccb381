// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    ActiveFilters, BulkEditForm, CellCoord, CellTarget, ChangeBuffer, ClickModifier,
    ColumnProjection, DEFAULT_LOCALE, EditOutcome, Field, FilterIndex, FilterOption, FilterToggle,
    GridView, LoadedSchema, Record, RecordId, SaveReport, Schema, SchemaId, Selection,
    SelectionChange, Value, filtered_view,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Nav,
    EditCell(CellCoord),
    BulkEdit,
    FilterMenu(usize),
}

impl AppMode {
    pub const fn is_modal(self) -> bool {
        matches!(self, Self::BulkEdit | Self::FilterMenu(_))
    }
}

/// The active schema with everything derived from its records.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedView {
    pub schema: Schema,
    pub records: Vec<Record>,
    pub projection: ColumnProjection,
    pub filter_index: FilterIndex,
}

impl LoadedView {
    pub fn new(loaded: LoadedSchema, locale: &str) -> Self {
        let projection = ColumnProjection::project(&loaded.schema);
        let filter_index = FilterIndex::build(&loaded.records, locale);
        Self {
            schema: loaded.schema,
            records: loaded.records,
            projection,
            filter_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub locale: String,
    pub schemas: Vec<Schema>,
    pub active: Option<LoadedView>,
    pub filters: ActiveFilters,
    pub visible: Vec<usize>,
    pub selection: Selection,
    pub changes: ChangeBuffer,
    pub loading: bool,
    pub mode: AppMode,
    pub bulk_form: Option<BulkEditForm>,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_LOCALE)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    SchemasLoaded(Vec<Schema>),
    BeginBusy(String),
    EndBusy,
    SchemaLoaded {
        loaded: LoadedSchema,
        reset_filters: bool,
    },
    LoadFailed(String),
    SaveFinished(SaveReport),
    SaveFailed(String),
    ClickCell {
        target: CellTarget,
        modifier: ClickModifier,
    },
    ClickOutside,
    StartEdit(CellCoord),
    CommitEdit {
        coord: CellCoord,
        input: String,
    },
    RevertCell(CellCoord),
    OpenFilterMenu(usize),
    ToggleFilter(FilterOption),
    ClearFilters,
    OpenBulkEdit,
    SetBulkValue(String),
    ApplyBulkEdit,
    CancelModal,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    SchemasChanged(usize),
    BusyChanged(bool),
    BusyRefused,
    SchemaActivated(SchemaId),
    RowsChanged(usize),
    SelectionChanged(SelectionChange),
    ModeChanged(AppMode),
    CellStaged { record_id: RecordId, col: usize },
    CellReverted { record_id: RecordId, col: usize },
    BulkStaged(usize),
    FiltersChanged(usize),
    EditsChanged(usize),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            schemas: Vec::new(),
            active: None,
            filters: ActiveFilters::default(),
            visible: Vec::new(),
            selection: Selection::default(),
            changes: ChangeBuffer::default(),
            loading: false,
            mode: AppMode::Nav,
            bulk_form: None,
            status_line: None,
        }
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::SchemasLoaded(schemas) => {
                self.schemas = schemas;
                vec![AppEvent::SchemasChanged(self.schemas.len())]
            }
            AppCommand::BeginBusy(label) => {
                if self.loading {
                    return vec![AppEvent::BusyRefused, self.set_status("busy -- wait and retry")];
                }
                self.loading = true;
                vec![AppEvent::BusyChanged(true), self.set_status(&label)]
            }
            AppCommand::EndBusy => {
                self.loading = false;
                vec![AppEvent::BusyChanged(false)]
            }
            AppCommand::SchemaLoaded {
                loaded,
                reset_filters,
            } => self.activate(loaded, reset_filters),
            AppCommand::LoadFailed(message) => {
                self.loading = false;
                vec![
                    AppEvent::BusyChanged(false),
                    self.set_status(&format!("load failed: {message} -- press r to retry")),
                ]
            }
            AppCommand::SaveFinished(report) => {
                self.changes.discard_records(&report.saved);
                let cleared = self.selection.clear();
                vec![
                    AppEvent::EditsChanged(self.changes.edit_count()),
                    AppEvent::SelectionChanged(cleared),
                    self.set_status(&report.summary()),
                ]
            }
            AppCommand::SaveFailed(message) => {
                self.loading = false;
                vec![
                    AppEvent::BusyChanged(false),
                    self.set_status(&format!(
                        "save failed: {message} -- edits kept, press s to retry"
                    )),
                ]
            }
            AppCommand::ClickCell { target, modifier } => self.click_cell(target, modifier),
            AppCommand::ClickOutside => {
                if self.mode != AppMode::Nav {
                    return Vec::new();
                }
                match self.selection.clear() {
                    SelectionChange::Unchanged => Vec::new(),
                    change => vec![AppEvent::SelectionChanged(change)],
                }
            }
            AppCommand::StartEdit(coord) => {
                if self.mode.is_modal() || self.editable_field(coord).is_none() {
                    return Vec::new();
                }
                self.mode = AppMode::EditCell(coord);
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::CommitEdit { coord, input } => self.commit_edit(coord, input),
            AppCommand::RevertCell(coord) => {
                let Some((record_id, field_id)) = self
                    .grid_view()
                    .and_then(|grid| grid.resolve(coord))
                    .map(|(record, field)| (record.id.clone(), field.id.clone()))
                else {
                    return Vec::new();
                };
                if !self.changes.clear_pending_edit(&record_id, &field_id) {
                    return Vec::new();
                }
                vec![
                    AppEvent::CellReverted {
                        record_id,
                        col: coord.col,
                    },
                    AppEvent::EditsChanged(self.changes.edit_count()),
                ]
            }
            AppCommand::OpenFilterMenu(col) => {
                let filterable = self
                    .active
                    .as_ref()
                    .and_then(|view| view.projection.column(col))
                    .is_some_and(|entry| entry.filterable);
                if self.mode.is_modal() || !filterable {
                    return vec![self.set_status("column has no link filter")];
                }
                self.mode = AppMode::FilterMenu(col);
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::ToggleFilter(option) => {
                let label = match self.filters.toggle(option.clone()) {
                    FilterToggle::Applied => format!("filter: {}", option.title),
                    FilterToggle::Cleared => "filter cleared".to_owned(),
                };
                let mut events = self.refilter();
                events.push(self.set_status(&label));
                events
            }
            AppCommand::ClearFilters => {
                if self.filters.is_empty() {
                    return Vec::new();
                }
                self.filters.clear();
                let mut events = self.refilter();
                events.push(self.set_status("filter cleared"));
                events
            }
            AppCommand::OpenBulkEdit => self.open_bulk_edit(),
            AppCommand::SetBulkValue(value) => {
                if let Some(form) = self.bulk_form.as_mut() {
                    form.value = value;
                }
                Vec::new()
            }
            AppCommand::ApplyBulkEdit => self.apply_bulk_edit(),
            AppCommand::CancelModal => {
                if self.mode == AppMode::Nav {
                    return Vec::new();
                }
                self.bulk_form = None;
                self.mode = AppMode::Nav;
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    pub fn grid_view(&self) -> Option<GridView<'_>> {
        self.active.as_ref().map(|view| GridView {
            schema: &view.schema,
            records: &view.records,
            visible: &self.visible,
            projection: &view.projection,
        })
    }

    pub fn active_schema_id(&self) -> Option<&SchemaId> {
        self.active.as_ref().map(|view| &view.schema.id)
    }

    /// The value shown in a cell: its pending edit when one exists, else the
    /// stored value.
    pub fn cell_value(&self, coord: CellCoord) -> Option<&Value> {
        let (record, field) = self.grid_view()?.resolve(coord)?;
        self.changes
            .pending(&record.id, &field.id)
            .or_else(|| record.value(&field.id, &self.locale))
    }

    pub fn is_cell_edited(&self, coord: CellCoord) -> bool {
        self.grid_view()
            .and_then(|grid| grid.resolve(coord))
            .is_some_and(|(record, field)| self.changes.is_edited(&record.id, &field.id))
    }

    pub fn filter_options(&self, col: usize) -> &[FilterOption] {
        self.active
            .as_ref()
            .and_then(|view| {
                view.projection
                    .column(col)
                    .map(|entry| view.filter_index.options(&entry.field_id))
            })
            .unwrap_or_default()
    }

    fn editable_field(&self, coord: CellCoord) -> Option<&Field> {
        let (_, field) = self.grid_view()?.resolve(coord)?;
        field.kind.is_selectable().then_some(field)
    }

    fn activate(&mut self, loaded: LoadedSchema, reset_filters: bool) -> Vec<AppEvent> {
        let schema_changed = self.active_schema_id() != Some(&loaded.schema.id);
        if schema_changed {
            self.changes.clear();
        }
        if reset_filters || schema_changed {
            self.filters.clear();
        }

        let view = LoadedView::new(loaded, &self.locale);
        let schema_id = view.schema.id.clone();
        let record_count = view.records.len();
        self.visible = filtered_view(&view.records, &self.filters, &self.locale);
        self.active = Some(view);
        self.selection.clear();
        self.bulk_form = None;
        self.mode = AppMode::Nav;
        self.loading = false;

        vec![
            AppEvent::SchemaActivated(schema_id),
            AppEvent::RowsChanged(self.visible.len()),
            AppEvent::FiltersChanged(self.filters.len()),
            AppEvent::EditsChanged(self.changes.edit_count()),
            AppEvent::BusyChanged(false),
            self.set_status(&format!("loaded {record_count} records")),
        ]
    }

    fn click_cell(&mut self, target: CellTarget, modifier: ClickModifier) -> Vec<AppEvent> {
        if self.mode.is_modal() {
            return Vec::new();
        }
        let CellTarget::Data(coord) = target else {
            return Vec::new();
        };
        if self.editable_field(coord).is_none() {
            return Vec::new();
        }
        vec![AppEvent::SelectionChanged(
            self.selection.click(coord, modifier),
        )]
    }

    fn commit_edit(&mut self, coord: CellCoord, input: String) -> Vec<AppEvent> {
        let mut events = Vec::new();
        if self.mode != AppMode::Nav {
            self.mode = AppMode::Nav;
            events.push(AppEvent::ModeChanged(self.mode));
        }
        let Some(view) = self.active.as_ref() else {
            return events;
        };
        let grid = GridView {
            schema: &view.schema,
            records: &view.records,
            visible: &self.visible,
            projection: &view.projection,
        };
        let Some((record, field)) = grid.resolve(coord) else {
            return events;
        };
        if !field.kind.is_selectable() {
            return events;
        }

        let outcome =
            self.changes
                .commit_edit(record, &field.id, Value::Text(input), &self.locale);
        let record_id = record.id.clone();
        events.push(match outcome {
            EditOutcome::Staged => AppEvent::CellStaged {
                record_id,
                col: coord.col,
            },
            EditOutcome::Reverted => AppEvent::CellReverted {
                record_id,
                col: coord.col,
            },
        });
        events.push(AppEvent::EditsChanged(self.changes.edit_count()));
        events
    }

    fn refilter(&mut self) -> Vec<AppEvent> {
        self.visible = self
            .active
            .as_ref()
            .map(|view| filtered_view(&view.records, &self.filters, &self.locale))
            .unwrap_or_default();
        let cleared = self.selection.clear();
        self.mode = AppMode::Nav;
        vec![
            AppEvent::FiltersChanged(self.filters.len()),
            AppEvent::RowsChanged(self.visible.len()),
            AppEvent::SelectionChanged(cleared),
            AppEvent::ModeChanged(self.mode),
        ]
    }

    fn open_bulk_edit(&mut self) -> Vec<AppEvent> {
        if self.mode.is_modal() {
            return Vec::new();
        }
        let Some(grid) = self.grid_view() else {
            return vec![self.set_status("no schema loaded -- pick a schema and retry")];
        };
        let opened = BulkEditForm::open(&self.selection, &grid, &self.changes, &self.locale);
        match opened {
            Ok(form) => {
                let label = format!("bulk edit {} cells", form.targets);
                self.bulk_form = Some(form);
                self.mode = AppMode::BulkEdit;
                vec![AppEvent::ModeChanged(self.mode), self.set_status(&label)]
            }
            Err(error) => vec![self.set_status(&error.to_string())],
        }
    }

    fn apply_bulk_edit(&mut self) -> Vec<AppEvent> {
        let Some(form) = self.bulk_form.as_ref() else {
            return Vec::new();
        };
        if let Err(error) = form.validate() {
            return vec![self.set_status(&error.to_string())];
        }
        let staged = match self.active.as_ref() {
            Some(view) => {
                let grid = GridView {
                    schema: &view.schema,
                    records: &view.records,
                    visible: &self.visible,
                    projection: &view.projection,
                };
                self.changes
                    .apply_bulk(&self.selection, &form.value, form.kind, &grid)
            }
            None => 0,
        };
        self.bulk_form = None;
        self.mode = AppMode::Nav;
        let cleared = self.selection.clear();
        vec![
            AppEvent::BulkStaged(staged),
            AppEvent::EditsChanged(self.changes.edit_count()),
            AppEvent::SelectionChanged(cleared),
            AppEvent::ModeChanged(self.mode),
            self.set_status(&format!("staged {staged} cells -- press s to save")),
        ]
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
