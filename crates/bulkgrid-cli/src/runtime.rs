// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use bulkgrid_app::{ChangeBuffer, LoadedSchema, SaveReport, Schema, SchemaId};
use bulkgrid_store::{RecordStore, load_resolved, save_changes};
use tracing::info;

/// Serves the grid panel from any record store: the remote client in normal
/// runs, the in-memory store under `--demo`.
pub struct StoreRuntime<S> {
    store: S,
    page_size: usize,
    hide_schema_prefixes: Vec<String>,
    initial_schema: Option<SchemaId>,
}

impl<S: RecordStore> StoreRuntime<S> {
    pub fn new(store: S, page_size: usize) -> Self {
        Self {
            store,
            page_size,
            hide_schema_prefixes: Vec::new(),
            initial_schema: None,
        }
    }

    pub fn with_hidden_prefixes(mut self, prefixes: &[String]) -> Self {
        self.hide_schema_prefixes = prefixes
            .iter()
            .filter(|prefix| !prefix.is_empty())
            .cloned()
            .collect();
        self
    }

    pub fn with_initial_schema(mut self, schema_id: Option<SchemaId>) -> Self {
        self.initial_schema = schema_id;
        self
    }
}

impl<S: RecordStore> bulkgrid_tui::GridRuntime for StoreRuntime<S> {
    fn list_schemas(&mut self) -> Result<Vec<Schema>> {
        let listed = self.store.list_schemas().context("list schemas")?;
        let total = listed.len();
        let schemas = visible_schemas(listed, &self.hide_schema_prefixes);
        info!(total, shown = schemas.len(), "listed schemas");
        Ok(schemas)
    }

    fn load_schema(&mut self, schema_id: &SchemaId) -> Result<LoadedSchema> {
        load_resolved(&self.store, schema_id, self.page_size)
    }

    fn save_changes(
        &mut self,
        schema: &Schema,
        changes: &ChangeBuffer,
        locale: &str,
    ) -> Result<SaveReport> {
        Ok(save_changes(&self.store, schema, changes, locale))
    }

    fn initial_schema(&self) -> Option<SchemaId> {
        self.initial_schema.clone()
    }
}

fn visible_schemas(mut schemas: Vec<Schema>, hidden_prefixes: &[String]) -> Vec<Schema> {
    schemas.retain(|schema| {
        !hidden_prefixes
            .iter()
            .any(|prefix| schema.id.as_str().starts_with(prefix.as_str()))
    });
    schemas.sort_by(|left, right| {
        left.name
            .to_lowercase()
            .cmp(&right.name.to_lowercase())
            .then_with(|| left.id.cmp(&right.id))
    });
    schemas
}
