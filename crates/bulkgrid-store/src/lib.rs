// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod client;
mod fanout;
mod memory;
mod reconcile;
mod resolve;
pub mod wire;

use anyhow::Result;
use bulkgrid_app::{FieldId, Record, RecordId, Schema, SchemaId};

pub use client::Client;
pub use memory::{FetchCounts, InMemoryStore};
pub use reconcile::{merge_pending, save_changes};
pub use resolve::{collect_link_ids, load_resolved, substitute_links};

/// The remote record store. Implementations must be shareable across the
/// scoped threads the resolver and reconciler fan out on.
pub trait RecordStore: Sync {
    fn list_schemas(&self) -> Result<Vec<Schema>>;

    fn get_schema(&self, id: &SchemaId) -> Result<Schema>;

    /// Up to `limit` records of one schema, ordered by `order_field` when given.
    fn get_records(
        &self,
        schema_id: &SchemaId,
        order_field: Option<&FieldId>,
        limit: usize,
    ) -> Result<Vec<Record>>;

    fn get_record(&self, id: &RecordId) -> Result<Record>;

    /// Writes `record`'s fields, guarded by `record.version`.
    fn update_record(&self, id: &RecordId, record: &Record) -> Result<Record>;
}
