// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use bulkgrid_app::{DEFAULT_LOCALE, FieldId, Record, RecordId, Schema, SchemaId, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use time::OffsetDateTime;

use crate::RecordStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchCounts {
    pub schema_lists: usize,
    pub schema_gets: usize,
    pub record_lists: usize,
    pub record_gets: usize,
    pub updates: usize,
}

#[derive(Debug, Default)]
struct Inner {
    schemas: Vec<Schema>,
    records: BTreeMap<RecordId, Record>,
    unreachable: BTreeSet<RecordId>,
    listing_down: bool,
    counts: FetchCounts,
}

/// Record store held in process memory. Backs demo mode and engine tests,
/// and enforces the same version check as the remote API.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new(schemas: Vec<Schema>, records: Vec<Record>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                schemas,
                records: records
                    .into_iter()
                    .map(|record| (record.id.clone(), record))
                    .collect(),
                unreachable: BTreeSet::new(),
                listing_down: false,
                counts: FetchCounts::default(),
            }),
        }
    }

    /// Makes every fetch and update of `id` fail from now on.
    pub fn make_unreachable(&self, id: impl Into<RecordId>) {
        self.lock().unreachable.insert(id.into());
    }

    /// Makes every record listing fail from now on.
    pub fn fail_record_lists(&self) {
        self.lock().listing_down = true;
    }

    pub fn counts(&self) -> FetchCounts {
        self.lock().counts
    }

    pub fn record(&self, id: &RecordId) -> Option<Record> {
        self.lock().records.get(id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RecordStore for InMemoryStore {
    fn list_schemas(&self) -> Result<Vec<Schema>> {
        let mut inner = self.lock();
        inner.counts.schema_lists += 1;
        Ok(inner.schemas.clone())
    }

    fn get_schema(&self, id: &SchemaId) -> Result<Schema> {
        let mut inner = self.lock();
        inner.counts.schema_gets += 1;
        match inner.schemas.iter().find(|schema| &schema.id == id) {
            Some(schema) => Ok(schema.clone()),
            None => bail!("schema {id} not found"),
        }
    }

    fn get_records(
        &self,
        schema_id: &SchemaId,
        order_field: Option<&FieldId>,
        limit: usize,
    ) -> Result<Vec<Record>> {
        let mut inner = self.lock();
        inner.counts.record_lists += 1;
        if inner.listing_down {
            bail!("listing records of {schema_id} failed");
        }
        let mut records = inner
            .records
            .values()
            .filter(|record| record.schema_id.as_ref() == Some(schema_id))
            .cloned()
            .collect::<Vec<_>>();
        if let Some(field) = order_field {
            records.sort_by(|left, right| {
                compare_values(
                    left.value(field, DEFAULT_LOCALE),
                    right.value(field, DEFAULT_LOCALE),
                )
            });
        }
        records.truncate(limit);
        Ok(records)
    }

    fn get_record(&self, id: &RecordId) -> Result<Record> {
        let mut inner = self.lock();
        inner.counts.record_gets += 1;
        if inner.unreachable.contains(id) {
            bail!("record {id} is unreachable");
        }
        match inner.records.get(id) {
            Some(record) => Ok(record.clone()),
            None => bail!("record {id} not found"),
        }
    }

    fn update_record(&self, id: &RecordId, record: &Record) -> Result<Record> {
        let mut inner = self.lock();
        inner.counts.updates += 1;
        if inner.unreachable.contains(id) {
            bail!("record {id} is unreachable");
        }
        let Some(stored) = inner.records.get_mut(id) else {
            bail!("record {id} not found");
        };
        if stored.version != record.version {
            bail!(
                "version mismatch for {id}: stored {}, sent {} -- reload and retry",
                stored.version,
                record.version
            );
        }
        stored.fields = record.fields.clone();
        stored.version += 1;
        stored.updated_at = OffsetDateTime::now_utc();
        Ok(stored.clone())
    }
}

fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(left), Some(right)) => match (left.as_f64(), right.as_f64()) {
            (Some(left), Some(right)) => left.total_cmp(&right),
            _ => left.edit_text().cmp(&right.edit_text()),
        },
    }
}
