// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use bulkgrid_app::{LinkKind, LoadedSchema, RECORD_PAGE_LIMIT, Record, RecordId, SchemaId, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

use crate::RecordStore;
use crate::fanout::fan_out;

/// Loads one schema's records with every entry link swapped for its target
/// record, one hop deep. Schema and record fetch errors abort the load; a
/// target that cannot be fetched stays an unresolved link.
pub fn load_resolved<S>(store: &S, schema_id: &SchemaId, limit: usize) -> Result<LoadedSchema>
where
    S: RecordStore + ?Sized,
{
    let schema = store
        .get_schema(schema_id)
        .with_context(|| format!("load schema {schema_id}"))?;
    let records = store
        .get_records(
            schema_id,
            schema.display_field.as_ref(),
            limit.min(RECORD_PAGE_LIMIT),
        )
        .with_context(|| format!("load records of {schema_id}"))?;

    let ids = collect_link_ids(&records).into_iter().collect::<Vec<_>>();
    let fetched = fan_out(&ids, |id| store.get_record(id));

    let mut targets = BTreeMap::new();
    for (id, result) in ids.into_iter().zip(fetched) {
        match result {
            Ok(target) => {
                targets.insert(id, target);
            }
            Err(error) => warn!(
                target_id = %id,
                error = %format!("{error:#}"),
                "link target left unresolved"
            ),
        }
    }

    let records = records
        .into_iter()
        .map(|record| resolve_record(record, &targets))
        .collect::<Vec<_>>();
    info!(
        schema = %schema_id,
        records = records.len(),
        targets = targets.len(),
        "loaded schema"
    );

    Ok(LoadedSchema { schema, records })
}

/// Distinct ids of every entry link in any field and locale, looking inside
/// arrays.
pub fn collect_link_ids(records: &[Record]) -> BTreeSet<RecordId> {
    let mut ids = BTreeSet::new();
    for record in records {
        for localized in record.fields.values() {
            for value in localized.values() {
                collect_value(value, &mut ids);
            }
        }
    }
    ids
}

fn collect_value(value: &Value, ids: &mut BTreeSet<RecordId>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_value(item, ids);
            }
        }
        Value::Link(link) if link.kind == LinkKind::Entry => {
            ids.insert(link.id.clone());
        }
        Value::Null
        | Value::Bool(_)
        | Value::Integer(_)
        | Value::Number(_)
        | Value::Text(_)
        | Value::Link(_)
        | Value::Resolved(_)
        | Value::Object(_) => {}
    }
}

fn resolve_record(mut record: Record, targets: &BTreeMap<RecordId, Record>) -> Record {
    for localized in record.fields.values_mut() {
        for value in localized.values_mut() {
            let raw = std::mem::replace(value, Value::Null);
            *value = substitute_links(raw, targets);
        }
    }
    record
}

/// Replaces entry links found in `targets`, recursing through arrays. Links
/// without a target are returned unchanged.
pub fn substitute_links(value: Value, targets: &BTreeMap<RecordId, Record>) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| substitute_links(item, targets))
                .collect(),
        ),
        Value::Link(link) if link.kind == LinkKind::Entry => match targets.get(&link.id) {
            Some(target) => Value::Resolved(Box::new(target.clone())),
            None => Value::Link(link),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::{collect_link_ids, substitute_links};
    use bulkgrid_app::{FieldId, LinkKind, LinkRef, Record, RecordId, Value};
    use std::collections::BTreeMap;
    use time::OffsetDateTime;

    fn record(id: &str, fields: Vec<(&str, Value)>) -> Record {
        Record {
            id: RecordId::from(id),
            schema_id: None,
            version: 1,
            published_at: None,
            updated_at: OffsetDateTime::UNIX_EPOCH,
            fields: fields
                .into_iter()
                .map(|(field, value)| {
                    (
                        FieldId::from(field),
                        BTreeMap::from([("en-US".to_owned(), value)]),
                    )
                })
                .collect(),
        }
    }

    fn link(id: &str) -> Value {
        Value::Link(LinkRef::entry(id))
    }

    #[test]
    fn collects_distinct_entry_links_through_arrays() {
        let asset = Value::Link(LinkRef {
            kind: LinkKind::Asset,
            id: RecordId::from("img"),
        });
        let records = vec![
            record("a", vec![("category", link("x")), ("hero", asset)]),
            record(
                "b",
                vec![
                    ("category", link("x")),
                    ("related", Value::Array(vec![link("y"), link("x")])),
                ],
            ),
        ];
        let ids = collect_link_ids(&records)
            .into_iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["x", "y"]);
    }

    #[test]
    fn substitution_recurses_and_keeps_dangling_links() {
        let targets = BTreeMap::from([(RecordId::from("x"), record("x", vec![]))]);
        let value = Value::Array(vec![link("x"), link("gone")]);
        let Value::Array(items) = substitute_links(value, &targets) else {
            panic!("array expected");
        };
        assert!(matches!(&items[0], Value::Resolved(target) if target.id.as_str() == "x"));
        assert_eq!(items[1], link("gone"));
    }
}
