// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use bulkgrid_app::{
    ChangeBuffer, Coercion, FieldKind, PendingFields, Record, RecordId, SaveFailure, SaveReport,
    Schema,
};
use tracing::{info, warn};

use crate::RecordStore;
use crate::fanout::fan_out;

/// Writes every buffered edit back to the store, one fetch-merge-update per
/// record. Records fail independently; the report says which ones did.
pub fn save_changes<S>(
    store: &S,
    schema: &Schema,
    changes: &ChangeBuffer,
    locale: &str,
) -> SaveReport
where
    S: RecordStore + ?Sized,
{
    let work = changes.iter().collect::<Vec<_>>();
    let results = fan_out(&work, |(record_id, pending)| {
        save_record(store, schema, record_id, pending, locale)
    });

    let mut report = SaveReport::default();
    for ((record_id, _), result) in work.into_iter().zip(results) {
        match result {
            Ok(()) => report.saved.push(record_id.clone()),
            Err(error) => {
                let message = format!("{error:#}");
                warn!(record_id = %record_id, error = %message, "record update failed");
                report.failed.push(SaveFailure {
                    record_id: record_id.clone(),
                    message,
                });
            }
        }
    }
    info!(
        schema = %schema.id,
        saved = report.saved.len(),
        failed = report.failed.len(),
        "saved pending edits"
    );
    report
}

fn save_record<S>(
    store: &S,
    schema: &Schema,
    record_id: &RecordId,
    pending: &PendingFields,
    locale: &str,
) -> Result<()>
where
    S: RecordStore + ?Sized,
{
    let mut record = store
        .get_record(record_id)
        .with_context(|| format!("fetch record {record_id}"))?;
    merge_pending(&mut record, schema, pending, locale)?;
    store
        .update_record(record_id, &record)
        .with_context(|| format!("update record {record_id}"))?;
    Ok(())
}

/// Folds pending values into `record` under `locale`, coerced to each
/// field's declared kind. Other fields and other locales are left as fetched.
pub fn merge_pending(
    record: &mut Record,
    schema: &Schema,
    pending: &PendingFields,
    locale: &str,
) -> Result<()> {
    for (field_id, value) in pending {
        let coercion = schema
            .field_kind(field_id)
            .map_or(Coercion::Verbatim, FieldKind::coercion);
        let coerced = coercion
            .apply(value)
            .with_context(|| format!("field {field_id}"))?;
        record
            .fields
            .entry(field_id.clone())
            .or_default()
            .insert(locale.to_owned(), coerced);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::merge_pending;
    use bulkgrid_app::{Field, FieldId, FieldKind, Record, RecordId, Schema, SchemaId, Value};
    use std::collections::BTreeMap;
    use time::OffsetDateTime;

    fn schema() -> Schema {
        Schema {
            id: SchemaId::from("article"),
            name: "Article".to_owned(),
            display_field: Some(FieldId::from("title")),
            fields: vec![
                Field::new("title", "Title", FieldKind::Symbol),
                Field::new("score", "Score", FieldKind::Integer),
                Field::new("rating", "Rating", FieldKind::Number),
            ],
        }
    }

    fn record() -> Record {
        Record {
            id: RecordId::from("a"),
            schema_id: Some(SchemaId::from("article")),
            version: 4,
            published_at: None,
            updated_at: OffsetDateTime::UNIX_EPOCH,
            fields: BTreeMap::from([
                (
                    FieldId::from("title"),
                    BTreeMap::from([
                        ("en-US".to_owned(), Value::text("Hello")),
                        ("de-DE".to_owned(), Value::text("Hallo")),
                    ]),
                ),
                (
                    FieldId::from("score"),
                    BTreeMap::from([("en-US".to_owned(), Value::Integer(1))]),
                ),
            ]),
        }
    }

    #[test]
    fn integer_fields_are_coerced_and_empty_text_kept() -> anyhow::Result<()> {
        let mut target = record();
        let pending = BTreeMap::from([(FieldId::from("score"), Value::text("42"))]);
        merge_pending(&mut target, &schema(), &pending, "en-US")?;
        assert_eq!(
            target.value(&FieldId::from("score"), "en-US"),
            Some(&Value::Integer(42))
        );

        let pending = BTreeMap::from([(FieldId::from("score"), Value::text(""))]);
        merge_pending(&mut target, &schema(), &pending, "en-US")?;
        assert_eq!(
            target.value(&FieldId::from("score"), "en-US"),
            Some(&Value::text(""))
        );
        Ok(())
    }

    #[test]
    fn merge_preserves_other_locales_and_fields() -> anyhow::Result<()> {
        let mut target = record();
        let pending = BTreeMap::from([(FieldId::from("title"), Value::text("Howdy"))]);
        merge_pending(&mut target, &schema(), &pending, "en-US")?;

        assert_eq!(target.text("title", "en-US"), Some("Howdy"));
        assert_eq!(target.text("title", "de-DE"), Some("Hallo"));
        assert_eq!(
            target.value(&FieldId::from("score"), "en-US"),
            Some(&Value::Integer(1))
        );
        Ok(())
    }

    #[test]
    fn non_numeric_input_fails_the_record() {
        let mut target = record();
        let pending = BTreeMap::from([(FieldId::from("rating"), Value::text("lots"))]);
        let error = merge_pending(&mut target, &schema(), &pending, "en-US")
            .expect_err("non-numeric rating should fail");
        assert!(format!("{error:#}").contains("rating"));
    }
}
