// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use crate::{BulkEditKind, FieldId, GridView, Record, RecordId, Selection, Value};

pub type PendingFields = BTreeMap<FieldId, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Staged,
    Reverted,
}

/// Unsaved per-record, per-field edits. Values are raw user input: not yet
/// wrapped under a locale and not yet coerced to the field's type. A record
/// with no remaining edits has no entry at all.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChangeBuffer {
    edits: BTreeMap<RecordId, PendingFields>,
}

impl ChangeBuffer {
    pub fn set_pending_edit(&mut self, record_id: RecordId, field_id: FieldId, value: Value) {
        self.edits
            .entry(record_id)
            .or_default()
            .insert(field_id, value);
    }

    pub fn clear_pending_edit(&mut self, record_id: &RecordId, field_id: &FieldId) -> bool {
        let Some(fields) = self.edits.get_mut(record_id) else {
            return false;
        };
        let removed = fields.remove(field_id).is_some();
        if fields.is_empty() {
            self.edits.remove(record_id);
        }
        removed
    }

    pub fn is_edited(&self, record_id: &RecordId, field_id: &FieldId) -> bool {
        self.pending(record_id, field_id).is_some()
    }

    pub fn pending(&self, record_id: &RecordId, field_id: &FieldId) -> Option<&Value> {
        self.edits
            .get(record_id)
            .and_then(|fields| fields.get(field_id))
    }

    /// Stages `input` unless it equals the authoritative value, in which case
    /// any earlier edit of the cell is dropped.
    pub fn commit_edit(
        &mut self,
        record: &Record,
        field_id: &FieldId,
        input: Value,
        locale: &str,
    ) -> EditOutcome {
        let original = record.value(field_id, locale).unwrap_or(&Value::Null);
        if original.matches_input(&input) {
            self.clear_pending_edit(&record.id, field_id);
            EditOutcome::Reverted
        } else {
            self.set_pending_edit(record.id.clone(), field_id.clone(), input);
            EditOutcome::Staged
        }
    }

    /// Writes one value into every selected cell. Cells that no longer map to
    /// a record or column are skipped. Returns the number of cells staged.
    pub fn apply_bulk(
        &mut self,
        selection: &Selection,
        raw: &str,
        kind: BulkEditKind,
        grid: &GridView<'_>,
    ) -> usize {
        let value = kind.stage(raw);
        let mut staged = 0;
        for coord in selection.iter() {
            let Some((record, field)) = grid.resolve(coord) else {
                continue;
            };
            self.set_pending_edit(record.id.clone(), field.id.clone(), value.clone());
            staged += 1;
        }
        staged
    }

    /// Drops every edit of the given records, keeping the rest for retry.
    pub fn discard_records(&mut self, record_ids: &[RecordId]) {
        for record_id in record_ids {
            self.edits.remove(record_id);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RecordId, &PendingFields)> {
        self.edits.iter()
    }

    pub fn record_count(&self) -> usize {
        self.edits.len()
    }

    pub fn edit_count(&self) -> usize {
        self.edits.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn clear(&mut self) {
        self.edits.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangeBuffer, EditOutcome};
    use crate::{
        BulkEditKind, CellCoord, ClickModifier, ColumnProjection, Field, FieldId, FieldKind,
        GridView, Record, RecordId, Schema, SchemaId, Selection, Value,
    };
    use std::collections::BTreeMap;
    use time::OffsetDateTime;

    fn schema() -> Schema {
        Schema {
            id: SchemaId::from("article"),
            name: "Article".to_owned(),
            display_field: Some(FieldId::from("title")),
            fields: vec![
                Field::new("title", "Title", FieldKind::Symbol),
                Field::new("views", "Views", FieldKind::Integer),
                Field::new("category", "Category", FieldKind::Link),
            ],
        }
    }

    fn record(id: &str, views: i64) -> Record {
        Record {
            id: RecordId::from(id),
            schema_id: Some(SchemaId::from("article")),
            version: 1,
            published_at: None,
            updated_at: OffsetDateTime::UNIX_EPOCH,
            fields: BTreeMap::from([
                (
                    FieldId::from("title"),
                    BTreeMap::from([("en-US".to_owned(), Value::text(id))]),
                ),
                (
                    FieldId::from("views"),
                    BTreeMap::from([("en-US".to_owned(), Value::Integer(views))]),
                ),
            ]),
        }
    }

    #[test]
    fn clearing_last_edit_prunes_record() {
        let mut buffer = ChangeBuffer::default();
        let record_id = RecordId::from("a");
        let field_id = FieldId::from("views");

        buffer.set_pending_edit(record_id.clone(), field_id.clone(), Value::text("9"));
        assert!(buffer.is_edited(&record_id, &field_id));

        assert!(buffer.clear_pending_edit(&record_id, &field_id));
        assert!(buffer.is_empty());
        assert_eq!(buffer.iter().count(), 0);
        assert!(!buffer.clear_pending_edit(&record_id, &field_id));
    }

    #[test]
    fn set_overwrites_previous_value() {
        let mut buffer = ChangeBuffer::default();
        buffer.set_pending_edit("a".into(), "views".into(), Value::text("1"));
        buffer.set_pending_edit("a".into(), "views".into(), Value::text("2"));
        assert_eq!(
            buffer.pending(&"a".into(), &"views".into()),
            Some(&Value::text("2"))
        );
        assert_eq!(buffer.edit_count(), 1);
    }

    #[test]
    fn committing_original_value_reverts_edit() {
        let mut buffer = ChangeBuffer::default();
        let record = record("a", 5);
        let field_id = FieldId::from("views");

        let staged = buffer.commit_edit(&record, &field_id, Value::text("6"), "en-US");
        assert_eq!(staged, EditOutcome::Staged);
        assert!(buffer.is_edited(&record.id, &field_id));

        let reverted = buffer.commit_edit(&record, &field_id, Value::text("5"), "en-US");
        assert_eq!(reverted, EditOutcome::Reverted);
        assert!(!buffer.is_edited(&record.id, &field_id));
        assert!(buffer.is_empty());
    }

    #[test]
    fn bulk_edit_touches_only_selected_rows() {
        let schema = schema();
        let projection = ColumnProjection::project(&schema);
        let records = vec![record("a", 1), record("b", 2), record("c", 3)];
        let visible = vec![0, 1, 2];
        let grid = GridView {
            schema: &schema,
            records: &records,
            visible: &visible,
            projection: &projection,
        };

        let mut selection = Selection::default();
        selection.click(CellCoord::new(1, 0), ClickModifier::Extend);
        selection.click(CellCoord::new(1, 2), ClickModifier::Extend);

        let mut buffer = ChangeBuffer::default();
        let staged = buffer.apply_bulk(&selection, "10", BulkEditKind::Text, &grid);
        assert_eq!(staged, 2);

        let views = FieldId::from("views");
        assert_eq!(
            buffer.pending(&"a".into(), &views),
            Some(&Value::text("10"))
        );
        assert_eq!(
            buffer.pending(&"c".into(), &views),
            Some(&Value::text("10"))
        );
        assert!(!buffer.is_edited(&"b".into(), &views));
    }

    #[test]
    fn bulk_edit_skips_cells_without_projection() {
        let schema = schema();
        let projection = ColumnProjection::project(&schema);
        let records = vec![record("a", 1)];
        let visible = vec![0];
        let grid = GridView {
            schema: &schema,
            records: &records,
            visible: &visible,
            projection: &projection,
        };

        let mut selection = Selection::default();
        selection.click(CellCoord::new(9, 0), ClickModifier::Extend);

        let mut buffer = ChangeBuffer::default();
        assert_eq!(
            buffer.apply_bulk(&selection, "x", BulkEditKind::Text, &grid),
            0
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn discard_records_keeps_failed_ones() {
        let mut buffer = ChangeBuffer::default();
        buffer.set_pending_edit("a".into(), "views".into(), Value::text("1"));
        buffer.set_pending_edit("b".into(), "views".into(), Value::text("2"));
        buffer.discard_records(&[RecordId::from("a")]);
        assert_eq!(buffer.record_count(), 1);
        assert!(buffer.is_edited(&"b".into(), &"views".into()));
    }
}
