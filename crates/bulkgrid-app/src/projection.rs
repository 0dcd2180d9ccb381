// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{CellCoord, Field, FieldId, Record, Schema};

/// One grid column. `ctype_index` is the field's position in the schema so
/// later lookups do not rescan the field list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnEntry {
    pub field_id: FieldId,
    pub ctype_index: usize,
    pub filterable: bool,
}

/// The sticky, always-first title column. `field_id` is `None` when the
/// schema names a display field it does not contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayColumn {
    pub field_id: Option<FieldId>,
    pub ctype_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnProjection {
    pub display: DisplayColumn,
    pub columns: Vec<ColumnEntry>,
}

impl ColumnProjection {
    pub fn project(schema: &Schema) -> Self {
        let mut display = DisplayColumn {
            field_id: None,
            ctype_index: 0,
        };
        let mut columns = Vec::with_capacity(schema.fields.len());

        for (index, field) in schema.fields.iter().enumerate() {
            if schema.display_field.as_ref() == Some(&field.id) {
                display = DisplayColumn {
                    field_id: Some(field.id.clone()),
                    ctype_index: index,
                };
            }
            columns.push(ColumnEntry {
                field_id: field.id.clone(),
                ctype_index: index,
                filterable: field.kind.is_filterable(),
            });
        }

        Self { display, columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, col: usize) -> Option<&ColumnEntry> {
        self.columns.get(col)
    }

    pub fn field<'s>(&self, schema: &'s Schema, col: usize) -> Option<&'s Field> {
        self.column(col)
            .and_then(|entry| schema.fields.get(entry.ctype_index))
    }

    /// The title field; a missing display field degrades to the first field.
    pub fn display_field<'s>(&self, schema: &'s Schema) -> Option<&'s Field> {
        schema.fields.get(self.display.ctype_index)
    }
}

/// The visible grid: filtered rows joined with the column projection.
#[derive(Debug, Clone, Copy)]
pub struct GridView<'a> {
    pub schema: &'a Schema,
    pub records: &'a [Record],
    pub visible: &'a [usize],
    pub projection: &'a ColumnProjection,
}

impl<'a> GridView<'a> {
    pub fn row_count(&self) -> usize {
        self.visible.len()
    }

    pub fn record(&self, row: usize) -> Option<&'a Record> {
        self.visible
            .get(row)
            .and_then(|index| self.records.get(*index))
    }

    /// Resolves a grid coordinate to its owning record and field. Coordinates
    /// without a projection entry resolve to nothing.
    pub fn resolve(&self, coord: CellCoord) -> Option<(&'a Record, &'a Field)> {
        let record = self.record(coord.row)?;
        let field = self.projection.field(self.schema, coord.col)?;
        Some((record, field))
    }
}

#[cfg(test)]
mod tests {
    use super::ColumnProjection;
    use crate::{Field, FieldId, FieldKind, Schema, SchemaId};

    fn article() -> Schema {
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

    #[test]
    fn projection_keeps_schema_order_and_flags_links() {
        let projection = ColumnProjection::project(&article());
        let ids = projection
            .columns
            .iter()
            .map(|entry| entry.field_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["title", "views", "category"]);
        assert_eq!(
            projection
                .columns
                .iter()
                .map(|entry| entry.ctype_index)
                .collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert!(!projection.columns[1].filterable);
        assert!(projection.columns[2].filterable);
        assert_eq!(projection.display.field_id, Some(FieldId::from("title")));
    }

    #[test]
    fn display_field_not_first_keeps_its_index() {
        let mut schema = article();
        schema.display_field = Some(FieldId::from("views"));
        let projection = ColumnProjection::project(&schema);
        assert_eq!(projection.display.ctype_index, 1);
        assert_eq!(
            projection.display_field(&schema).map(|field| field.id.as_str()),
            Some("views")
        );
    }

    #[test]
    fn missing_display_field_falls_back_to_first_field() {
        let mut schema = article();
        schema.display_field = Some(FieldId::from("headline"));
        let projection = ColumnProjection::project(&schema);
        assert_eq!(projection.display.field_id, None);
        assert_eq!(projection.display.ctype_index, 0);
        assert_eq!(
            projection.display_field(&schema).map(|field| field.id.as_str()),
            Some("title")
        );
    }

    #[test]
    fn out_of_range_column_has_no_field() {
        let schema = article();
        let projection = ColumnProjection::project(&schema);
        assert!(projection.field(&schema, 3).is_none());
    }
}
