// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

use crate::{ChangeBuffer, EditorKind, FieldId, GridView, Selection, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkEditKind {
    Number,
    Text,
}

impl BulkEditKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Text => "text",
        }
    }

    /// Value written into each selected cell. Numeric input that does not
    /// parse is staged as text and left for the reconciler to reject.
    pub fn stage(self, raw: &str) -> Value {
        match self {
            Self::Text => Value::text(raw),
            Self::Number => match raw.trim().parse::<f64>() {
                Ok(number) if number.is_finite() && !raw.trim().is_empty() => {
                    Value::Number(number)
                }
                _ => Value::text(raw),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BulkEditForm {
    pub kind: BulkEditKind,
    pub column: usize,
    pub field_id: FieldId,
    pub value: String,
    pub targets: usize,
}

impl BulkEditForm {
    /// Seeds the form from the first selected cell, preferring its pending
    /// edit over the stored value.
    pub fn open(
        selection: &Selection,
        grid: &GridView<'_>,
        changes: &ChangeBuffer,
        locale: &str,
    ) -> Result<Self> {
        let Some(first) = selection.first() else {
            bail!("bulk edit needs a selection -- select cells first and retry");
        };
        let Some((record, field)) = grid.resolve(first) else {
            bail!("selected column is no longer in the grid -- reselect cells and retry");
        };
        if !field.kind.is_selectable() {
            bail!("field {} is read-only", field.name);
        }

        let current = changes
            .pending(&record.id, &field.id)
            .or_else(|| record.value(&field.id, locale))
            .unwrap_or(&Value::Null);
        let kind = if current.is_numeric() || field.kind.editor() == EditorKind::Numeric {
            BulkEditKind::Number
        } else {
            BulkEditKind::Text
        };

        Ok(Self {
            kind,
            column: first.col,
            field_id: field.id.clone(),
            value: current.edit_text(),
            targets: selection.len(),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.targets == 0 {
            bail!("bulk edit needs a selection -- select cells first and retry");
        }
        if self.kind == BulkEditKind::Number {
            let trimmed = self.value.trim();
            if !trimmed.is_empty() && !matches!(self.kind.stage(trimmed), Value::Number(_)) {
                bail!(
                    "bulk value {:?} is not a number -- enter a number and retry",
                    self.value
                );
            }
        }
        Ok(())
    }
}
