// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use time::OffsetDateTime;

use crate::ids::*;

pub const DEFAULT_LOCALE: &str = "en-US";
pub const RECORD_PAGE_LIMIT: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Symbol,
    Text,
    Integer,
    Number,
    Boolean,
    Date,
    Location,
    Link,
    Array,
    RichText,
    Object,
}

impl FieldKind {
    pub const ALL: [Self; 11] = [
        Self::Symbol,
        Self::Text,
        Self::Integer,
        Self::Number,
        Self::Boolean,
        Self::Date,
        Self::Location,
        Self::Link,
        Self::Array,
        Self::RichText,
        Self::Object,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Symbol => "Symbol",
            Self::Text => "Text",
            Self::Integer => "Integer",
            Self::Number => "Number",
            Self::Boolean => "Boolean",
            Self::Date => "Date",
            Self::Location => "Location",
            Self::Link => "Link",
            Self::Array => "Array",
            Self::RichText => "RichText",
            Self::Object => "Object",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Symbol" => Some(Self::Symbol),
            "Text" => Some(Self::Text),
            "Integer" => Some(Self::Integer),
            "Number" => Some(Self::Number),
            "Boolean" => Some(Self::Boolean),
            "Date" => Some(Self::Date),
            "Location" => Some(Self::Location),
            "Link" => Some(Self::Link),
            "Array" => Some(Self::Array),
            "RichText" => Some(Self::RichText),
            "Object" => Some(Self::Object),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkKind {
    Entry,
    Asset,
    Other(String),
}

impl LinkKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Entry => "Entry",
            Self::Asset => "Asset",
            Self::Other(value) => value,
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "Entry" => Self::Entry,
            "Asset" => Self::Asset,
            other => Self::Other(other.to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    pub name: String,
    pub kind: FieldKind,
    pub link_kind: Option<LinkKind>,
    pub items: Option<FieldKind>,
    pub disabled: bool,
    pub omitted: bool,
}

impl Field {
    pub fn new(id: impl Into<FieldId>, name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            link_kind: (kind == FieldKind::Link).then_some(LinkKind::Entry),
            items: None,
            disabled: false,
            omitted: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub id: SchemaId,
    pub name: String,
    pub display_field: Option<FieldId>,
    pub fields: Vec<Field>,
}

impl Schema {
    /// Field lookup returning the field's position in the schema's own order.
    pub fn field(&self, id: &FieldId) -> Option<(usize, &Field)> {
        self.fields.iter().enumerate().find(|(_, field)| &field.id == id)
    }

    pub fn field_kind(&self, id: &FieldId) -> Option<FieldKind> {
        self.field(id).map(|(_, field)| field.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRef {
    pub kind: LinkKind,
    pub id: RecordId,
}

impl LinkRef {
    pub fn entry(id: impl Into<RecordId>) -> Self {
        Self {
            kind: LinkKind::Entry,
            id: id.into(),
        }
    }
}

/// A single localized field value. Link fields start out as `Link` and are
/// swapped for `Resolved` by one hop of link resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    Array(Vec<Value>),
    Link(LinkRef),
    Resolved(Box<Record>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Number(_))
    }

    /// Id of the record this value points at, resolved or not.
    pub fn link_target_id(&self) -> Option<&RecordId> {
        match self {
            Self::Link(link) => Some(&link.id),
            Self::Resolved(record) => Some(&record.id),
            _ => None,
        }
    }

    /// Text an inline editor starts from. Non-scalar values have no editable form.
    pub fn edit_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(value) => value.to_string(),
            Self::Integer(value) => value.to_string(),
            Self::Number(value) => value.to_string(),
            Self::Text(value) => value.clone(),
            Self::Array(_) | Self::Link(_) | Self::Resolved(_) | Self::Object(_) => String::new(),
        }
    }

    /// Structural equality between an authoritative value and raw editor input.
    /// Text input equals a scalar when it is that scalar's editable form.
    pub fn matches_input(&self, input: &Self) -> bool {
        if self == input {
            return true;
        }
        match (self, input) {
            (Self::Integer(left), Self::Number(right)) => (*left as f64) == *right,
            (Self::Number(left), Self::Integer(right)) => *left == (*right as f64),
            (
                Self::Null | Self::Bool(_) | Self::Integer(_) | Self::Number(_) | Self::Text(_),
                Self::Text(text),
            ) => self.edit_text() == *text,
            _ => false,
        }
    }

    /// Single-line rendering for structured values.
    pub fn compact(&self) -> String {
        let mut out = String::new();
        self.write_compact(&mut out);
        out
    }

    fn write_compact(&self, out: &mut String) {
        match self {
            Self::Null => out.push_str("null"),
            Self::Bool(value) => {
                let _ = write!(out, "{value}");
            }
            Self::Integer(value) => {
                let _ = write!(out, "{value}");
            }
            Self::Number(value) => {
                let _ = write!(out, "{value}");
            }
            Self::Text(value) => {
                let _ = write!(out, "{value:?}");
            }
            Self::Array(items) => {
                out.push('[');
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        out.push(',');
                    }
                    item.write_compact(out);
                }
                out.push(']');
            }
            Self::Link(link) => {
                let _ = write!(out, "<{} {}>", link.kind.as_str(), link.id);
            }
            Self::Resolved(record) => {
                let _ = write!(out, "<Entry {}>", record.id);
            }
            Self::Object(map) => {
                out.push('{');
                for (index, (key, value)) in map.iter().enumerate() {
                    if index > 0 {
                        out.push(',');
                    }
                    let _ = write!(out, "{key:?}:");
                    value.write_compact(out);
                }
                out.push('}');
            }
        }
    }
}

pub type LocalizedValue = BTreeMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublishStatus {
    Draft,
    Changed,
    Published,
}

impl PublishStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Changed => "changed",
            Self::Published => "published",
        }
    }

    pub const fn badge(self) -> char {
        match self {
            Self::Draft => 'd',
            Self::Changed => 'c',
            Self::Published => 'p',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub schema_id: Option<SchemaId>,
    pub version: u64,
    pub published_at: Option<OffsetDateTime>,
    pub updated_at: OffsetDateTime,
    pub fields: BTreeMap<FieldId, LocalizedValue>,
}

impl Record {
    pub fn value(&self, field: &FieldId, locale: &str) -> Option<&Value> {
        self.fields.get(field).and_then(|localized| localized.get(locale))
    }

    pub fn text(&self, field: &str, locale: &str) -> Option<&str> {
        self.fields
            .get(&FieldId::from(field))
            .and_then(|localized| localized.get(locale))
            .and_then(Value::as_text)
    }

    /// Human-readable title: `name`, then `title`, then the record id.
    pub fn title(&self, locale: &str) -> String {
        ["name", "title"]
            .iter()
            .filter_map(|field| self.text(field, locale))
            .find(|text| !text.is_empty())
            .map_or_else(|| self.id.to_string(), str::to_owned)
    }

    pub fn status(&self) -> PublishStatus {
        match self.published_at {
            None => PublishStatus::Draft,
            Some(published_at) if self.updated_at > published_at => PublishStatus::Changed,
            Some(_) => PublishStatus::Published,
        }
    }
}

/// One schema's worth of freshly resolved records.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSchema {
    pub schema: Schema,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveFailure {
    pub record_id: RecordId,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SaveReport {
    pub saved: Vec<RecordId>,
    pub failed: Vec<SaveFailure>,
}

impl SaveReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.failed.is_empty() {
            format!("saved {}", self.saved.len())
        } else {
            format!(
                "saved {}, failed {} (kept for retry)",
                self.saved.len(),
                self.failed.len()
            )
        }
    }
}
