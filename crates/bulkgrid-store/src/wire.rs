// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! JSON shapes of the Content Management API and their conversion to the
//! engine's typed model.

use anyhow::{Context, Result, anyhow};
use bulkgrid_app::{
    Field, FieldId, FieldKind, LinkKind, LinkRef, LocalizedValue, Record, RecordId, Schema,
    SchemaId, Value,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as Json};
use std::collections::BTreeMap;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const CONTENT_TYPE: &str = "application/vnd.contentful.management.v1+json";
pub const VERSION_HEADER: &str = "X-Contentful-Version";

#[derive(Debug, Clone, Deserialize)]
pub struct Collection<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkSys {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkEnvelope {
    pub sys: LinkSys,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentTypeSys {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentTypeDto {
    pub sys: ContentTypeSys,
    #[serde(default)]
    pub name: String,
    pub display_field: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemsDto {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDto {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub link_type: Option<String>,
    pub items: Option<ItemsDto>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub omitted: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySys {
    pub id: String,
    #[serde(default)]
    pub version: u64,
    pub published_at: Option<String>,
    pub updated_at: Option<String>,
    pub content_type: Option<LinkEnvelope>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntryDto {
    pub sys: EntrySys,
    #[serde(default)]
    pub fields: BTreeMap<String, BTreeMap<String, Json>>,
}

/// Body of an entry update.
#[derive(Debug, Clone, Serialize)]
pub struct EntryUpdate {
    pub fields: BTreeMap<String, BTreeMap<String, Json>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorSys {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub sys: Option<ErrorSys>,
    pub message: Option<String>,
}

impl ContentTypeDto {
    pub fn into_schema(self) -> Result<Schema> {
        let schema_id = self.sys.id;
        let fields = self
            .fields
            .into_iter()
            .map(|field| {
                field
                    .into_field()
                    .with_context(|| format!("decode content type {schema_id}"))
            })
            .collect::<Result<Vec<_>>>()?;
        let name = if self.name.is_empty() {
            schema_id.clone()
        } else {
            self.name
        };
        Ok(Schema {
            id: SchemaId::new(schema_id),
            name,
            display_field: self.display_field.map(FieldId::new),
            fields,
        })
    }
}

impl FieldDto {
    pub fn into_field(self) -> Result<Field> {
        let kind = parse_kind(&self.kind, &self.id)?;
        let items = self
            .items
            .map(|items| parse_kind(&items.kind, &self.id))
            .transpose()?;
        let link_kind = match self.link_type {
            Some(link_type) => Some(LinkKind::parse(&link_type)),
            None if kind == FieldKind::Link => Some(LinkKind::Entry),
            None => None,
        };
        let name = if self.name.is_empty() {
            self.id.clone()
        } else {
            self.name
        };
        Ok(Field {
            id: FieldId::new(self.id),
            name,
            kind,
            link_kind,
            items,
            disabled: self.disabled,
            omitted: self.omitted,
        })
    }
}

fn parse_kind(raw: &str, field_id: &str) -> Result<FieldKind> {
    FieldKind::parse(raw).ok_or_else(|| anyhow!("field {field_id} has unknown type {raw:?}"))
}

impl EntryDto {
    pub fn into_record(self) -> Result<Record> {
        let id = self.sys.id;
        let updated_at = self
            .sys
            .updated_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()
            .with_context(|| format!("decode entry {id} updatedAt"))?
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);
        let published_at = self
            .sys
            .published_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()
            .with_context(|| format!("decode entry {id} publishedAt"))?;

        let fields = self
            .fields
            .into_iter()
            .map(|(field_id, localized)| {
                let values: LocalizedValue = localized
                    .into_iter()
                    .map(|(locale, value)| (locale, decode_value(value)))
                    .collect();
                (FieldId::new(field_id), values)
            })
            .collect();

        Ok(Record {
            id: RecordId::new(id),
            schema_id: self
                .sys
                .content_type
                .map(|link| SchemaId::new(link.sys.id)),
            version: self.sys.version,
            published_at,
            updated_at,
            fields,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(raw, &Rfc3339).with_context(|| format!("invalid timestamp {raw:?}"))
}

/// Converts a raw field value. Objects shaped like `{"sys": {"type": "Link"}}`
/// become link references; everything else maps structurally.
pub fn decode_value(value: Json) -> Value {
    match value {
        Json::Null => Value::Null,
        Json::Bool(flag) => Value::Bool(flag),
        Json::Number(number) => match number.as_i64() {
            Some(integer) => Value::Integer(integer),
            None => number.as_f64().map_or(Value::Null, Value::Number),
        },
        Json::String(text) => Value::Text(text),
        Json::Array(items) => Value::Array(items.into_iter().map(decode_value).collect()),
        Json::Object(map) => match link_ref(&map) {
            Some(link) => Value::Link(link),
            None => Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, decode_value(value)))
                    .collect(),
            ),
        },
    }
}

fn link_ref(map: &Map<String, Json>) -> Option<LinkRef> {
    let sys = map.get("sys")?.as_object()?;
    if sys.get("type")?.as_str()? != "Link" {
        return None;
    }
    let kind = sys
        .get("linkType")
        .and_then(Json::as_str)
        .map_or(LinkKind::Entry, LinkKind::parse);
    let id = sys.get("id")?.as_str()?;
    Some(LinkRef {
        kind,
        id: RecordId::from(id),
    })
}

/// Inverse of [`decode_value`]. Resolved records collapse back to the link
/// they were resolved from.
pub fn encode_value(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(flag) => Json::Bool(*flag),
        Value::Integer(integer) => Json::Number(Number::from(*integer)),
        Value::Number(number) => Number::from_f64(*number).map_or(Json::Null, Json::Number),
        Value::Text(text) => Json::String(text.clone()),
        Value::Array(items) => Json::Array(items.iter().map(encode_value).collect()),
        Value::Link(link) => encode_link(link.kind.as_str(), link.id.as_str()),
        Value::Resolved(record) => encode_link(LinkKind::Entry.as_str(), record.id.as_str()),
        Value::Object(map) => Json::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), encode_value(value)))
                .collect(),
        ),
    }
}

fn encode_link(kind: &str, id: &str) -> Json {
    serde_json::json!({
        "sys": {
            "type": "Link",
            "linkType": kind,
            "id": id,
        }
    })
}

pub fn encode_fields(record: &Record) -> EntryUpdate {
    EntryUpdate {
        fields: record
            .fields
            .iter()
            .map(|(field_id, localized)| {
                (
                    field_id.to_string(),
                    localized
                        .iter()
                        .map(|(locale, value)| (locale.clone(), encode_value(value)))
                        .collect(),
                )
            })
            .collect(),
    }
}
