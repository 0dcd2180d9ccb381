// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use time::Date;
use time::macros::format_description;

use crate::{FieldKind, Value};

pub const EMPTY_CELL: &str = "--";
const RICH_TEXT_PLACEHOLDER: &str = "[Rich Text Field]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    Text,
    Numeric,
    ReadOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Verbatim,
    Integer,
    Number,
}

impl FieldKind {
    pub const fn editor(self) -> EditorKind {
        match self {
            Self::Symbol | Self::Text => EditorKind::Text,
            Self::Integer | Self::Number => EditorKind::Numeric,
            Self::Boolean
            | Self::Date
            | Self::Location
            | Self::Link
            | Self::Array
            | Self::RichText
            | Self::Object => EditorKind::ReadOnly,
        }
    }

    pub const fn coercion(self) -> Coercion {
        match self {
            Self::Integer => Coercion::Integer,
            Self::Number => Coercion::Number,
            Self::Symbol
            | Self::Text
            | Self::Boolean
            | Self::Date
            | Self::Location
            | Self::Link
            | Self::Array
            | Self::RichText
            | Self::Object => Coercion::Verbatim,
        }
    }

    /// Cells of this kind may be edited inline and join a bulk selection.
    pub const fn is_selectable(self) -> bool {
        !matches!(self.editor(), EditorKind::ReadOnly)
    }

    pub const fn is_filterable(self) -> bool {
        matches!(self, Self::Link)
    }
}

impl Coercion {
    /// Converts a pending edit into the value written to the store. Empty text
    /// is written as-is rather than becoming zero.
    pub fn apply(self, value: &Value) -> Result<Value> {
        match (self, value) {
            (Self::Verbatim, _) => Ok(value.clone()),
            (_, Value::Text(text)) if text.is_empty() => Ok(value.clone()),
            (Self::Integer, Value::Text(text)) => parse_integer(text).map(Value::Integer),
            (Self::Integer, Value::Integer(_)) => Ok(value.clone()),
            (Self::Integer, Value::Number(number)) => integral(*number, &number.to_string()),
            (Self::Number, Value::Text(text)) => parse_number(text).map(Value::Number),
            (Self::Number, Value::Integer(_) | Value::Number(_)) => Ok(value.clone()),
            (_, Value::Null) => Ok(Value::Null),
            (_, other) => bail!("numeric field cannot hold {}", other.compact()),
        }
    }
}

fn parse_number(text: &str) -> Result<f64> {
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => bail!("invalid number {text:?}"),
    }
}

fn parse_integer(text: &str) -> Result<i64> {
    let trimmed = text.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Ok(value);
    }
    match integral(parse_number(text)?, text)? {
        Value::Integer(value) => Ok(value),
        _ => bail!("invalid integer {text:?}"),
    }
}

// 2^63; `i64::MAX as f64` rounds up to it, so the upper bound is exclusive.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn integral(number: f64, raw: &str) -> Result<Value> {
    if number.fract() != 0.0 {
        bail!("invalid integer {raw:?}; integer fields need a whole number");
    }
    if !(-I64_BOUND..I64_BOUND).contains(&number) {
        bail!("integer {raw:?} is out of range for a 64-bit integer field");
    }
    Ok(Value::Integer(number as i64))
}

/// Display text for one cell, dispatched on the column's field kind.
pub fn format_cell(kind: FieldKind, value: Option<&Value>, locale: &str) -> String {
    let value = value.unwrap_or(&Value::Null);
    match kind {
        FieldKind::Symbol | FieldKind::Text => match value {
            Value::Text(text) if !text.is_empty() => text.clone(),
            Value::Null | Value::Text(_) => EMPTY_CELL.to_owned(),
            other => other.edit_text(),
        },
        FieldKind::Integer | FieldKind::Number => format_numeric(value),
        FieldKind::Boolean => match value {
            Value::Bool(true) => "true".to_owned(),
            _ => "false".to_owned(),
        },
        FieldKind::Date => format_date(value),
        FieldKind::Location => format_location(value),
        FieldKind::Link => match value {
            Value::Null => EMPTY_CELL.to_owned(),
            other => format_link(other, locale),
        },
        FieldKind::Array => match value {
            Value::Array(items) if !items.is_empty() => items
                .iter()
                .map(|item| format_array_item(item, locale))
                .collect::<Vec<_>>()
                .join(", "),
            _ => EMPTY_CELL.to_owned(),
        },
        FieldKind::RichText => RICH_TEXT_PLACEHOLDER.to_owned(),
        FieldKind::Object => match value {
            Value::Null => EMPTY_CELL.to_owned(),
            other => other.compact(),
        },
    }
}

/// Link rendering. Unresolved and dangling links fall back to `Link: <id>`.
pub fn format_link(value: &Value, locale: &str) -> String {
    match value {
        Value::Resolved(record) => record
            .text("name", locale)
            .filter(|name| !name.is_empty())
            .map_or_else(|| format!("Link: {}", record.id), str::to_owned),
        Value::Link(link) => format!("Link: {}", link.id),
        other => other.compact(),
    }
}

fn format_array_item(item: &Value, locale: &str) -> String {
    match item {
        Value::Link(_) | Value::Resolved(_) => format_link(item, locale),
        Value::Text(text) => text.clone(),
        Value::Integer(_) | Value::Number(_) | Value::Bool(_) => item.edit_text(),
        other => other.compact(),
    }
}

fn format_numeric(value: &Value) -> String {
    match value {
        Value::Integer(number) => group_digits(&number.unsigned_abs().to_string(), *number < 0),
        Value::Number(number) => format_decimal(*number),
        Value::Text(text) => match text.trim().parse::<f64>() {
            Ok(number) if number.is_finite() && !text.trim().is_empty() => format_decimal(number),
            _ => EMPTY_CELL.to_owned(),
        },
        _ => EMPTY_CELL.to_owned(),
    }
}

fn format_decimal(number: f64) -> String {
    if !number.is_finite() {
        return EMPTY_CELL.to_owned();
    }
    let rounded = format!("{:.3}", number.abs());
    let (whole, fraction) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');
    let negative = number < 0.0 && (whole != "0" || !fraction.is_empty());
    let mut out = group_digits(whole, negative);
    if !fraction.is_empty() {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

fn group_digits(digits: &str, negative: bool) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if negative {
        out.push('-');
    }
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn format_date(value: &Value) -> String {
    let Value::Text(text) = value else {
        return EMPTY_CELL.to_owned();
    };
    let layout = format_description!("[year]-[month]-[day]");
    text.get(..10)
        .and_then(|prefix| Date::parse(prefix, layout).ok())
        .map_or_else(
            || {
                if text.is_empty() {
                    EMPTY_CELL.to_owned()
                } else {
                    text.clone()
                }
            },
            |date| date.to_string(),
        )
}

fn format_location(value: &Value) -> String {
    let Value::Object(map) = value else {
        return EMPTY_CELL.to_owned();
    };
    match (
        map.get("lat").and_then(Value::as_f64),
        map.get("lon").and_then(Value::as_f64),
    ) {
        (Some(lat), Some(lon)) => format!("Lat: {lat}, Lon: {lon}"),
        _ => EMPTY_CELL.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::{Coercion, EditorKind, format_cell};
    use crate::{FieldId, FieldKind, LinkRef, Record, RecordId, Value};
    use std::collections::BTreeMap;
    use time::OffsetDateTime;

    fn named_record(id: &str, name: Option<&str>) -> Record {
        let mut fields = BTreeMap::new();
        if let Some(name) = name {
            fields.insert(
                FieldId::from("name"),
                BTreeMap::from([("en-US".to_owned(), Value::text(name))]),
            );
        }
        Record {
            id: RecordId::from(id),
            schema_id: None,
            version: 1,
            published_at: None,
            updated_at: OffsetDateTime::UNIX_EPOCH,
            fields,
        }
    }

    #[test]
    fn only_text_and_numeric_kinds_are_selectable() {
        let selectable = FieldKind::ALL
            .iter()
            .filter(|kind| kind.is_selectable())
            .copied()
            .collect::<Vec<_>>();
        assert_eq!(
            selectable,
            vec![
                FieldKind::Symbol,
                FieldKind::Text,
                FieldKind::Integer,
                FieldKind::Number
            ]
        );
        assert_eq!(FieldKind::Link.editor(), EditorKind::ReadOnly);
        assert!(FieldKind::Link.is_filterable());
    }

    #[test]
    fn integer_coercion_parses_and_keeps_empty_text() -> anyhow::Result<()> {
        assert_eq!(
            Coercion::Integer.apply(&Value::text("42"))?,
            Value::Integer(42)
        );
        assert_eq!(Coercion::Integer.apply(&Value::text(""))?, Value::text(""));
        assert_eq!(
            Coercion::Integer.apply(&Value::text(" 7.0 "))?,
            Value::Integer(7)
        );
        Ok(())
    }

    #[test]
    fn integer_coercion_rejects_fractions_and_garbage() {
        assert!(Coercion::Integer.apply(&Value::text("1.5")).is_err());
        assert!(Coercion::Integer.apply(&Value::text("abc")).is_err());
        assert!(Coercion::Number.apply(&Value::text("NaN")).is_err());
    }

    #[test]
    fn integer_coercion_rejects_values_past_i64() -> anyhow::Result<()> {
        assert!(
            Coercion::Integer
                .apply(&Value::text("9223372036854775808"))
                .is_err()
        );
        assert!(Coercion::Integer.apply(&Value::Number(9.3e18)).is_err());
        assert!(Coercion::Integer.apply(&Value::Number(-1e19)).is_err());
        assert_eq!(
            Coercion::Integer.apply(&Value::text("-9223372036854775808"))?,
            Value::Integer(i64::MIN)
        );
        Ok(())
    }

    #[test]
    fn number_and_verbatim_coercion() -> anyhow::Result<()> {
        assert_eq!(
            Coercion::Number.apply(&Value::text("2.5"))?,
            Value::Number(2.5)
        );
        assert_eq!(
            Coercion::Verbatim.apply(&Value::text("12"))?,
            Value::text("12")
        );
        Ok(())
    }

    #[test]
    fn numbers_are_grouped() {
        assert_eq!(
            format_cell(FieldKind::Integer, Some(&Value::Integer(1_234_567)), "en-US"),
            "1,234,567"
        );
        assert_eq!(
            format_cell(FieldKind::Number, Some(&Value::Number(-1234.5)), "en-US"),
            "-1,234.5"
        );
        assert_eq!(
            format_cell(FieldKind::Number, Some(&Value::text("oops")), "en-US"),
            "--"
        );
        assert_eq!(format_cell(FieldKind::Integer, None, "en-US"), "--");
    }

    #[test]
    fn links_render_name_or_fallback() {
        let resolved = Value::Resolved(Box::new(named_record("x", Some("X title"))));
        assert_eq!(
            format_cell(FieldKind::Link, Some(&resolved), "en-US"),
            "X title"
        );

        let nameless = Value::Resolved(Box::new(named_record("y", None)));
        assert_eq!(
            format_cell(FieldKind::Link, Some(&nameless), "en-US"),
            "Link: y"
        );

        let dangling = Value::Link(LinkRef::entry("gone"));
        assert_eq!(
            format_cell(FieldKind::Link, Some(&dangling), "en-US"),
            "Link: gone"
        );
    }

    #[test]
    fn structured_kinds_render_safely() {
        let location = Value::Object(BTreeMap::from([
            ("lat".to_owned(), Value::Number(52.5)),
            ("lon".to_owned(), Value::Number(13.4)),
        ]));
        assert_eq!(
            format_cell(FieldKind::Location, Some(&location), "en-US"),
            "Lat: 52.5, Lon: 13.4"
        );
        assert_eq!(
            format_cell(
                FieldKind::Date,
                Some(&Value::text("2025-03-09T10:00:00Z")),
                "en-US"
            ),
            "2025-03-09"
        );
        assert_eq!(
            format_cell(
                FieldKind::Array,
                Some(&Value::Array(vec![Value::text("a"), Value::text("b")])),
                "en-US"
            ),
            "a, b"
        );
        assert_eq!(
            format_cell(FieldKind::RichText, Some(&Value::Null), "en-US"),
            "[Rich Text Field]"
        );
        assert_eq!(format_cell(FieldKind::Boolean, None, "en-US"), "false");
    }
}
