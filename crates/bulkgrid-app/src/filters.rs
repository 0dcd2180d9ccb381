// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::{FieldId, Record, RecordId, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub field_id: FieldId,
    pub target_id: RecordId,
    pub title: String,
}

impl FilterOption {
    pub fn matches(&self, record: &Record, locale: &str) -> bool {
        record
            .value(&self.field_id, locale)
            .and_then(Value::link_target_id)
            .is_some_and(|target| target == &self.target_id)
    }

    fn same_target(&self, other: &Self) -> bool {
        self.field_id == other.field_id && self.target_id == other.target_id
    }
}

/// Per-field filter options derived from single-link values. Always rebuilt
/// from a full record set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterIndex {
    by_field: BTreeMap<FieldId, Vec<FilterOption>>,
}

impl FilterIndex {
    pub fn build(records: &[Record], locale: &str) -> Self {
        let mut by_field: BTreeMap<FieldId, Vec<FilterOption>> = BTreeMap::new();

        for record in records {
            for (field_id, localized) in &record.fields {
                let Some(value) = localized.get(locale) else {
                    continue;
                };
                let Some(target_id) = value.link_target_id() else {
                    continue;
                };
                let options = by_field.entry(field_id.clone()).or_default();
                if options.iter().any(|option| &option.target_id == target_id) {
                    continue;
                }
                let title = match value {
                    Value::Resolved(target) => target.title(locale),
                    _ => target_id.to_string(),
                };
                options.push(FilterOption {
                    field_id: field_id.clone(),
                    target_id: target_id.clone(),
                    title,
                });
            }
        }

        for options in by_field.values_mut() {
            options.sort_by(compare_titles);
        }

        Self { by_field }
    }

    pub fn options(&self, field_id: &FieldId) -> &[FilterOption] {
        self.by_field
            .get(field_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.by_field.is_empty()
    }
}

fn compare_titles(left: &FilterOption, right: &FilterOption) -> Ordering {
    left.title
        .to_lowercase()
        .cmp(&right.title.to_lowercase())
        .then_with(|| left.title.cmp(&right.title))
        .then_with(|| left.target_id.cmp(&right.target_id))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterToggle {
    Applied,
    Cleared,
}

/// Currently applied filters. Toggling never accumulates: the same option
/// clears the set and a different option replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActiveFilters {
    filters: Vec<FilterOption>,
}

impl ActiveFilters {
    pub fn toggle(&mut self, option: FilterOption) -> FilterToggle {
        if self.filters.iter().any(|active| active.same_target(&option)) {
            self.filters.clear();
            FilterToggle::Cleared
        } else {
            self.filters = vec![option];
            FilterToggle::Applied
        }
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterOption> {
        self.filters.iter()
    }

    pub fn is_active(&self, option: &FilterOption) -> bool {
        self.filters.iter().any(|active| active.same_target(option))
    }
}

/// Indices of the records visible under `filters`, in record order. Active
/// predicates are OR-combined; an empty set keeps every record.
pub fn filtered_view(records: &[Record], filters: &ActiveFilters, locale: &str) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| {
            filters.is_empty() || filters.iter().any(|filter| filter.matches(record, locale))
        })
        .map(|(index, _)| index)
        .collect()
}
