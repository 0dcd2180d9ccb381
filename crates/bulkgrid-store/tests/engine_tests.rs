// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use bulkgrid_app::{
    ActiveFilters, AppCommand, AppState, ChangeBuffer, DEFAULT_LOCALE, FieldId, FilterIndex,
    RecordId, SchemaId, Value, filtered_view,
};
use bulkgrid_store::{InMemoryStore, load_resolved, save_changes};
use bulkgrid_testkit::{ContentFaker, DemoContent, article_scenario};

fn store_of(content: DemoContent) -> InMemoryStore {
    InMemoryStore::new(content.schemas, content.records)
}

#[test]
fn each_distinct_link_target_is_fetched_once() -> Result<()> {
    let store = store_of(article_scenario());

    let loaded = load_resolved(&store, &SchemaId::from("article"), 1000)?;
    assert_eq!(loaded.records.len(), 3);

    let counts = store.counts();
    assert_eq!(counts.schema_gets, 1);
    assert_eq!(counts.record_lists, 1);
    assert_eq!(counts.record_gets, 2);

    for record in &loaded.records {
        let category = record.value(&FieldId::from("category"), DEFAULT_LOCALE);
        assert!(matches!(category, Some(Value::Resolved(_))));
    }
    Ok(())
}

#[test]
fn unknown_schema_aborts_before_listing_records() {
    let store = store_of(article_scenario());

    let error = load_resolved(&store, &SchemaId::from("missing"), 1000)
        .expect_err("unknown schema should fail the load");
    assert!(format!("{error:#}").contains("load schema missing"));

    let counts = store.counts();
    assert_eq!(counts.schema_gets, 1);
    assert_eq!(counts.record_lists, 0);
    assert_eq!(counts.record_gets, 0);
}

#[test]
fn record_listing_failure_aborts_the_load() {
    let store = store_of(article_scenario());
    store.fail_record_lists();

    let error = load_resolved(&store, &SchemaId::from("article"), 1000)
        .expect_err("listing failure should fail the load");
    let message = format!("{error:#}");
    assert!(message.contains("load records of article"));
    assert!(message.contains("listing records of article failed"));
    assert_eq!(store.counts().record_gets, 0);
}

#[test]
fn resolved_links_drive_filter_options_and_view() -> Result<()> {
    let store = store_of(article_scenario());
    let loaded = load_resolved(&store, &SchemaId::from("article"), 1000)?;

    let index = FilterIndex::build(&loaded.records, DEFAULT_LOCALE);
    let options = index.options(&FieldId::from("category"));
    let titles = options
        .iter()
        .map(|option| (option.target_id.as_str(), option.title.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(titles, vec![("X", "X title"), ("Y", "Y title")]);

    let mut state = AppState::default();
    state.dispatch(AppCommand::SchemaLoaded {
        loaded: loaded.clone(),
        reset_filters: true,
    });
    state.dispatch(AppCommand::ToggleFilter(options[0].clone()));
    let ids = state
        .visible
        .iter()
        .map(|index| loaded.records[*index].id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["A", "C"]);
    Ok(())
}

#[test]
fn unreachable_targets_stay_links_and_do_not_fail_the_load() -> Result<()> {
    let store = store_of(article_scenario());
    store.make_unreachable("Y");

    let loaded = load_resolved(&store, &SchemaId::from("article"), 1000)?;
    let b = loaded
        .records
        .iter()
        .find(|record| record.id.as_str() == "B")
        .expect("B should load");
    assert!(matches!(
        b.value(&FieldId::from("category"), DEFAULT_LOCALE),
        Some(Value::Link(link)) if link.id.as_str() == "Y"
    ));

    let index = FilterIndex::build(&loaded.records, DEFAULT_LOCALE);
    let titles = index
        .options(&FieldId::from("category"))
        .iter()
        .map(|option| option.title.clone())
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["X title", "Y"]);
    Ok(())
}

#[test]
fn load_is_capped_and_ordered_by_display_field() -> Result<()> {
    let store = store_of(article_scenario());
    let loaded = load_resolved(&store, &SchemaId::from("article"), 2)?;
    let ids = loaded
        .records
        .iter()
        .map(|record| record.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["A", "B"]);
    Ok(())
}

#[test]
fn save_reports_failures_without_touching_other_records() -> Result<()> {
    let store = store_of(article_scenario());
    let loaded = load_resolved(&store, &SchemaId::from("article"), 1000)?;
    store.make_unreachable("B");

    let mut changes = ChangeBuffer::default();
    changes.set_pending_edit(RecordId::from("A"), FieldId::from("views"), Value::text("42"));
    changes.set_pending_edit(RecordId::from("B"), FieldId::from("views"), Value::text("7"));
    changes.set_pending_edit(RecordId::from("C"), FieldId::from("views"), Value::text("many"));

    let report = save_changes(&store, &loaded.schema, &changes, DEFAULT_LOCALE);
    assert_eq!(report.saved, vec![RecordId::from("A")]);
    let failed = report
        .failed
        .iter()
        .map(|failure| failure.record_id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(failed, vec!["B", "C"]);
    assert_eq!(report.summary(), "saved 1, failed 2 (kept for retry)");

    let a = store
        .record(&RecordId::from("A"))
        .expect("A should exist");
    assert_eq!(a.version, 2);
    assert_eq!(
        a.value(&FieldId::from("views"), DEFAULT_LOCALE),
        Some(&Value::Integer(42))
    );
    assert!(matches!(
        a.value(&FieldId::from("category"), DEFAULT_LOCALE),
        Some(Value::Link(_))
    ));

    let c = store
        .record(&RecordId::from("C"))
        .expect("C should exist");
    assert_eq!(c.version, 1);
    assert_eq!(
        c.value(&FieldId::from("views"), DEFAULT_LOCALE),
        Some(&Value::Integer(30))
    );
    Ok(())
}

#[test]
fn demo_content_loads_every_schema() -> Result<()> {
    let content = ContentFaker::new(7).demo_content(40);
    let schema_ids = content
        .schemas
        .iter()
        .map(|schema| schema.id.clone())
        .collect::<Vec<_>>();
    let store = store_of(content);

    for schema_id in &schema_ids {
        let loaded = load_resolved(&store, schema_id, 1000)?;
        assert!(!loaded.records.is_empty(), "{schema_id} should have records");
    }

    let articles = load_resolved(&store, &SchemaId::from("article"), 1000)?;
    let index = FilterIndex::build(&articles.records, DEFAULT_LOCALE);
    assert!(!index.is_empty());
    let all = filtered_view(&articles.records, &ActiveFilters::default(), DEFAULT_LOCALE);
    assert_eq!(all.len(), articles.records.len());
    Ok(())
}
