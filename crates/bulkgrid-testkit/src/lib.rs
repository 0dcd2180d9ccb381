// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use bulkgrid_app::{
    DEFAULT_LOCALE, Field, FieldId, FieldKind, LinkRef, LocalizedValue, Record,
    RecordId, Schema, SchemaId, Value,
};
use std::collections::BTreeMap;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

const CATEGORY_NAMES: [&str; 8] = [
    "Engineering",
    "Design",
    "Culture",
    "Product",
    "Security",
    "Operations",
    "Research",
    "Community",
];

const AUTHOR_NAMES: [&str; 14] = [
    "Ines Okafor",
    "Tomasz Lindqvist",
    "Mei Castellanos",
    "Jonah Adeyemi",
    "Priya Hallström",
    "Luca Fairweather",
    "Sanne Moreau",
    "Dmitri Achebe",
    "Ayla Kowalczyk",
    "Oren Takahashi",
    "Noor Vasquez",
    "Felix Nakamura",
    "Greta Osei",
    "Rafael Lindgren",
];

const TITLE_OPENERS: [&str; 10] = [
    "Notes on",
    "Rethinking",
    "A field guide to",
    "Lessons from",
    "Shipping",
    "Scaling",
    "Debugging",
    "Measuring",
    "Designing for",
    "Why we moved to",
];
const TITLE_SUBJECTS: [&str; 14] = [
    "release trains",
    "design reviews",
    "on-call rotations",
    "schema migrations",
    "content models",
    "feature flags",
    "incident reviews",
    "localization",
    "search ranking",
    "image pipelines",
    "editorial workflows",
    "API versioning",
    "cache invalidation",
    "accessibility audits",
];
const TAGS: [&str; 10] = [
    "howto", "deep-dive", "opinion", "news", "tooling", "process", "team", "launch", "infra",
    "ux",
];
const VENUES: [(f64, f64); 6] = [
    (52.52, 13.405),
    (48.8566, 2.3522),
    (40.7128, -74.006),
    (35.6762, 139.6503),
    (-33.8688, 151.2093),
    (47.6062, -122.3321),
];

const REFERENCE_NOW: OffsetDateTime = datetime!(2026-01-01 0:00 UTC);

/// A self-contained set of schemas and records for demo mode and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoContent {
    pub schemas: Vec<Schema>,
    pub records: Vec<Record>,
}

impl DemoContent {
    pub fn schema(&self, id: &str) -> Option<&Schema> {
        self.schemas.iter().find(|schema| schema.id.as_str() == id)
    }

    pub fn records_of(&self, schema_id: &str) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(move |record| {
            record
                .schema_id
                .as_ref()
                .is_some_and(|id| id.as_str() == schema_id)
        })
    }
}

/// splitmix64 generator backing seeded fixtures.
struct SplitMix {
    state: u64,
}

impl SplitMix {
    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn below(&mut self, bound: usize) -> usize {
        match bound {
            0 | 1 => 0,
            _ => (self.next_u64() % bound as u64) as usize,
        }
    }

    fn coin(&mut self) -> bool {
        self.next_u64() >> 63 == 1
    }
}

/// Seeded generator of linked CMS content: categories, authors, and articles
/// that reference both.
pub struct ContentFaker {
    rng: SplitMix,
}

impl ContentFaker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SplitMix { state: seed },
        }
    }

    pub fn demo_content(&mut self, articles: usize) -> DemoContent {
        let mut records = Vec::new();

        let categories = CATEGORY_NAMES
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let id = format!("category-{}", index + 1);
                records.push(self.record(
                    &id,
                    "category",
                    vec![
                        ("name", Value::text(*name)),
                        (
                            "description",
                            Value::text(format!("Posts about {}.", name.to_lowercase())),
                        ),
                    ],
                ));
                id
            })
            .collect::<Vec<_>>();

        let authors = (1..=6)
            .map(|index| {
                let id = format!("author-{index}");
                let name = self.pick(&AUTHOR_NAMES).to_owned();
                let followers = self.int_range(0, 25_000);
                records.push(self.record(
                    &id,
                    "author",
                    vec![
                        ("name", Value::text(name)),
                        ("bio", Value::text("Writes about the craft of shipping software.")),
                        ("followers", Value::Integer(followers)),
                    ],
                ));
                id
            })
            .collect::<Vec<_>>();

        for index in 1..=articles {
            let id = format!("article-{index}");
            let fields = self.article_fields(&categories, &authors);
            records.push(self.record(&id, "article", fields));
        }

        DemoContent {
            schemas: vec![article_schema(), category_schema(), author_schema()],
            records,
        }
    }

    fn article_fields(
        &mut self,
        categories: &[String],
        authors: &[String],
    ) -> Vec<(&'static str, Value)> {
        let title = format!(
            "{} {}",
            self.pick(&TITLE_OPENERS),
            self.pick(&TITLE_SUBJECTS)
        );
        let slug = title.to_lowercase().replace(' ', "-");
        let category = &categories[self.rng.below(categories.len())];
        let month = self.int_range(1, 12);
        let day = self.int_range(1, 28);
        let mut fields = vec![
            ("title", Value::text(title)),
            ("slug", Value::text(slug)),
            ("views", Value::Integer(self.int_range(0, 250_000))),
            (
                "rating",
                Value::Number(self.int_range(10, 50) as f64 / 10.0),
            ),
            ("category", Value::Link(LinkRef::entry(category.as_str()))),
            ("featured", Value::Bool(self.rng.coin())),
            (
                "publishDate",
                Value::text(format!("2025-{month:02}-{day:02}T09:00:00Z")),
            ),
            (
                "tags",
                Value::Array(vec![
                    Value::text(self.pick(&TAGS)),
                    Value::text(self.pick(&TAGS)),
                ]),
            ),
            (
                "body",
                Value::Object(BTreeMap::from([(
                    "nodeType".to_owned(),
                    Value::text("document"),
                )])),
            ),
        ];

        // Some articles have no author or summary so empty cells show up.
        if self.rng.below(5) > 0 {
            let author = &authors[self.rng.below(authors.len())];
            fields.push(("author", Value::Link(LinkRef::entry(author.as_str()))));
            fields.push((
                "summary",
                Value::text("A short look at what worked and what did not."),
            ));
        }
        if self.rng.coin() {
            let (lat, lon) = VENUES[self.rng.below(VENUES.len())];
            fields.push((
                "venue",
                Value::Object(BTreeMap::from([
                    ("lat".to_owned(), Value::Number(lat)),
                    ("lon".to_owned(), Value::Number(lon)),
                ])),
            ));
        }
        if self.rng.coin() {
            let related = &categories[self.rng.below(categories.len())];
            fields.push((
                "related",
                Value::Array(vec![
                    Value::Link(LinkRef::entry(related.as_str())),
                    Value::Link(LinkRef::entry("category-deleted")),
                ]),
            ));
        }
        fields.push((
            "seo",
            Value::Object(BTreeMap::from([(
                "noindex".to_owned(),
                Value::Bool(false),
            )])),
        ));
        fields
    }

    fn record(&mut self, id: &str, schema_id: &str, fields: Vec<(&str, Value)>) -> Record {
        let updated_at = REFERENCE_NOW - Duration::hours(self.int_range(1, 24 * 90));
        let published_at = match self.rng.below(4) {
            0 => None,
            1 => Some(updated_at - Duration::hours(self.int_range(1, 48))),
            _ => Some(updated_at),
        };
        let version = 1 + self.rng.below(20) as u64;
        build_record(id, schema_id, version, published_at, updated_at, fields)
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.below(items.len())]
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }
}

/// Three articles A, B, C whose `category` links point at X, Y and X.
pub fn article_scenario() -> DemoContent {
    let article = Schema {
        id: SchemaId::from("article"),
        name: "Article".to_owned(),
        display_field: Some(FieldId::from("title")),
        fields: vec![
            Field::new("title", "Title", FieldKind::Symbol),
            Field::new("views", "Views", FieldKind::Integer),
            Field::new("category", "Category", FieldKind::Link),
        ],
    };
    let category = Schema {
        id: SchemaId::from("category"),
        name: "Category".to_owned(),
        display_field: Some(FieldId::from("name")),
        fields: vec![Field::new("name", "Name", FieldKind::Symbol)],
    };

    let post = |id: &str, views: i64, target: &str| {
        build_record(
            id,
            "article",
            1,
            None,
            REFERENCE_NOW,
            vec![
                ("title", Value::text(id)),
                ("views", Value::Integer(views)),
                ("category", Value::Link(LinkRef::entry(target))),
            ],
        )
    };
    let target = |id: &str, name: &str| {
        build_record(
            id,
            "category",
            1,
            Some(REFERENCE_NOW),
            REFERENCE_NOW,
            vec![("name", Value::text(name))],
        )
    };

    DemoContent {
        schemas: vec![article, category],
        records: vec![
            post("A", 10, "X"),
            post("B", 20, "Y"),
            post("C", 30, "X"),
            target("X", "X title"),
            target("Y", "Y title"),
        ],
    }
}

fn build_record(
    id: &str,
    schema_id: &str,
    version: u64,
    published_at: Option<OffsetDateTime>,
    updated_at: OffsetDateTime,
    fields: Vec<(&str, Value)>,
) -> Record {
    Record {
        id: RecordId::from(id),
        schema_id: Some(SchemaId::from(schema_id)),
        version,
        published_at,
        updated_at,
        fields: fields
            .into_iter()
            .map(|(field, value)| {
                let localized: LocalizedValue =
                    BTreeMap::from([(DEFAULT_LOCALE.to_owned(), value)]);
                (FieldId::from(field), localized)
            })
            .collect(),
    }
}

fn article_schema() -> Schema {
    let mut tags = Field::new("tags", "Tags", FieldKind::Array);
    tags.items = Some(FieldKind::Symbol);
    let mut related = Field::new("related", "Related", FieldKind::Array);
    related.items = Some(FieldKind::Link);
    Schema {
        id: SchemaId::from("article"),
        name: "Article".to_owned(),
        display_field: Some(FieldId::from("title")),
        fields: vec![
            Field::new("title", "Title", FieldKind::Symbol),
            Field::new("slug", "Slug", FieldKind::Symbol),
            Field::new("summary", "Summary", FieldKind::Text),
            Field::new("views", "Views", FieldKind::Integer),
            Field::new("rating", "Rating", FieldKind::Number),
            Field::new("category", "Category", FieldKind::Link),
            Field::new("author", "Author", FieldKind::Link),
            Field::new("featured", "Featured", FieldKind::Boolean),
            Field::new("publishDate", "Publish date", FieldKind::Date),
            Field::new("venue", "Venue", FieldKind::Location),
            tags,
            related,
            Field::new("body", "Body", FieldKind::RichText),
            Field::new("seo", "SEO", FieldKind::Object),
        ],
    }
}

fn category_schema() -> Schema {
    Schema {
        id: SchemaId::from("category"),
        name: "Category".to_owned(),
        display_field: Some(FieldId::from("name")),
        fields: vec![
            Field::new("name", "Name", FieldKind::Symbol),
            Field::new("description", "Description", FieldKind::Text),
        ],
    }
}

fn author_schema() -> Schema {
    Schema {
        id: SchemaId::from("author"),
        name: "Author".to_owned(),
        display_field: Some(FieldId::from("name")),
        fields: vec![
            Field::new("name", "Name", FieldKind::Symbol),
            Field::new("bio", "Bio", FieldKind::Text),
            Field::new("followers", "Followers", FieldKind::Integer),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::{ContentFaker, article_scenario};
    use bulkgrid_app::{FieldId, PublishStatus, Value};
    use std::collections::BTreeSet;

    #[test]
    fn same_seed_same_content() {
        let left = ContentFaker::new(42).demo_content(10);
        let right = ContentFaker::new(42).demo_content(10);
        assert_eq!(left, right);
    }

    #[test]
    fn variety_across_seeds() {
        let titles = (1_u64..=8)
            .filter_map(|seed| {
                let content = ContentFaker::new(seed).demo_content(1);
                content
                    .records_of("article")
                    .next()
                    .and_then(|record| record.text("title", "en-US"))
                    .map(str::to_owned)
            })
            .collect::<BTreeSet<_>>();
        assert!(titles.len() > 1);
    }

    #[test]
    fn article_links_point_at_existing_categories() {
        let content = ContentFaker::new(7).demo_content(25);
        let ids = content
            .records
            .iter()
            .map(|record| record.id.clone())
            .collect::<BTreeSet<_>>();
        for article in content.records_of("article") {
            let target = article
                .value(&FieldId::from("category"), "en-US")
                .and_then(Value::link_target_id)
                .expect("every article has a category");
            assert!(ids.contains(target), "{target}");
        }
        assert_eq!(content.records_of("article").count(), 25);
    }

    #[test]
    fn demo_content_covers_every_status() {
        let content = ContentFaker::new(3).demo_content(40);
        let statuses = content
            .records
            .iter()
            .map(|record| record.status())
            .collect::<Vec<_>>();
        assert!(statuses.contains(&PublishStatus::Draft));
        assert!(statuses.contains(&PublishStatus::Published));
        assert!(statuses.contains(&PublishStatus::Changed));
    }

    #[test]
    fn scenario_has_three_articles_and_two_targets() {
        let content = article_scenario();
        assert_eq!(content.records_of("article").count(), 3);
        assert_eq!(content.records_of("category").count(), 2);
        assert!(content.schema("article").is_some());
    }
}
