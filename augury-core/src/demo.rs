//! Synthetic demo edition.
//!
//! A canonical, valid definition with a configurable pool size. Used by the
//! CLI `demo` command, benches and tests that need a realistic edition without
//! a fixture file on disk.

use crate::definition::{Category, ContentDefinition, EngineRef, InsightTemplate, Task};
use crate::variant::canonical_rules;

const CATEGORIES: [(&str, &str); 5] = [
    ("love", "Love & Relationships"),
    ("career", "Career"),
    ("health", "Health & Energy"),
    ("money", "Money"),
    ("spirit", "Inner Life"),
];

fn demo_task(category: &str, index: usize) -> Task {
    let n = index + 1;
    Task {
        id: format!("{category}-{n}"),
        title: format!("{category} focus #{n}"),
        metric_key: format!("{category}_metric_{n}"),
        variants: canonical_rules([
            format!("Low {category} energy around focus #{n}. Take it slowly."),
            format!("Balanced {category} energy around focus #{n}, {{name}}."),
            format!("Strong {category} energy around focus #{n}. Act on it."),
        ]),
    }
}

/// Five categories, `pool_size` tasks each, two insight lines.
pub fn demo_definition(slug: &str, pool_size: usize) -> ContentDefinition {
    ContentDefinition {
        slug: slug.to_string(),
        title: "Demo reading".into(),
        engine: EngineRef {
            subject: "demo".into(),
            locale: "en".into(),
        },
        categories: CATEGORIES
            .iter()
            .map(|(key, title)| Category {
                key: (*key).to_string(),
                title: (*title).to_string(),
                pool: (0..pool_size).map(|i| demo_task(key, i)).collect(),
                recommendation: Some(format!("Keep a short {key} journal this week, {{name}}.")),
            })
            .collect(),
        insights: vec![
            InsightTemplate {
                key: "peers".into(),
                template: "{percent}% of people with your profile describe the same pattern.".into(),
                min: 38,
                max: 91,
            },
            InsightTemplate {
                key: "cohort".into(),
                template: "{count} readers shared your birth week this month.".into(),
                min: 120,
                max: 4800,
            },
        ],
    }
}
