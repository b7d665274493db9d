//! End-to-end compute scenarios against the demo edition.
//!
//! The golden values pin the hash, generator and sampler together: any change
//! to one of them shows up here as a different pick or score.

use std::collections::HashSet;

use augury_core::compute::compute;
use augury_core::config::EngineConfig;
use augury_core::demo::demo_definition;
use augury_core::gate::{is_prefix_of, slice};
use augury_core::identity::{Identity, IdentityInput};
use augury_core::seed::Seed;

fn ana() -> Identity {
    Identity::from_input(
        &IdentityInput {
            subject: "Demo".into(),
            birth_date: "1990-05-02".into(),
            name: Some(" Ana ".into()),
            locale: Some("SK".into()),
        },
        "en",
    )
    .unwrap()
}

#[test]
fn root_seed_is_pinned() {
    let id = ana();
    assert_eq!(id.seed_parts(), ["demo", "1990-05-02", "ana", "sk"]);
    assert_eq!(id.root_seed(), Seed(2_634_034_400));
}

#[test]
fn five_by_thirty_pick_three_golden() {
    let def = demo_definition("golden-edition", 30);
    let result = compute(&ana(), &def, &EngineConfig::default()).unwrap();

    let expected: [(&str, [(&str, u8); 3]); 5] = [
        ("love", [("love-24", 46), ("love-3", 6), ("love-27", 98)]),
        ("career", [("career-21", 20), ("career-9", 88), ("career-23", 44)]),
        ("health", [("health-2", 73), ("health-20", 51), ("health-21", 86)]),
        ("money", [("money-4", 94), ("money-18", 68), ("money-24", 7)]),
        ("spirit", [("spirit-11", 31), ("spirit-14", 71), ("spirit-28", 95)]),
    ];

    assert_eq!(result.slug, "golden-edition");
    assert_eq!(result.categories.len(), 5);
    for (category, (key, items)) in result.categories.iter().zip(expected) {
        assert_eq!(category.key, key);
        let got: Vec<(&str, u8)> = category
            .items
            .iter()
            .map(|i| (i.id.as_str(), i.value))
            .collect();
        assert_eq!(got, items.to_vec(), "category {key}");
    }
}

#[test]
fn item_text_follows_score_band() {
    let def = demo_definition("golden-edition", 30);
    let result = compute(&ana(), &def, &EngineConfig::default()).unwrap();
    for item in result.categories.iter().flat_map(|c| &c.items) {
        let expected_prefix = match item.value {
            0..=33 => "Low",
            34..=66 => "Balanced",
            _ => "Strong",
        };
        assert!(
            item.text.starts_with(expected_prefix),
            "{} scored {} but reads '{}'",
            item.id,
            item.value,
            item.text
        );
    }
    // Mid-band text carries {name}, rendered with the display name.
    let mid = result
        .categories
        .iter()
        .flat_map(|c| &c.items)
        .find(|i| (34..=66).contains(&i.value))
        .unwrap();
    assert!(mid.text.ends_with(", Ana."), "{}", mid.text);
}

#[test]
fn no_duplicates_across_many_identities() {
    let def = demo_definition("golden-edition", 30);
    for day in 1..=28 {
        let id = Identity::from_input(
            &IdentityInput {
                subject: "demo".into(),
                birth_date: format!("1985-02-{day:02}"),
                ..Default::default()
            },
            "en",
        )
        .unwrap();
        let result = compute(&id, &def, &EngineConfig::default()).unwrap();
        for category in &result.categories {
            let ids: HashSet<&str> = category.items.iter().map(|i| i.id.as_str()).collect();
            assert_eq!(ids.len(), 3);
        }
    }
}

#[test]
fn default_teaser_is_two_categories_one_item() {
    let def = demo_definition("golden-edition", 30);
    let full = compute(&ana(), &def, &EngineConfig::default()).unwrap();
    let teaser = slice(&full, false, &EngineConfig::default().gate);
    assert_eq!(teaser.categories.len(), 2);
    assert!(teaser.categories.iter().all(|c| c.items.len() == 1));
    assert!(teaser.categories.iter().all(|c| c.recommendation.is_none()));
    assert!(teaser.insights.is_empty());
    assert!(is_prefix_of(&teaser, &full));
    assert_eq!(teaser.categories[0].items[0].id, "love-24");
}

#[test]
fn recommendation_and_insights_are_paid_content() {
    let def = demo_definition("golden-edition", 30);
    let full = compute(&ana(), &def, &EngineConfig::default()).unwrap();
    assert_eq!(
        full.categories[0].recommendation.as_deref(),
        Some("Keep a short love journal this week, Ana.")
    );
    assert_eq!(full.insights.len(), 2);
    assert!(full.insights[1].text.ends_with("readers shared your birth week this month."));
}
