//! Compute orchestrator — identity + definition to the full result tree.
//!
//! Single pass, no shared state. Per call:
//! 1. root seed from the normalized identity fields
//! 2. per category: generator from `root.derive([key, index])`, pick N tasks
//! 3. per picked task: `root.derive([id, metricKey, categoryKey]) % 101` as
//!    the score, resolved to text and rendered
//! 4. per insight: generator from `root.derive(["insight", key, index])`,
//!    center-weighted number rendered into the template

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::definition::{Category, ContentDefinition, InsightTemplate, Task};
use crate::identity::Identity;
use crate::rng::Generator;
use crate::sampler::{pick_without_replacement, plausible_in_range, SampleError};
use crate::seed::Seed;
use crate::template::{render, RenderContext};
use crate::variant::{resolve, MAX_SCORE};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComputeError {
    #[error("category '{category}': {source}")]
    Sample {
        category: String,
        #[source]
        source: SampleError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemResult {
    pub id: String,
    pub title: String,
    pub value: u8,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub key: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    pub items: Vec<ItemResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightLine {
    pub key: String,
    pub text: String,
}

/// Fully derived report. Never stored; recomputable from its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeResult {
    pub slug: String,
    pub seed: Seed,
    pub categories: Vec<CategoryResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub insights: Vec<InsightLine>,
}

impl ComputeResult {
    pub fn item_count(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }
}

/// Score for `task` within `category_key`, in `0..=100`.
pub fn task_value(root: Seed, task: &Task, category_key: &str) -> u8 {
    let seed = root.derive(&[task.id.as_str(), task.metric_key.as_str(), category_key]);
    (seed.value() % (u32::from(MAX_SCORE) + 1)) as u8
}

/// Locale for identities that carry none: the edition's authoring locale,
/// else the configured default.
pub fn fallback_locale<'a>(definition: &'a ContentDefinition, config: &'a EngineConfig) -> &'a str {
    if definition.engine.locale.trim().is_empty() {
        &config.default_locale
    } else {
        &definition.engine.locale
    }
}

fn compute_category(
    root: Seed,
    index: usize,
    category: &Category,
    identity: &Identity,
    config: &EngineConfig,
) -> Result<CategoryResult, ComputeError> {
    let mut rng = Generator::derived(root, &[category.key.as_str(), index.to_string().as_str()]);
    let picked =
        pick_without_replacement(&category.pool, config.pick(), &mut rng, config.sample_mode)
            .map_err(|source| ComputeError::Sample {
                category: category.key.clone(),
                source,
            })?;

    let items = picked
        .iter()
        .map(|task| {
            let value = task_value(root, task, &category.key);
            let ctx = RenderContext {
                name: Some(&identity.display_name),
                subject: Some(&identity.subject),
                value: Some(i64::from(value)),
                category: Some(&category.title),
                ..Default::default()
            };
            ItemResult {
                id: task.id.clone(),
                title: task.title.clone(),
                value,
                text: render(resolve(&task.variants, value), &ctx),
            }
        })
        .collect();

    let recommendation = category.recommendation.as_deref().map(|text| {
        let ctx = RenderContext {
            name: Some(&identity.display_name),
            subject: Some(&identity.subject),
            category: Some(&category.title),
            ..Default::default()
        };
        render(text, &ctx)
    });

    Ok(CategoryResult {
        key: category.key.clone(),
        title: category.title.clone(),
        recommendation,
        items,
    })
}

fn compute_insight(
    root: Seed,
    index: usize,
    insight: &InsightTemplate,
    identity: &Identity,
) -> InsightLine {
    let index = index.to_string();
    let mut rng = Generator::derived(root, &["insight", insight.key.as_str(), index.as_str()]);
    let number = plausible_in_range(&mut rng, insight.min, insight.max);
    let ctx = RenderContext {
        name: Some(&identity.display_name),
        subject: Some(&identity.subject),
        percent: Some(number),
        count: Some(number),
        ..Default::default()
    };
    InsightLine {
        key: insight.key.clone(),
        text: render(&insight.template, &ctx),
    }
}

/// Compute the full (paid) result for one identity.
///
/// Fails only in strict sample mode when a pool is smaller than the pick
/// count; validated editions never hit that.
pub fn compute(
    identity: &Identity,
    definition: &ContentDefinition,
    config: &EngineConfig,
) -> Result<ComputeResult, ComputeError> {
    let root = identity.root_seed();
    let categories = definition
        .categories
        .iter()
        .enumerate()
        .map(|(i, category)| compute_category(root, i, category, identity, config))
        .collect::<Result<Vec<_>, _>>()?;
    let insights = definition
        .insights
        .iter()
        .enumerate()
        .map(|(j, insight)| compute_insight(root, j, insight, identity))
        .collect();

    Ok(ComputeResult {
        slug: definition.slug.clone(),
        seed: root,
        categories,
        insights,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::demo_definition;
    use crate::identity::IdentityInput;
    use crate::sampler::SampleMode;
    use std::collections::HashSet;

    fn identity(date: &str) -> Identity {
        Identity::from_input(
            &IdentityInput {
                subject: "demo".into(),
                birth_date: date.into(),
                name: Some("Ana".into()),
                locale: Some("sk".into()),
            },
            "en",
        )
        .unwrap()
    }

    #[test]
    fn picks_configured_number_per_category() {
        let def = demo_definition("demo-edition", 30);
        let result = compute(&identity("1990-05-02"), &def, &EngineConfig::default()).unwrap();
        assert_eq!(result.categories.len(), 5);
        assert_eq!(result.item_count(), 15);
        for (category, source) in result.categories.iter().zip(&def.categories) {
            assert_eq!(category.key, source.key);
            let ids: HashSet<&str> = category.items.iter().map(|i| i.id.as_str()).collect();
            assert_eq!(ids.len(), 3);
            assert!(category
                .items
                .iter()
                .all(|item| source.pool.iter().any(|t| t.id == item.id)));
        }
    }

    #[test]
    fn repeated_calls_are_identical() {
        let def = demo_definition("demo-edition", 30);
        let id = identity("1990-05-02");
        let a = compute(&id, &def, &EngineConfig::default()).unwrap();
        let b = compute(&id, &def, &EngineConfig::default()).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn values_follow_the_task_seed() {
        let def = demo_definition("demo-edition", 30);
        let id = identity("1990-05-02");
        let result = compute(&id, &def, &EngineConfig::default()).unwrap();
        let root = id.root_seed();
        for (category, source) in result.categories.iter().zip(&def.categories) {
            for item in &category.items {
                let task = source.pool.iter().find(|t| t.id == item.id).unwrap();
                assert_eq!(item.value, task_value(root, task, &source.key));
                assert!(item.value <= 100);
                assert!(!item.text.is_empty());
            }
        }
    }

    #[test]
    fn value_is_independent_of_pool_size() {
        let small = demo_definition("demo-edition", 6);
        let large = demo_definition("demo-edition", 30);
        let root = identity("1990-05-02").root_seed();
        let task = &small.categories[0].pool[2];
        assert_eq!(task, &large.categories[0].pool[2]);
        assert_eq!(
            task_value(root, task, &small.categories[0].key),
            task_value(root, task, &large.categories[0].key)
        );
    }

    #[test]
    fn birth_date_change_moves_the_result() {
        let def = demo_definition("demo-edition", 30);
        let a = compute(&identity("1990-05-02"), &def, &EngineConfig::default()).unwrap();
        let b = compute(&identity("1990-05-03"), &def, &EngineConfig::default()).unwrap();
        assert_ne!(a.categories, b.categories);
    }

    #[test]
    fn placeholders_are_rendered() {
        let mut def = demo_definition("demo-edition", 6);
        for task in &mut def.categories[0].pool {
            for rule in &mut task.variants {
                rule.text = "{name}: {value} in {category}".into();
            }
        }
        let result = compute(&identity("1990-05-02"), &def, &EngineConfig::default()).unwrap();
        let item = &result.categories[0].items[0];
        assert_eq!(
            item.text,
            format!("Ana: {} in {}", item.value, def.categories[0].title)
        );
    }

    #[test]
    fn insights_stay_in_range() {
        let def = demo_definition("demo-edition", 6);
        let result = compute(&identity("1990-05-02"), &def, &EngineConfig::default()).unwrap();
        assert_eq!(result.insights.len(), def.insights.len());
        let first = &result.insights[0];
        let number: i64 = first
            .text
            .split(|c: char| !c.is_ascii_digit())
            .find(|s| !s.is_empty())
            .unwrap()
            .parse()
            .unwrap();
        assert!((def.insights[0].min..=def.insights[0].max).contains(&number));
    }

    #[test]
    fn short_pool_fails_in_strict_mode_and_clamps_otherwise() {
        let def = demo_definition("demo-edition", 2);
        let id = identity("1990-05-02");
        let err = compute(&id, &def, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, ComputeError::Sample { .. }));

        let clamp = EngineConfig {
            sample_mode: SampleMode::Clamp,
            ..Default::default()
        };
        let result = compute(&id, &def, &clamp).unwrap();
        assert!(result.categories.iter().all(|c| c.items.len() == 2));
    }

    #[test]
    fn fallback_locale_prefers_definition() {
        let mut def = demo_definition("demo-edition", 6);
        let config = EngineConfig {
            default_locale: "de".into(),
            ..Default::default()
        };
        assert_eq!(fallback_locale(&def, &config), "en");
        def.engine.locale.clear();
        assert_eq!(fallback_locale(&def, &config), "de");
    }

    #[test]
    fn pick_count_follows_config() {
        let def = demo_definition("demo-edition", 30);
        let config = EngineConfig {
            pick_per_category: 5,
            ..Default::default()
        };
        let result = compute(&identity("1990-05-02"), &def, &config).unwrap();
        assert_eq!(result.item_count(), 25);
    }
}
