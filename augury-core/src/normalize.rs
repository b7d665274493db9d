//! Normalizer — loosely shaped authored input to the canonical definition.
//!
//! Hand-written and LLM-written editions arrive in several shapes. Each shape
//! is a variant of an untagged union; normalization maps all of them onto
//! [`ContentDefinition`] without ever failing. Structural problems that cannot
//! be coerced (blank titles, short pools, gaps) are left for the validator.
//!
//! Normalizing an already canonical definition returns it unchanged. Canonical
//! means the validator accepts it, which includes having no padded text.

use serde::Deserialize;

use crate::definition::{
    Category, ContentDefinition, EngineRef, InsightTemplate, Predicate, Task, VariantRule,
    VARIANT_COUNT,
};
use crate::variant::canonical_rules;

/// A scalar an author may have used where text was expected.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    /// Trimmed text form; `None` when blank.
    fn text(&self) -> Option<String> {
        let raw = match self {
            Scalar::Text(s) => s.trim().to_string(),
            Scalar::Integer(n) => n.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Bool(b) => b.to_string(),
        };
        (!raw.is_empty()).then_some(raw)
    }
}

fn text_of(value: &Option<Scalar>) -> Option<String> {
    value.as_ref().and_then(Scalar::text)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDefinition {
    #[serde(default)]
    pub slug: Option<Scalar>,
    #[serde(default)]
    pub title: Option<Scalar>,
    #[serde(default)]
    pub engine: Option<RawEngine>,
    #[serde(default)]
    pub categories: Vec<RawCategory>,
    #[serde(default)]
    pub insights: Vec<InsightTemplate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEngine {
    #[serde(default)]
    pub subject: Option<Scalar>,
    #[serde(default)]
    pub locale: Option<Scalar>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCategory {
    #[serde(default)]
    pub key: Option<Scalar>,
    #[serde(default)]
    pub title: Option<Scalar>,
    #[serde(default, alias = "tasks")]
    pub pool: Vec<RawTask>,
    #[serde(default)]
    pub recommendation: Option<Scalar>,
}

/// A task as authored.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTask {
    /// Just a line of text.
    Text(String),
    Object(RawTaskObject),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTaskObject {
    #[serde(default)]
    pub id: Option<Scalar>,
    #[serde(default)]
    pub title: Option<Scalar>,
    #[serde(default, rename = "metricKey", alias = "metric_key")]
    pub metric_key: Option<Scalar>,
    #[serde(default)]
    pub variants: Option<RawVariants>,
    /// Shorthand: one text for every band.
    #[serde(default)]
    pub text: Option<Scalar>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawVariants {
    Rules(Vec<RawRule>),
    Bands(RawBands),
    Single(Scalar),
}

/// One scalar per band.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBands {
    #[serde(default, alias = "lte")]
    pub low: Option<Scalar>,
    #[serde(default, alias = "between", alias = "medium")]
    pub mid: Option<Scalar>,
    #[serde(default, alias = "gte")]
    pub high: Option<Scalar>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawRule {
    /// `null` placeholder in a positional list.
    Empty,
    Text(Scalar),
    Rule(RawRuleObject),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRuleObject {
    #[serde(default)]
    pub when: Option<Predicate>,
    #[serde(default)]
    pub text: Option<Scalar>,
}

impl RawRule {
    fn when(&self) -> Option<Predicate> {
        match self {
            RawRule::Rule(rule) => rule.when,
            RawRule::Text(_) | RawRule::Empty => None,
        }
    }

    fn text(&self) -> Option<String> {
        match self {
            RawRule::Rule(rule) => text_of(&rule.text),
            RawRule::Text(scalar) => scalar.text(),
            RawRule::Empty => None,
        }
    }
}

/// Fill every `None` with the nearest known text, preferring the lower side on
/// ties. Slots stay empty only when nothing is known.
pub fn pad_nearest(texts: &[Option<String>]) -> Vec<String> {
    (0..texts.len())
        .map(|i| {
            if let Some(text) = &texts[i] {
                return text.clone();
            }
            (1..texts.len())
                .find_map(|d| {
                    let below = i.checked_sub(d).and_then(|j| texts[j].clone());
                    below.or_else(|| texts.get(i + d).cloned().flatten())
                })
                .unwrap_or_default()
        })
        .collect()
}

fn three(texts: &[Option<String>]) -> [String; 3] {
    let padded = pad_nearest(texts);
    [padded[0].clone(), padded[1].clone(), padded[2].clone()]
}

fn normalize_rules(rules: &[RawRule]) -> Vec<VariantRule> {
    if rules.iter().all(|rule| rule.when().is_some()) && !rules.is_empty() {
        // Authored predicates are kept as-is; only blank texts get padded.
        let texts: Vec<Option<String>> = rules.iter().map(RawRule::text).collect();
        return rules
            .iter()
            .zip(pad_nearest(&texts))
            .filter_map(|(rule, text)| rule.when().map(|when| VariantRule { when, text }))
            .collect();
    }
    // Positional: lay texts onto the canonical bands, extras beyond three dropped.
    let mut texts: Vec<Option<String>> =
        rules.iter().take(VARIANT_COUNT).map(RawRule::text).collect();
    texts.resize(VARIANT_COUNT, None);
    canonical_rules(three(&texts))
}

fn normalize_variants(task: &RawTaskObject) -> Vec<VariantRule> {
    let shorthand = text_of(&task.text);
    match &task.variants {
        Some(RawVariants::Rules(rules)) => normalize_rules(rules),
        Some(RawVariants::Bands(bands)) => canonical_rules(three(&[
            text_of(&bands.low),
            text_of(&bands.mid),
            text_of(&bands.high),
        ])),
        Some(RawVariants::Single(scalar)) => {
            let text = scalar.text().or(shorthand);
            canonical_rules(three(&[text, None, None]))
        }
        None => canonical_rules(three(&[shorthand, None, None])),
    }
}

/// Deterministic fallback id for the task at `(category, task)`.
pub fn synthetic_task_id(category: usize, task: usize) -> String {
    format!("c{}-t{}", category + 1, task + 1)
}

/// Deterministic fallback metric key for the task at `(category, task)`.
pub fn synthetic_metric_key(category: usize, task: usize) -> String {
    format!("c{}_m{}", category + 1, task + 1)
}

pub fn normalize_task(raw: &RawTask, category: usize, task: usize) -> Task {
    match raw {
        RawTask::Text(text) => {
            let text = text.trim().to_string();
            Task {
                id: synthetic_task_id(category, task),
                title: text.clone(),
                metric_key: synthetic_metric_key(category, task),
                variants: canonical_rules([text.clone(), text.clone(), text]),
            }
        }
        RawTask::Object(obj) => Task {
            id: text_of(&obj.id).unwrap_or_else(|| synthetic_task_id(category, task)),
            title: text_of(&obj.title).unwrap_or_default(),
            metric_key: text_of(&obj.metric_key)
                .unwrap_or_else(|| synthetic_metric_key(category, task)),
            variants: normalize_variants(obj),
        },
    }
}

pub fn normalize_category(raw: &RawCategory, index: usize) -> Category {
    Category {
        key: text_of(&raw.key).unwrap_or_default(),
        title: text_of(&raw.title).unwrap_or_default(),
        pool: raw
            .pool
            .iter()
            .enumerate()
            .map(|(t, task)| normalize_task(task, index, t))
            .collect(),
        recommendation: text_of(&raw.recommendation),
    }
}

/// Coerce an authored definition into the canonical shape.
///
/// Slugs are lowercased; engine locale is lowercased; every text is trimmed.
pub fn normalize(raw: &RawDefinition) -> ContentDefinition {
    let engine = raw.engine.clone().unwrap_or_default();
    ContentDefinition {
        slug: text_of(&raw.slug).unwrap_or_default().to_lowercase(),
        title: text_of(&raw.title).unwrap_or_default(),
        engine: EngineRef {
            subject: text_of(&engine.subject).unwrap_or_default(),
            locale: text_of(&engine.locale).unwrap_or_default().to_lowercase(),
        },
        categories: raw
            .categories
            .iter()
            .enumerate()
            .map(|(i, category)| normalize_category(category, i))
            .collect(),
        insights: raw.insights.clone(),
    }
}

/// Parse authored JSON and normalize it.
pub fn normalize_json(json: &str) -> Result<ContentDefinition, serde_json::Error> {
    let raw: RawDefinition = serde_json::from_str(json)?;
    Ok(normalize(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::demo_definition;
    use serde_json::json;

    fn task_from(value: serde_json::Value) -> Task {
        let raw: RawTask = serde_json::from_value(value).unwrap();
        normalize_task(&raw, 1, 4)
    }

    fn texts(task: &Task) -> Vec<&str> {
        task.variants.iter().map(|v| v.text.as_str()).collect()
    }

    #[test]
    fn bare_string_becomes_full_task() {
        let task = task_from(json!("  Call an old friend "));
        assert_eq!(task.id, "c2-t5");
        assert_eq!(task.metric_key, "c2_m5");
        assert_eq!(task.title, "Call an old friend");
        assert_eq!(texts(&task), vec!["Call an old friend"; 3]);
        assert_eq!(task.variants[0].when, Predicate::Lte(33.0));
        assert_eq!(task.variants[1].when, Predicate::Between([34.0, 66.0]));
        assert_eq!(task.variants[2].when, Predicate::Gte(67.0));
    }

    #[test]
    fn band_object_pads_from_nearest() {
        let task = task_from(json!({
            "id": "walk",
            "title": "Walk",
            "metricKey": "steps",
            "variants": {"low": "rest", "high": "run"}
        }));
        assert_eq!(texts(&task), vec!["rest", "rest", "run"]);
    }

    #[test]
    fn band_aliases_and_numbers_are_accepted() {
        let task = task_from(json!({
            "title": "Count",
            "variants": {"lte": 1, "between": 2.5, "gte": true}
        }));
        assert_eq!(texts(&task), vec!["1", "2.5", "true"]);
        assert_eq!(task.id, "c2-t5");
    }

    #[test]
    fn authored_predicates_are_kept() {
        let task = task_from(json!({
            "id": "t", "title": "T", "metricKey": "m",
            "variants": [
                {"when": {"lte": 20}, "text": "a"},
                {"when": {"between": [21, 80]}},
                {"when": {"gte": 81}, "text": "c"}
            ]
        }));
        assert_eq!(task.variants[0].when, Predicate::Lte(20.0));
        assert_eq!(task.variants[1].when, Predicate::Between([21.0, 80.0]));
        assert_eq!(texts(&task), vec!["a", "a", "c"]);
    }

    #[test]
    fn positional_rules_map_onto_bands() {
        let task = task_from(json!({"title": "T", "variants": ["one", {"text": "two"}]}));
        assert_eq!(texts(&task), vec!["one", "two", "two"]);
        assert_eq!(task.variants[2].when, Predicate::Gte(67.0));
    }

    #[test]
    fn null_slots_are_padded_and_extras_dropped() {
        let task = task_from(json!({"title": "T", "variants": [null, "two", "three", "four"]}));
        assert_eq!(texts(&task), vec!["two", "two", "three"]);
    }

    #[test]
    fn shorthand_text_fills_all_bands() {
        let task = task_from(json!({"title": "T", "text": "same"}));
        assert_eq!(texts(&task), vec!["same"; 3]);
    }

    #[test]
    fn no_text_leaves_blank_variants_for_validator() {
        let task = task_from(json!({"title": "T"}));
        assert_eq!(texts(&task), vec![""; 3]);
    }

    #[test]
    fn metric_key_snake_case_alias() {
        let task = task_from(json!({"title": "T", "metric_key": "mood", "text": "x"}));
        assert_eq!(task.metric_key, "mood");
    }

    #[test]
    fn pad_nearest_prefers_lower_on_ties() {
        let padded = pad_nearest(&[Some("a".into()), None, Some("c".into())]);
        assert_eq!(padded, vec!["a", "a", "c"]);
        let padded = pad_nearest(&[None, None, Some("c".into())]);
        assert_eq!(padded, vec!["c", "c", "c"]);
        assert_eq!(pad_nearest(&[None, None]), vec!["", ""]);
    }

    #[test]
    fn tasks_alias_and_slug_lowercase() {
        let def = normalize_json(
            r#"{"slug": " Love-Test ", "title": "Love", "engine": {"subject": "love", "locale": "SK"},
                "categories": [{"key": "heart", "title": "Heart", "tasks": ["a", "b"]}]}"#,
        )
        .unwrap();
        assert_eq!(def.slug, "love-test");
        assert_eq!(def.engine.locale, "sk");
        assert_eq!(def.categories[0].pool.len(), 2);
        assert_eq!(def.categories[0].pool[1].id, "c1-t2");
    }

    #[test]
    fn canonical_definition_is_a_fixed_point() {
        let canonical = demo_definition("demo-edition", 8);
        let json = serde_json::to_string(&canonical).unwrap();
        let renormalized = normalize_json(&json).unwrap();
        assert_eq!(renormalized, canonical);
    }

    #[test]
    fn accepted_definitions_survive_normalization() {
        use crate::config::EngineConfig;
        use crate::validate::{validate_all, ErrorCode};

        let config = EngineConfig::default();
        let mut padded = demo_definition("demo-edition", 8);
        padded.categories[0].pool[0].variants[0].text = " Low padded ".into();
        let errors = validate_all(&padded, &config);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::NotCanonical);

        let trimmed = normalize_json(&serde_json::to_string(&padded).unwrap()).unwrap();
        assert_eq!(trimmed.categories[0].pool[0].variants[0].text, "Low padded");
        assert!(validate_all(&trimmed, &config).is_empty());
        let again = normalize_json(&serde_json::to_string(&trimmed).unwrap()).unwrap();
        assert_eq!(again, trimmed);
    }

    #[test]
    fn normalize_is_idempotent_on_messy_input() {
        let once = normalize_json(
            r#"{"slug": "MESSY", "categories": [{"key": "k", "pool": [
                "plain", {"variants": {"mid": "m"}}, {"id": 7, "title": "t", "variants": ["x"]}
            ]}]}"#,
        )
        .unwrap();
        let twice = normalize_json(&serde_json::to_string(&once).unwrap()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.categories[0].pool[2].id, "7");
    }
}
