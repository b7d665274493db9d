//! Canonical content definition — the published, immutable shape the engine consumes.
//!
//! Authored input goes through [`crate::normalize`] first; these types are what
//! comes out. They deserialize strictly (unknown fields rejected) because
//! published files must already be canonical.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of categories every edition carries.
pub const CATEGORY_COUNT: usize = 5;

/// Number of variant rules every task carries.
pub const VARIANT_COUNT: usize = 3;

/// One published edition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentDefinition {
    pub slug: String,
    pub title: String,
    pub engine: EngineRef,
    pub categories: Vec<Category>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub insights: Vec<InsightTemplate>,
}

impl ContentDefinition {
    /// Content hash of the canonical JSON encoding.
    pub fn content_hash(&self) -> DefinitionHash {
        // Field order is fixed by the struct, so the encoding is deterministic.
        let json = serde_json::to_string(self).expect("ContentDefinition must serialize");
        DefinitionHash(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    pub fn category(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key == key)
    }
}

/// Product the edition belongs to and its authoring locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineRef {
    pub subject: String,
    pub locale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Category {
    pub key: String,
    pub title: String,
    pub pool: Vec<Task>,
    /// Paid-only closing advice for the category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub metric_key: String,
    pub variants: Vec<VariantRule>,
}

/// Score predicate. Serialized externally tagged: `{"lte": 33}`,
/// `{"between": [34, 66]}`, `{"gte": 67}`, `{"any": true}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Predicate {
    Lte(f64),
    Between([f64; 2]),
    Gte(f64),
    Any(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariantRule {
    pub when: Predicate,
    pub text: String,
}

/// A synthetic "people like you" statistic, filled from `{percent}` / `{count}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InsightTemplate {
    pub key: String,
    pub template: String,
    pub min: i64,
    pub max: i64,
}

/// BLAKE3 hex digest of a definition's canonical JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefinitionHash(pub String);

impl fmt::Display for DefinitionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
