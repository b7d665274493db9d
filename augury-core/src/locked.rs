//! Locked schema validation — zero tolerance for the constrained edition shape.
//!
//! Where the normalizer coerces, this validator refuses. It walks the raw JSON
//! tree against a fixed key allowlist per object kind and a closed placeholder
//! vocabulary, collecting every offending path. Only a clean tree is
//! deserialized (strictly) and then checked structurally in strict mode.
//! Everything wrong ends up in one aggregated [`LockedSchemaError`].

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use crate::config::EngineConfig;
use crate::definition::ContentDefinition;
use crate::template::{is_known_placeholder, placeholders};
use crate::validate::{validate_with_registry, ErrorCode, SlugRegistry, ValidationError};

const DEFINITION_KEYS: &[&str] = &["slug", "title", "engine", "categories", "insights"];
const DEFINITION_REQUIRED: &[&str] = &["slug", "title", "engine", "categories"];
const ENGINE_KEYS: &[&str] = &["subject", "locale"];
const CATEGORY_KEYS: &[&str] = &["key", "title", "pool", "recommendation"];
const CATEGORY_REQUIRED: &[&str] = &["key", "title", "pool"];
const TASK_KEYS: &[&str] = &["id", "title", "metricKey", "variants"];
const RULE_KEYS: &[&str] = &["when", "text"];
const WHEN_KEYS: &[&str] = &["lte", "between", "gte", "any"];
const INSIGHT_KEYS: &[&str] = &["key", "template", "min", "max"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    UnknownKey { key: String },
    MissingKey { key: String },
    UnknownPlaceholder { token: String },
    WrongType { expected: &'static str },
    Malformed { message: String },
    Structural { code: ErrorCode, details: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub path: String,
    #[serde(flatten)]
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::UnknownKey { key } => write!(f, "{}: unknown key '{key}'", self.path),
            ViolationKind::MissingKey { key } => write!(f, "{}: missing key '{key}'", self.path),
            ViolationKind::UnknownPlaceholder { token } => {
                write!(f, "{}: unknown placeholder '{{{token}}}'", self.path)
            }
            ViolationKind::WrongType { expected } => {
                write!(f, "{}: expected {expected}", self.path)
            }
            ViolationKind::Malformed { message } => write!(f, "{}: {message}", self.path),
            ViolationKind::Structural { code, details } => {
                write!(f, "{}: {code}: {details}", self.path)
            }
        }
    }
}

/// Every violation found in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("locked schema rejected {} path(s): {}", .violations.len(), summary(.violations))]
pub struct LockedSchemaError {
    pub violations: Vec<Violation>,
}

fn summary(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl LockedSchemaError {
    pub fn paths(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.path.as_str()).collect()
    }
}

#[derive(Default)]
struct Walker {
    violations: Vec<Violation>,
}

impl Walker {
    fn push(&mut self, path: &str, kind: ViolationKind) {
        self.violations.push(Violation {
            path: path.to_string(),
            kind,
        });
    }

    fn object<'v>(
        &mut self,
        value: &'v Value,
        path: &str,
        allowed: &[&str],
        required: &[&str],
    ) -> Option<&'v Map<String, Value>> {
        let Some(map) = value.as_object() else {
            self.push(path, ViolationKind::WrongType { expected: "object" });
            return None;
        };
        for key in map.keys() {
            if !allowed.contains(&key.as_str()) {
                self.push(
                    &format!("{path}.{key}"),
                    ViolationKind::UnknownKey { key: key.clone() },
                );
            }
        }
        for key in required {
            if !map.contains_key(*key) {
                self.push(
                    path,
                    ViolationKind::MissingKey {
                        key: (*key).to_string(),
                    },
                );
            }
        }
        Some(map)
    }

    fn array<'v>(&mut self, value: &'v Value, path: &str) -> Option<&'v Vec<Value>> {
        let array = value.as_array();
        if array.is_none() {
            self.push(path, ViolationKind::WrongType { expected: "array" });
        }
        array
    }

    fn string(&mut self, value: &Value, path: &str) {
        let Some(text) = value.as_str() else {
            self.push(path, ViolationKind::WrongType { expected: "string" });
            return;
        };
        for (_, token) in placeholders(text) {
            if !is_known_placeholder(token) {
                self.push(
                    path,
                    ViolationKind::UnknownPlaceholder {
                        token: token.to_string(),
                    },
                );
            }
        }
    }

    fn integer(&mut self, value: &Value, path: &str) {
        if value.as_i64().is_none() {
            self.push(path, ViolationKind::WrongType { expected: "integer" });
        }
    }

    fn number(&mut self, value: &Value, path: &str) {
        if !value.is_number() {
            self.push(path, ViolationKind::WrongType { expected: "number" });
        }
    }

    fn strings_in(&mut self, map: &Map<String, Value>, path: &str, keys: &[&str]) {
        for key in keys {
            if let Some(value) = map.get(*key) {
                self.string(value, &format!("{path}.{key}"));
            }
        }
    }

    fn definition(&mut self, root: &Value) {
        let Some(map) = self.object(root, "$", DEFINITION_KEYS, DEFINITION_REQUIRED) else {
            return;
        };
        self.strings_in(map, "$", &["slug", "title"]);
        if let Some(engine) = map.get("engine") {
            if let Some(engine_map) = self.object(engine, "$.engine", ENGINE_KEYS, ENGINE_KEYS) {
                self.strings_in(engine_map, "$.engine", ENGINE_KEYS);
            }
        }
        if let Some(categories) = map.get("categories") {
            if let Some(list) = self.array(categories, "$.categories") {
                for (c, category) in list.iter().enumerate() {
                    self.category(category, &format!("$.categories[{c}]"));
                }
            }
        }
        if let Some(insights) = map.get("insights") {
            if let Some(list) = self.array(insights, "$.insights") {
                for (i, insight) in list.iter().enumerate() {
                    self.insight(insight, &format!("$.insights[{i}]"));
                }
            }
        }
    }

    fn category(&mut self, value: &Value, path: &str) {
        let Some(map) = self.object(value, path, CATEGORY_KEYS, CATEGORY_REQUIRED) else {
            return;
        };
        self.strings_in(map, path, &["key", "title", "recommendation"]);
        if let Some(pool) = map.get("pool") {
            let pool_path = format!("{path}.pool");
            if let Some(list) = self.array(pool, &pool_path) {
                for (t, task) in list.iter().enumerate() {
                    self.task(task, &format!("{pool_path}[{t}]"));
                }
            }
        }
    }

    fn task(&mut self, value: &Value, path: &str) {
        let Some(map) = self.object(value, path, TASK_KEYS, TASK_KEYS) else {
            return;
        };
        self.strings_in(map, path, &["id", "title", "metricKey"]);
        if let Some(variants) = map.get("variants") {
            let variants_path = format!("{path}.variants");
            if let Some(list) = self.array(variants, &variants_path) {
                for (v, rule) in list.iter().enumerate() {
                    self.rule(rule, &format!("{variants_path}[{v}]"));
                }
            }
        }
    }

    fn rule(&mut self, value: &Value, path: &str) {
        let Some(map) = self.object(value, path, RULE_KEYS, RULE_KEYS) else {
            return;
        };
        self.strings_in(map, path, &["text"]);
        if let Some(when) = map.get("when") {
            self.predicate(when, &format!("{path}.when"));
        }
    }

    fn predicate(&mut self, value: &Value, path: &str) {
        let Some(map) = self.object(value, path, WHEN_KEYS, &[]) else {
            return;
        };
        if map.len() != 1 {
            self.push(
                path,
                ViolationKind::WrongType {
                    expected: "exactly one of lte, between, gte, any",
                },
            );
        }
        for (key, bound) in map {
            let bound_path = format!("{path}.{key}");
            match key.as_str() {
                "lte" | "gte" => self.number(bound, &bound_path),
                "between" => match bound.as_array() {
                    Some(pair) if pair.len() == 2 && pair.iter().all(Value::is_number) => {}
                    _ => self.push(
                        &bound_path,
                        ViolationKind::WrongType {
                            expected: "array of two numbers",
                        },
                    ),
                },
                "any" => {
                    if !bound.is_boolean() {
                        self.push(&bound_path, ViolationKind::WrongType { expected: "boolean" });
                    }
                }
                // Unknown keys were already reported by `object`.
                _ => {}
            }
        }
    }

    fn insight(&mut self, value: &Value, path: &str) {
        let Some(map) = self.object(value, path, INSIGHT_KEYS, INSIGHT_KEYS) else {
            return;
        };
        self.strings_in(map, path, &["key", "template"]);
        for key in ["min", "max"] {
            if let Some(bound) = map.get(key) {
                self.integer(bound, &format!("{path}.{key}"));
            }
        }
    }
}

/// JSON path a structural error points at.
fn structural_path(error: &ValidationError) -> String {
    match (error.category, error.task, error.code) {
        (Some(c), Some(t), _) => format!("$.categories[{c}].pool[{t}]"),
        (Some(c), None, _) => format!("$.categories[{c}]"),
        (None, _, ErrorCode::MissingSlug | ErrorCode::BadSlug | ErrorCode::DuplicateSlug) => {
            "$.slug".into()
        }
        (None, _, ErrorCode::MissingTitle) => "$.title".into(),
        (None, _, ErrorCode::BadCategoryCount) => "$.categories".into(),
        (None, _, ErrorCode::BadInsight) => "$.insights".into(),
        _ => "$".into(),
    }
}

fn locked(
    value: &Value,
    config: &EngineConfig,
    registry: Option<&dyn SlugRegistry>,
) -> Result<ContentDefinition, LockedSchemaError> {
    let mut walker = Walker::default();
    walker.definition(value);
    if !walker.violations.is_empty() {
        return Err(LockedSchemaError {
            violations: walker.violations,
        });
    }

    let definition: ContentDefinition =
        serde_json::from_value(value.clone()).map_err(|e| LockedSchemaError {
            violations: vec![Violation {
                path: "$".into(),
                kind: ViolationKind::Malformed {
                    message: e.to_string(),
                },
            }],
        })?;

    let none = BTreeSet::new();
    let registry = registry.unwrap_or(&none);
    let errors = validate_with_registry(&definition, &config.strict(), registry);
    if errors.is_empty() {
        return Ok(definition);
    }
    Err(LockedSchemaError {
        violations: errors
            .into_iter()
            .map(|error| Violation {
                path: structural_path(&error),
                kind: ViolationKind::Structural {
                    code: error.code,
                    details: error.details,
                },
            })
            .collect(),
    })
}

/// Validate a raw edition against the locked schema.
pub fn validate_locked(
    value: &Value,
    config: &EngineConfig,
) -> Result<ContentDefinition, LockedSchemaError> {
    locked(value, config, None)
}

/// [`validate_locked`] plus the duplicate-slug check.
pub fn validate_locked_with_registry(
    value: &Value,
    config: &EngineConfig,
    registry: &dyn SlugRegistry,
) -> Result<ContentDefinition, LockedSchemaError> {
    locked(value, config, Some(registry))
}
