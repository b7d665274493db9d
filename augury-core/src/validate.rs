//! Structural validation of canonical definitions.
//!
//! Runs after normalization and never mutates. Every defect is reported as its
//! own [`ValidationError`] with a stable [`ErrorCode`] plus the category and
//! task indices it was found at, so authoring tools can point at the exact
//! spot without re-parsing.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use thiserror::Error;

use crate::config::EngineConfig;
use crate::definition::{ContentDefinition, Task, CATEGORY_COUNT, VARIANT_COUNT};
use crate::variant::{band_touched, first_uncovered, BANDS, BAND_NAMES};

pub const SLUG_MIN_LEN: usize = 3;
pub const SLUG_MAX_LEN: usize = 64;

/// Stable error codes. Downstream tools match on the serialized strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    MissingSlug,
    BadSlug,
    DuplicateSlug,
    MissingTitle,
    BadCategoryCount,
    MissingCategoryKey,
    DuplicateCategoryKey,
    PoolTooSmall,
    MissingTaskId,
    DuplicateTaskId,
    MissingTaskTitle,
    MissingMetricKey,
    DuplicateMetricKey,
    BadVariantCount,
    MissingVariantText,
    VariantCoverageGap,
    BadInsight,
    NotCanonical,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingSlug => "MISSING_SLUG",
            ErrorCode::BadSlug => "BAD_SLUG",
            ErrorCode::DuplicateSlug => "DUPLICATE_SLUG",
            ErrorCode::MissingTitle => "MISSING_TITLE",
            ErrorCode::BadCategoryCount => "BAD_CATEGORY_COUNT",
            ErrorCode::MissingCategoryKey => "MISSING_CATEGORY_KEY",
            ErrorCode::DuplicateCategoryKey => "DUPLICATE_CATEGORY_KEY",
            ErrorCode::PoolTooSmall => "POOL_TOO_SMALL",
            ErrorCode::MissingTaskId => "MISSING_TASK_ID",
            ErrorCode::DuplicateTaskId => "DUPLICATE_TASK_ID",
            ErrorCode::MissingTaskTitle => "MISSING_TASK_TITLE",
            ErrorCode::MissingMetricKey => "MISSING_METRIC_KEY",
            ErrorCode::DuplicateMetricKey => "DUPLICATE_METRIC_KEY",
            ErrorCode::BadVariantCount => "BAD_VARIANT_COUNT",
            ErrorCode::MissingVariantText => "MISSING_VARIANT_TEXT",
            ErrorCode::VariantCoverageGap => "VARIANT_COVERAGE_GAP",
            ErrorCode::BadInsight => "BAD_INSIGHT",
            ErrorCode::NotCanonical => "NOT_CANONICAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structural defect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code}{}: {details}", location(.category, .task))]
pub struct ValidationError {
    pub code: ErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<usize>,
    pub details: String,
}

fn location(category: &Option<usize>, task: &Option<usize>) -> String {
    match (*category, *task) {
        (Some(c), Some(t)) => format!(" at category {c}, task {t}"),
        (Some(c), None) => format!(" at category {c}"),
        _ => String::new(),
    }
}

impl ValidationError {
    fn new(code: ErrorCode, details: impl Into<String>) -> Self {
        Self {
            code,
            category: None,
            task: None,
            details: details.into(),
        }
    }

    fn at(mut self, category: usize) -> Self {
        self.category = Some(category);
        self
    }

    fn at_task(mut self, category: usize, task: usize) -> Self {
        self.category = Some(category);
        self.task = Some(task);
        self
    }
}

/// Already-published slugs.
pub trait SlugRegistry {
    fn contains_slug(&self, slug: &str) -> bool;
}

impl SlugRegistry for HashSet<String> {
    fn contains_slug(&self, slug: &str) -> bool {
        self.contains(slug)
    }
}

impl SlugRegistry for BTreeSet<String> {
    fn contains_slug(&self, slug: &str) -> bool {
        self.contains(slug)
    }
}

impl SlugRegistry for [&str] {
    fn contains_slug(&self, slug: &str) -> bool {
        self.contains(&slug)
    }
}

/// Error contract returned to authoring tools: `{ok, error?, details?, category?, task?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<usize>,
}

impl ValidationReport {
    /// Report for the first of `errors`, or success when empty.
    pub fn from_errors(errors: &[ValidationError]) -> Self {
        match errors.first() {
            None => Self {
                ok: true,
                error: None,
                details: None,
                category: None,
                task: None,
            },
            Some(first) => Self {
                ok: false,
                error: Some(first.code),
                details: Some(first.details.clone()),
                category: first.category,
                task: first.task,
            },
        }
    }
}

/// Whether `slug` is 3–64 chars of `[a-z0-9-]` without edge or doubled hyphens.
pub fn is_valid_slug(slug: &str) -> bool {
    (SLUG_MIN_LEN..=SLUG_MAX_LEN).contains(&slug.len())
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Non-blank text with surrounding whitespace. Normalization would trim it.
fn padded(s: &str) -> bool {
    !blank(s) && s.trim() != s
}

fn not_canonical(what: &str, value: &str) -> ValidationError {
    ValidationError::new(
        ErrorCode::NotCanonical,
        format!("{what} {value:?} has surrounding whitespace"),
    )
}

fn validate_header(def: &ContentDefinition, errors: &mut Vec<ValidationError>) {
    if blank(&def.slug) {
        errors.push(ValidationError::new(ErrorCode::MissingSlug, "slug is empty"));
    } else if !is_valid_slug(&def.slug) {
        errors.push(ValidationError::new(
            ErrorCode::BadSlug,
            format!(
                "slug '{}' must be {SLUG_MIN_LEN}-{SLUG_MAX_LEN} chars of a-z, 0-9 and single inner hyphens",
                def.slug
            ),
        ));
    }
    if blank(&def.title) {
        errors.push(ValidationError::new(ErrorCode::MissingTitle, "title is empty"));
    } else if padded(&def.title) {
        errors.push(not_canonical("title", &def.title));
    }
    if padded(&def.engine.subject) {
        errors.push(not_canonical("engine subject", &def.engine.subject));
    }
    let locale = &def.engine.locale;
    if padded(locale) {
        errors.push(not_canonical("engine locale", locale));
    } else if locale.chars().any(char::is_uppercase) {
        errors.push(ValidationError::new(
            ErrorCode::NotCanonical,
            format!("engine locale {locale:?} must be lowercase"),
        ));
    }
    if def.categories.len() != CATEGORY_COUNT {
        errors.push(ValidationError::new(
            ErrorCode::BadCategoryCount,
            format!(
                "expected {CATEGORY_COUNT} categories, found {}",
                def.categories.len()
            ),
        ));
    }
}

fn validate_variants(task: &Task, c: usize, t: usize, errors: &mut Vec<ValidationError>) {
    if task.variants.len() != VARIANT_COUNT {
        errors.push(
            ValidationError::new(
                ErrorCode::BadVariantCount,
                format!(
                    "task '{}' has {} variants, expected {VARIANT_COUNT}",
                    task.id,
                    task.variants.len()
                ),
            )
            .at_task(c, t),
        );
        return;
    }
    if let Some(v) = task.variants.iter().position(|rule| blank(&rule.text)) {
        errors.push(
            ValidationError::new(
                ErrorCode::MissingVariantText,
                format!("task '{}' variant {v} has no text", task.id),
            )
            .at_task(c, t),
        );
    }
    if let Some(rule) = task.variants.iter().find(|rule| padded(&rule.text)) {
        errors.push(not_canonical("variant text", &rule.text).at_task(c, t));
    }
    let untouched = BANDS
        .iter()
        .zip(BAND_NAMES)
        .find(|(band, _)| !band_touched(&task.variants, band));
    if let Some((band, name)) = untouched {
        errors.push(
            ValidationError::new(
                ErrorCode::VariantCoverageGap,
                format!(
                    "task '{}' has no variant for the {name} band ({}-{})",
                    task.id,
                    band.start(),
                    band.end()
                ),
            )
            .at_task(c, t),
        );
    } else if let Some(value) = first_uncovered(&task.variants) {
        errors.push(
            ValidationError::new(
                ErrorCode::VariantCoverageGap,
                format!("task '{}' has no variant for score {value}", task.id),
            )
            .at_task(c, t),
        );
    }
}

fn validate_categories(
    def: &ContentDefinition,
    config: &EngineConfig,
    errors: &mut Vec<ValidationError>,
) {
    let min_pool = config.min_pool();
    let mut category_keys = HashSet::new();
    for (c, category) in def.categories.iter().enumerate() {
        if blank(&category.key) {
            errors.push(
                ValidationError::new(ErrorCode::MissingCategoryKey, "category key is empty").at(c),
            );
        } else if padded(&category.key) {
            errors.push(not_canonical("category key", &category.key).at(c));
        } else if !category_keys.insert(category.key.as_str()) {
            errors.push(
                ValidationError::new(
                    ErrorCode::DuplicateCategoryKey,
                    format!("category key '{}' is used twice", category.key),
                )
                .at(c),
            );
        }
        if blank(&category.title) {
            errors.push(
                ValidationError::new(ErrorCode::MissingTitle, "category title is empty").at(c),
            );
        } else if padded(&category.title) {
            errors.push(not_canonical("category title", &category.title).at(c));
        }
        match category.recommendation.as_deref() {
            Some(text) if blank(text) => errors.push(
                ValidationError::new(
                    ErrorCode::NotCanonical,
                    "blank recommendation must be omitted",
                )
                .at(c),
            ),
            Some(text) if padded(text) => {
                errors.push(not_canonical("recommendation", text).at(c));
            }
            _ => {}
        }
        if category.pool.len() < min_pool {
            errors.push(
                ValidationError::new(
                    ErrorCode::PoolTooSmall,
                    format!(
                        "category '{}' has {} tasks, needs at least {min_pool}",
                        category.key,
                        category.pool.len()
                    ),
                )
                .at(c),
            );
        }

        let mut ids = HashSet::new();
        let mut metric_keys = HashSet::new();
        for (t, task) in category.pool.iter().enumerate() {
            if blank(&task.id) {
                errors.push(
                    ValidationError::new(ErrorCode::MissingTaskId, "task id is empty")
                        .at_task(c, t),
                );
            } else if padded(&task.id) {
                errors.push(not_canonical("task id", &task.id).at_task(c, t));
            } else if !ids.insert(task.id.as_str()) {
                errors.push(
                    ValidationError::new(
                        ErrorCode::DuplicateTaskId,
                        format!("task id '{}' is used twice", task.id),
                    )
                    .at_task(c, t),
                );
            }
            if blank(&task.title) {
                errors.push(
                    ValidationError::new(
                        ErrorCode::MissingTaskTitle,
                        format!("task '{}' has no title", task.id),
                    )
                    .at_task(c, t),
                );
            } else if padded(&task.title) {
                errors.push(not_canonical("task title", &task.title).at_task(c, t));
            }
            if blank(&task.metric_key) {
                errors.push(
                    ValidationError::new(
                        ErrorCode::MissingMetricKey,
                        format!("task '{}' has no metric key", task.id),
                    )
                    .at_task(c, t),
                );
            } else if padded(&task.metric_key) {
                errors.push(not_canonical("metric key", &task.metric_key).at_task(c, t));
            } else if !metric_keys.insert(task.metric_key.as_str()) {
                errors.push(
                    ValidationError::new(
                        ErrorCode::DuplicateMetricKey,
                        format!("metric key '{}' is used twice", task.metric_key),
                    )
                    .at_task(c, t),
                );
            }
            validate_variants(task, c, t, errors);
        }
    }
}

fn validate_insights(def: &ContentDefinition, errors: &mut Vec<ValidationError>) {
    let mut keys = HashSet::new();
    for insight in &def.insights {
        let problem = if blank(&insight.key) {
            Some("insight key is empty".to_string())
        } else if !keys.insert(insight.key.as_str()) {
            Some(format!("insight key '{}' is used twice", insight.key))
        } else if blank(&insight.template) {
            Some(format!("insight '{}' has no template", insight.key))
        } else if insight.min > insight.max {
            Some(format!(
                "insight '{}' range {}..{} is reversed",
                insight.key, insight.min, insight.max
            ))
        } else if insight.max.checked_sub(insight.min).is_none() {
            Some(format!(
                "insight '{}' range {}..{} is too wide",
                insight.key, insight.min, insight.max
            ))
        } else {
            None
        };
        if let Some(details) = problem {
            errors.push(ValidationError::new(ErrorCode::BadInsight, details));
        }
    }
}

/// Every structural defect, in document order.
pub fn validate_all(def: &ContentDefinition, config: &EngineConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    validate_header(def, &mut errors);
    validate_categories(def, config, &mut errors);
    validate_insights(def, &mut errors);
    errors
}

/// First structural defect, if any.
pub fn validate(def: &ContentDefinition, config: &EngineConfig) -> Result<(), ValidationError> {
    match validate_all(def, config).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// [`validate_all`] plus the duplicate-slug check against published editions.
pub fn validate_with_registry<R: SlugRegistry + ?Sized>(
    def: &ContentDefinition,
    config: &EngineConfig,
    registry: &R,
) -> Vec<ValidationError> {
    let mut errors = validate_all(def, config);
    if !blank(&def.slug) && registry.contains_slug(&def.slug) {
        let duplicate = ValidationError::new(
            ErrorCode::DuplicateSlug,
            format!("slug '{}' is already published", def.slug),
        );
        // Slug problems lead the report.
        let at = errors
            .iter()
            .position(|e| !matches!(e.code, ErrorCode::MissingSlug | ErrorCode::BadSlug))
            .unwrap_or(errors.len());
        errors.insert(at, duplicate);
    }
    errors
}
