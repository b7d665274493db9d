//! Visibility gate — the unpaid teaser is a slice of the full result.
//!
//! The teaser is never sampled separately. It is cut out of the already
//! computed full result with fixed limits, so it is always a prefix of what a
//! paying user sees.

use serde::{Deserialize, Serialize};

use crate::compute::{CategoryResult, ComputeResult};

/// Teaser limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Leading categories kept in the teaser.
    pub teaser_categories: usize,
    /// Leading items kept per kept category.
    pub teaser_items: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            teaser_categories: 2,
            teaser_items: 1,
        }
    }
}

/// Full result for paying callers, otherwise the truncated teaser.
///
/// The teaser drops category recommendations and all insights.
pub fn slice(full: &ComputeResult, paid: bool, config: &GateConfig) -> ComputeResult {
    if paid {
        return full.clone();
    }
    ComputeResult {
        slug: full.slug.clone(),
        seed: full.seed,
        categories: full
            .categories
            .iter()
            .take(config.teaser_categories)
            .map(|category| CategoryResult {
                key: category.key.clone(),
                title: category.title.clone(),
                recommendation: None,
                items: category
                    .items
                    .iter()
                    .take(config.teaser_items)
                    .cloned()
                    .collect(),
            })
            .collect(),
        insights: Vec::new(),
    }
}

/// Whether every category, item and insight of `teaser` appears verbatim, in
/// the same position, in `full`.
pub fn is_prefix_of(teaser: &ComputeResult, full: &ComputeResult) -> bool {
    if teaser.slug != full.slug || teaser.seed != full.seed {
        return false;
    }
    if teaser.categories.len() > full.categories.len()
        || teaser.insights.len() > full.insights.len()
    {
        return false;
    }
    let categories_ok = teaser
        .categories
        .iter()
        .zip(&full.categories)
        .all(|(t, f)| {
            t.key == f.key
                && t.title == f.title
                && (t.recommendation.is_none() || t.recommendation == f.recommendation)
                && t.items.len() <= f.items.len()
                && t.items.iter().zip(&f.items).all(|(ti, fi)| ti == fi)
        });
    categories_ok
        && teaser
            .insights
            .iter()
            .zip(&full.insights)
            .all(|(t, f)| t == f)
}
