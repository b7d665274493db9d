//! Engine configuration.
//!
//! Every field has a default so a config file only names what it overrides.

use serde::{Deserialize, Serialize};

use crate::gate::GateConfig;
use crate::sampler::SampleMode;

pub const MIN_PICK_PER_CATEGORY: usize = 1;
pub const MAX_PICK_PER_CATEGORY: usize = 5;

/// Smallest pool strict validation accepts, regardless of the pick count.
pub const STRICT_MIN_POOL: usize = 5;

/// How hard the validator is on pool sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Pools only need `pick_per_category` tasks.
    Lenient,
    /// Pools need `max(5, pick_per_category)` tasks.
    #[default]
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tasks drawn per category (1–5).
    pub pick_per_category: usize,
    pub validation_mode: ValidationMode,
    pub sample_mode: SampleMode,
    /// Locale used when a request carries none.
    pub default_locale: String,
    pub gate: GateConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pick_per_category: 3,
            validation_mode: ValidationMode::Strict,
            sample_mode: SampleMode::Strict,
            default_locale: "en".into(),
            gate: GateConfig::default(),
        }
    }
}

impl EngineConfig {
    /// `pick_per_category` clamped into its legal range.
    pub fn pick(&self) -> usize {
        self.pick_per_category
            .clamp(MIN_PICK_PER_CATEGORY, MAX_PICK_PER_CATEGORY)
    }

    /// Minimum pool size the validator enforces.
    pub fn min_pool(&self) -> usize {
        match self.validation_mode {
            ValidationMode::Lenient => self.pick(),
            ValidationMode::Strict => self.pick().max(STRICT_MIN_POOL),
        }
    }

    /// Copy with strict validation forced on.
    pub fn strict(&self) -> Self {
        Self {
            validation_mode: ValidationMode::Strict,
            ..self.clone()
        }
    }
}
