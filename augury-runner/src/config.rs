//! Application configuration loaded from TOML.
//!
//! ```toml
//! catalog_dir = "catalog"
//!
//! [engine]
//! pick_per_category = 3
//! validation_mode = "strict"
//! sample_mode = "strict"
//! default_locale = "en"
//!
//! [engine.gate]
//! teaser_categories = 2
//! teaser_items = 1
//! ```
//!
//! Every key is optional.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use augury_core::config::{EngineConfig, MAX_PICK_PER_CATEGORY, MIN_PICK_PER_CATEGORY};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub engine: EngineConfig,
    /// Directory holding published definitions and `registry.json`.
    pub catalog_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            catalog_dir: PathBuf::from("catalog"),
        }
    }
}

impl AppConfig {
    /// Parse and check a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    /// Load from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Load from `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn check(&self) -> Result<(), ConfigError> {
        let pick = self.engine.pick_per_category;
        if !(MIN_PICK_PER_CATEGORY..=MAX_PICK_PER_CATEGORY).contains(&pick) {
            return Err(ConfigError::Invalid(format!(
                "engine.pick_per_category must be {MIN_PICK_PER_CATEGORY}-{MAX_PICK_PER_CATEGORY}, got {pick}"
            )));
        }
        if self.engine.default_locale.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "engine.default_locale must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use augury_core::config::ValidationMode;
    use augury_core::sampler::SampleMode;

    #[test]
    fn empty_document_is_all_defaults() {
        assert_eq!(AppConfig::from_toml("").unwrap(), AppConfig::default());
    }

    #[test]
    fn partial_overrides() {
        let config = AppConfig::from_toml(
            r#"
            catalog_dir = "/srv/editions"

            [engine]
            pick_per_category = 5
            validation_mode = "lenient"
            sample_mode = "clamp"

            [engine.gate]
            teaser_items = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.catalog_dir, PathBuf::from("/srv/editions"));
        assert_eq!(config.engine.pick_per_category, 5);
        assert_eq!(config.engine.validation_mode, ValidationMode::Lenient);
        assert_eq!(config.engine.sample_mode, SampleMode::Clamp);
        assert_eq!(config.engine.gate.teaser_items, 2);
        assert_eq!(config.engine.gate.teaser_categories, 2);
        assert_eq!(config.engine.default_locale, "en");
    }

    #[test]
    fn out_of_range_pick_is_invalid() {
        for bad in ["0", "6"] {
            let err = AppConfig::from_toml(&format!("[engine]\npick_per_category = {bad}\n"))
                .unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
        }
    }

    #[test]
    fn unknown_mode_is_a_parse_error() {
        let err = AppConfig::from_toml("[engine]\nvalidation_mode = \"paranoid\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        let err = AppConfig::from_toml("cache_dir = \"x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AppConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert_eq!(
            AppConfig::load_or_default(None).unwrap(),
            AppConfig::default()
        );
    }
}
