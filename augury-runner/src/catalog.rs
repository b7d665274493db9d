//! Definition catalog with a publish registry.
//!
//! On-disk layout:
//!
//! ```text
//! catalog/
//!   registry.json        { "<slug>": "<blake3 hex>", ... }
//!   <slug>.json          canonical ContentDefinition
//! ```
//!
//! Published definitions are immutable: the registry pins each file's content
//! hash and [`Catalog::open`] refuses to serve a file whose hash moved. New
//! editions go through [`Catalog::publish`] (normalize + validate) or
//! [`Catalog::publish_locked`] (locked schema), and a slug can be published
//! only once.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use augury_core::config::EngineConfig;
use augury_core::definition::{ContentDefinition, DefinitionHash};
use augury_core::locked::{validate_locked_with_registry, LockedSchemaError};
use augury_core::normalize::normalize_json;
use augury_core::validate::{validate_all, validate_with_registry, SlugRegistry, ValidationError};

pub const REGISTRY_FILE: &str = "registry.json";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed definition input: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("'{slug}' is registered but its file is missing")]
    Missing { slug: String },

    #[error("no published definition for '{slug}'")]
    Unregistered { slug: String },

    #[error("'{slug}' changed after publishing (registered {expected}, found {actual})")]
    Tampered {
        slug: String,
        expected: DefinitionHash,
        actual: DefinitionHash,
    },

    #[error("definition '{slug}' failed validation: {}", first_error(.errors))]
    Invalid {
        slug: String,
        errors: Vec<ValidationError>,
    },

    #[error(transparent)]
    Locked(#[from] LockedSchemaError),
}

fn first_error(errors: &[ValidationError]) -> String {
    match errors.first() {
        Some(err) if errors.len() > 1 => format!("{err} (+{} more)", errors.len() - 1),
        Some(err) => err.to_string(),
        None => String::new(),
    }
}

impl CatalogError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        CatalogError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

// ─── Registry ───────────────────────────────────────────────────────

/// Published slugs and their content hashes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    entries: BTreeMap<String, DefinitionHash>,
}

impl Registry {
    /// Read `registry.json` from `dir`; an absent file is an empty registry.
    pub fn load(dir: &Path) -> Result<Self, CatalogError> {
        let path = dir.join(REGISTRY_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| CatalogError::io(&path, e))?;
        serde_json::from_str(&content).map_err(|source| CatalogError::Json { path, source })
    }

    pub fn save(&self, dir: &Path) -> Result<(), CatalogError> {
        let path = dir.join(REGISTRY_FILE);
        let json = serde_json::to_string_pretty(self)
            .map_err(|source| CatalogError::Json {
                path: path.clone(),
                source,
            })?;
        std::fs::write(&path, json).map_err(|e| CatalogError::io(&path, e))
    }

    pub fn get(&self, slug: &str) -> Option<&DefinitionHash> {
        self.entries.get(slug)
    }

    pub fn insert(&mut self, slug: String, hash: DefinitionHash) {
        self.entries.insert(slug, hash);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DefinitionHash)> {
        self.entries.iter().map(|(slug, hash)| (slug.as_str(), hash))
    }
}

impl SlugRegistry for Registry {
    fn contains_slug(&self, slug: &str) -> bool {
        self.entries.contains_key(slug)
    }
}

// ─── Catalog ────────────────────────────────────────────────────────

/// What [`Catalog::publish`] recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Published {
    pub slug: String,
    pub hash: DefinitionHash,
    pub path: PathBuf,
}

#[derive(Debug)]
pub struct Catalog {
    dir: PathBuf,
    config: EngineConfig,
    registry: Registry,
    definitions: BTreeMap<String, ContentDefinition>,
}

impl Catalog {
    /// Open (creating if needed) the catalog at `dir` and load every
    /// registered definition, verifying hashes and structure.
    pub fn open(dir: impl AsRef<Path>, config: EngineConfig) -> Result<Self, CatalogError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| CatalogError::io(&dir, e))?;
        let registry = Registry::load(&dir)?;

        let mut definitions = BTreeMap::new();
        for (slug, expected) in registry.iter() {
            let definition = load_definition(&dir, slug)?;
            let actual = definition.content_hash();
            if &actual != expected {
                return Err(CatalogError::Tampered {
                    slug: slug.to_string(),
                    expected: expected.clone(),
                    actual,
                });
            }
            let errors = validate_all(&definition, &config);
            if !errors.is_empty() {
                return Err(CatalogError::Invalid {
                    slug: slug.to_string(),
                    errors,
                });
            }
            debug!(slug, hash = %actual, "loaded definition");
            definitions.insert(slug.to_string(), definition);
        }
        warn_about_strays(&dir, &registry)?;

        info!(dir = %dir.display(), definitions = definitions.len(), "catalog opened");
        Ok(Self {
            dir,
            config,
            registry,
            definitions,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn get(&self, slug: &str) -> Result<&ContentDefinition, CatalogError> {
        self.definitions
            .get(slug)
            .ok_or_else(|| CatalogError::Unregistered {
                slug: slug.to_string(),
            })
    }

    /// Published slugs, sorted.
    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    /// Normalize authored JSON, validate it against the catalog and publish it.
    pub fn publish(&mut self, raw_json: &str) -> Result<Published, CatalogError> {
        let definition = normalize_json(raw_json).map_err(CatalogError::Malformed)?;
        let errors = validate_with_registry(&definition, &self.config, &self.registry);
        if !errors.is_empty() {
            warn!(slug = %definition.slug, errors = errors.len(), "publish rejected");
            return Err(CatalogError::Invalid {
                slug: definition.slug,
                errors,
            });
        }
        self.store(definition)
    }

    /// Publish through the locked schema: no coercion, every violation reported.
    pub fn publish_locked(&mut self, raw: &serde_json::Value) -> Result<Published, CatalogError> {
        let definition = validate_locked_with_registry(raw, &self.config, &self.registry)
            .map_err(|err| {
                warn!(violations = err.violations.len(), "locked publish rejected");
                err
            })?;
        self.store(definition)
    }

    fn store(&mut self, definition: ContentDefinition) -> Result<Published, CatalogError> {
        let slug = definition.slug.clone();
        let hash = definition.content_hash();
        let path = definition_path(&self.dir, &slug);
        let json = serde_json::to_string_pretty(&definition).map_err(|source| {
            CatalogError::Json {
                path: path.clone(),
                source,
            }
        })?;
        std::fs::write(&path, json).map_err(|e| CatalogError::io(&path, e))?;

        // The in-memory registry only changes once the new one is on disk.
        let mut registry = self.registry.clone();
        registry.insert(slug.clone(), hash.clone());
        if let Err(err) = registry.save(&self.dir) {
            if let Err(cleanup) = std::fs::remove_file(&path) {
                warn!(
                    path = %path.display(),
                    error = %cleanup,
                    "could not remove unpublished file"
                );
            }
            warn!(slug = %slug, error = %err, "registry save failed, publish rolled back");
            return Err(err);
        }
        self.registry = registry;
        self.definitions.insert(slug.clone(), definition);

        info!(slug = %slug, hash = %hash, "published definition");
        Ok(Published { slug, hash, path })
    }
}

fn definition_path(dir: &Path, slug: &str) -> PathBuf {
    dir.join(format!("{slug}.json"))
}

fn load_definition(dir: &Path, slug: &str) -> Result<ContentDefinition, CatalogError> {
    let path = definition_path(dir, slug);
    if !path.exists() {
        return Err(CatalogError::Missing {
            slug: slug.to_string(),
        });
    }
    let content = std::fs::read_to_string(&path).map_err(|e| CatalogError::io(&path, e))?;
    serde_json::from_str(&content).map_err(|source| CatalogError::Json { path, source })
}

/// Definition files nobody registered are never served.
fn warn_about_strays(dir: &Path, registry: &Registry) -> Result<(), CatalogError> {
    let entries = std::fs::read_dir(dir).map_err(|e| CatalogError::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| CatalogError::io(dir, e))?.path();
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        let is_registry = path.file_name().is_some_and(|name| name == REGISTRY_FILE);
        if is_json && !is_registry && !registry.contains_slug(stem) {
            warn!(path = %path.display(), "ignoring unregistered definition file");
        }
    }
    Ok(())
}
