//! Model repository loaded from the descriptor at start time.
//!
//! The descriptor may be YAML, JSON or TOML, chosen by file extension.
//! Loading only checks declarations; model weights are never read.

pub mod descriptor;

pub use descriptor::{ModelConfig, ModelConfigEntry, RepositoryDescriptor};

use crate::error::ServerError;
use config::{Config, File};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Availability of a declared model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelState {
    /// Base path exists.
    Available,
    /// Base path is missing or not a directory.
    Unavailable,
}

/// A model declared in the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelEntry {
    /// Model name.
    pub name: String,
    /// Resolved base path.
    pub base_path: PathBuf,
    /// Availability at load time.
    pub state: ModelState,
}

impl ModelEntry {
    /// Returns `true` when the model can serve requests.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == ModelState::Available
    }
}

/// Models declared by a loaded descriptor, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelRepository {
    source: PathBuf,
    models: BTreeMap<String, ModelEntry>,
}

impl ModelRepository {
    /// Loads and validates the descriptor at `path`.
    ///
    /// # Errors
    ///
    /// - [`ServerError::ConfigFileMissing`] if `path` is not a file
    /// - [`ServerError::ConfigFileInvalid`] if the file cannot be parsed
    /// - [`ServerError::ModelConfigInvalid`] if a declaration is unusable
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        if !path.is_file() {
            return Err(ServerError::ConfigFileMissing(path.to_path_buf()));
        }

        let invalid = |e: config::ConfigError| ServerError::ConfigFileInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        let descriptor: RepositoryDescriptor = Config::builder()
            .add_source(File::from(path).required(true))
            .build()
            .map_err(invalid)?
            .try_deserialize()
            .map_err(invalid)?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let repository = Self::from_descriptor(path, base_dir, descriptor)?;
        info!(
            config_path = %path.display(),
            models = repository.len(),
            "Model repository loaded"
        );
        Ok(repository)
    }

    fn from_descriptor(
        source: &Path,
        base_dir: &Path,
        descriptor: RepositoryDescriptor,
    ) -> Result<Self, ServerError> {
        let mut seen = HashSet::new();
        let mut models = BTreeMap::new();

        for ModelConfigEntry { config } in descriptor.model_config_list {
            let name = config.name.trim().to_string();
            if name.is_empty() {
                return Err(ServerError::ModelConfigInvalid(
                    "model name must not be empty".to_string(),
                ));
            }
            if !seen.insert(name.clone()) {
                return Err(ServerError::ModelConfigInvalid(format!(
                    "duplicate model name '{name}'"
                )));
            }
            if config.base_path.as_os_str().is_empty() {
                return Err(ServerError::ModelConfigInvalid(format!(
                    "model '{name}' has an empty base_path"
                )));
            }

            let base_path = if config.base_path.is_absolute() {
                config.base_path
            } else {
                base_dir.join(config.base_path)
            };
            let state = if base_path.is_dir() {
                ModelState::Available
            } else {
                warn!(model = %name, base_path = %base_path.display(), "Model base path not found");
                ModelState::Unavailable
            };
            debug!(model = %name, ?state, "Registered model");

            models.insert(
                name.clone(),
                ModelEntry {
                    name,
                    base_path,
                    state,
                },
            );
        }

        Ok(Self {
            source: source.to_path_buf(),
            models,
        })
    }

    /// Descriptor the repository was loaded from.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Looks up a model by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ModelEntry> {
        self.models.get(name)
    }

    /// Iterates models in name order.
    pub fn models(&self) -> impl Iterator<Item = &ModelEntry> {
        self.models.values()
    }

    /// Number of declared models.
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns `true` when no models are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
