//! On-disk schema of the model repository descriptor.

use serde::Deserialize;
use std::path::PathBuf;

/// Root of the descriptor file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepositoryDescriptor {
    /// Declared models.
    #[serde(default)]
    pub model_config_list: Vec<ModelConfigEntry>,
}

/// One element of `model_config_list`.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfigEntry {
    /// Model declaration.
    pub config: ModelConfig,
}

/// Declaration of a single model.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Name clients address the model by.
    pub name: String,
    /// Directory holding the model's versions.
    pub base_path: PathBuf,
}
