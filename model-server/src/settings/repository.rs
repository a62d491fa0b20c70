//! Model repository settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default location of the model repository descriptor.
pub const DEFAULT_CONFIG_PATH: &str = "/tmp/config.yml";

/// Where the server finds its model repository descriptor.
///
/// The path is not checked here; a missing or malformed descriptor is
/// reported when the server starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelRepositorySettings {
    config_path: PathBuf,
}

impl Default for ModelRepositorySettings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }
}

impl ModelRepositorySettings {
    /// Creates settings pointing at [`DEFAULT_CONFIG_PATH`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the repository descriptor.
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Replaces the descriptor path in place.
    pub fn set_config_path(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.config_path = path.into();
        self
    }

    /// Replaces the descriptor path.
    #[must_use]
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path() {
        let settings = ModelRepositorySettings::new();
        assert_eq!(settings.config_path(), Path::new("/tmp/config.yml"));
    }

    #[test]
    fn test_config_path_is_writable() {
        let mut settings = ModelRepositorySettings::new();
        settings.set_config_path("models/config.json");
        assert_eq!(settings.config_path(), Path::new("models/config.json"));

        let settings = settings.with_config_path("/does/not/exist.yml");
        assert_eq!(settings.config_path(), Path::new("/does/not/exist.yml"));
    }
}
