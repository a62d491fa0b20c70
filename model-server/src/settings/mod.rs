//! Configuration for the model server.
//!
//! [`ServerSettings`] and [`ModelRepositorySettings`] are the values handed
//! to [`crate::server::ServerHandle::start`]. [`Settings`] bundles them with
//! telemetry options and loads all three from a file and the environment.
//!
//! # Example
//!
//! ```no_run
//! use model_server::settings::Settings;
//!
//! let settings = Settings::new().expect("Failed to load configuration");
//! ```

pub mod repository;
pub mod server;
pub mod telemetry;

pub use repository::{ModelRepositorySettings, DEFAULT_CONFIG_PATH};
pub use server::{
    LogLevel, ResolvedServerSettings, ServerSettings, DEFAULT_BIND_ADDRESS, DEFAULT_GRPC_PORT,
    DEFAULT_GRPC_WORKERS, DEFAULT_LOG_LEVEL, DEFAULT_REST_PORT, MAX_GRPC_WORKERS,
};
pub use telemetry::TelemetrySettings;

use config::{Config, ConfigError, Environment, File, Map};
use serde::Deserialize;
use std::path::Path;

/// Environment variable naming an optional settings file.
pub const CONFIG_FILE_ENV: &str = "MODEL_SERVER_CONFIG";
/// Prefix of settings environment variables.
pub const ENV_PREFIX: &str = "MODEL_SERVER";

/// Environment variables standing in for the process environment.
pub type EnvMap = Map<String, String>;

/// Top-level configuration for the model server binary.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Transport and runtime settings.
    pub server: ServerSettings,
    /// Model repository settings.
    pub models: ModelRepositorySettings,
    /// Logging and tracing settings.
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Loads settings from `MODEL_SERVER_CONFIG` and `MODEL_SERVER__*`
    /// environment variables on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be built or deserialized.
    pub fn new() -> Result<Self, ConfigError> {
        let file = std::env::var(CONFIG_FILE_ENV).ok();
        Self::from_sources(file.as_deref().map(Path::new), None)
    }

    /// Loads settings from an explicit file and environment map.
    ///
    /// `env` replaces the process environment when given; keys use the
    /// same `MODEL_SERVER__SECTION__KEY` form.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a value has the wrong type.
    pub fn from_sources(
        file: Option<&Path>,
        env: Option<EnvMap>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let s = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .source(env),
            )
            .build()?;

        s.try_deserialize()
    }
}
