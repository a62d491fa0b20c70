//! Model Server - configuration and lifecycle control surface.
//!
//! This crate lets a host process configure an inference server, start
//! it, and observe its liveness. Starting opens a gRPC health/metadata
//! transport and, optionally, a REST control plane with Prometheus
//! metrics.
//!
//! ```no_run
//! use model_server::embed;
//!
//! let mut settings = embed::new_server_settings();
//! settings.set_grpc_port(9000);
//! let mut models = embed::new_model_repository_settings();
//! models.set_config_path("/srv/models/config.yml");
//!
//! let server = embed::instance();
//! let status = server.start(&settings, &models);
//! assert_eq!(status.is_ok(), server.is_live());
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Process-wide accessor and constructors for embedding callers.
pub mod embed;
/// Internal error type and its mapping onto status codes.
pub mod error;
/// Infrastructure components (telemetry, metrics, audit).
pub mod infrastructure;
/// Model repository descriptor loading.
pub mod repository;
/// Server handle and lifecycle state machine.
pub mod server;
/// Server, repository and telemetry settings.
pub mod settings;
/// Outcome codes.
pub mod status;
/// gRPC and REST transports.
pub mod transport;

pub use error::ServerError;
pub use server::{ServerHandle, ServerState};
pub use settings::{ModelRepositorySettings, ServerSettings};
pub use status::{Status, StatusCode};

/// Name reported in metadata and telemetry.
pub const SERVICE_NAME: &str = "model-server";
/// Crate version reported in metadata and telemetry.
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
