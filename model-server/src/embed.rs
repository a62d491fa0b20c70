//! Flat surface for embedding environments.
//!
//! Mirrors the shape host bindings expect: free constructors for both
//! settings values and a single process-wide [`ServerHandle`]. Code that
//! owns its own entry point should construct a [`ServerHandle`] directly.

use crate::server::ServerHandle;
use crate::settings::{ModelRepositorySettings, ServerSettings};
use std::sync::OnceLock;

static INSTANCE: OnceLock<ServerHandle> = OnceLock::new();

/// Returns the process-wide server handle, creating it on first use.
///
/// Every caller, on every thread, receives the same handle.
pub fn instance() -> &'static ServerHandle {
    INSTANCE.get_or_init(ServerHandle::new)
}

/// Server settings carrying the documented defaults.
#[must_use]
pub fn new_server_settings() -> ServerSettings {
    ServerSettings::new()
}

/// Model repository settings carrying the documented default path.
#[must_use]
pub fn new_model_repository_settings() -> ModelRepositorySettings {
    ModelRepositorySettings::new()
}
