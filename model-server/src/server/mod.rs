//! The server handle and its start/liveness state machine.
//!
//! A [`ServerHandle`] is an ordinary value: the process entry point
//! constructs one and lends it out by reference. Embedding callers that
//! need a process-wide object use [`crate::embed::instance`].

pub mod lifecycle;
mod runtime;

pub use lifecycle::{Lifecycle, ServerState};

use crate::error::ServerError;
use crate::infrastructure::audit::{log_audit, AuditEvent};
use crate::infrastructure::{metrics, telemetry};
use crate::repository::ModelRepository;
use crate::settings::{ModelRepositorySettings, ServerSettings};
use crate::status::{Status, StatusCode};
use crate::transport::{BoundAddresses, ServingContext};
use parking_lot::Mutex;
use runtime::RunningServer;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Owner of one server instance and its lifecycle.
///
/// - `start` on a live handle returns [`StatusCode::AlreadyLive`] and
///   changes nothing.
/// - `start` while another `start` runs returns
///   [`StatusCode::StartInProgress`].
/// - `start` after a failure is a fresh attempt.
/// - `shutdown` stops the transports and returns the handle to
///   [`ServerState::NotStarted`]; `start` during a shutdown returns
///   [`StatusCode::StopInProgress`].
/// - The log level of the first `start` in the process installs the
///   default subscriber. Later starts, or a host that installed its own
///   subscriber, do not change the active level.
pub struct ServerHandle {
    lifecycle: Arc<Lifecycle>,
    running: Mutex<Option<RunningServer>>,
}

impl Default for ServerHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerHandle")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl ServerHandle {
    /// Creates a handle in [`ServerState::NotStarted`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            lifecycle: Arc::new(Lifecycle::new()),
            running: Mutex::new(None),
        }
    }

    /// Validates the settings, loads the model repository and opens the
    /// transports.
    ///
    /// Both settings are only borrowed; the handle keeps its own copy of
    /// what it needs. Blocks until the listeners are bound. Returns
    /// [`StatusCode::Ok`] exactly when the handle became live.
    #[instrument(skip_all, fields(grpc_port = settings.grpc_port(), rest_port = settings.rest_port()))]
    pub fn start(
        &self,
        settings: &ServerSettings,
        repository: &ModelRepositorySettings,
    ) -> Status {
        log_audit(&AuditEvent::StartRequested {
            grpc_port: settings.grpc_port(),
            rest_port: settings.rest_port(),
            config_path: repository.config_path().display().to_string(),
        });

        match self.try_start(settings, repository) {
            Ok(addresses) => {
                info!(grpc = %addresses.grpc, rest = ?addresses.rest, "Server is live");
                metrics::record_start(StatusCode::Ok.as_str());
                metrics::set_live(true);
                log_audit(&AuditEvent::ServerLive {
                    grpc_address: addresses.grpc.to_string(),
                    rest_address: addresses.rest.map(|addr| addr.to_string()),
                });
                Status::ok()
            }
            Err(e) => {
                warn!(code = %e.code(), error = %e, "Server start failed");
                metrics::record_start(e.code().as_str());
                log_audit(&AuditEvent::StartFailed {
                    code: e.code().to_string(),
                    reason: e.to_string(),
                });
                Status::from(e)
            }
        }
    }

    fn try_start(
        &self,
        settings: &ServerSettings,
        repository: &ModelRepositorySettings,
    ) -> Result<BoundAddresses, ServerError> {
        self.lifecycle.begin_start()?;

        let addresses = match self.launch(settings, repository) {
            Ok(addresses) => addresses,
            Err(e) => {
                self.lifecycle.mark_failed();
                return Err(e);
            }
        };

        if self.lifecycle.mark_live() {
            Ok(addresses)
        } else {
            Err(ServerError::Runtime(
                "Transports stopped during startup".to_string(),
            ))
        }
    }

    fn launch(
        &self,
        settings: &ServerSettings,
        repository: &ModelRepositorySettings,
    ) -> Result<BoundAddresses, ServerError> {
        // Leftovers of a failed run must release their ports first.
        let stale = self.running.lock().take();
        drop(stale);

        let resolved = settings.resolve()?;
        telemetry::install_default(resolved.log_level);

        let models = ModelRepository::load(repository.config_path())?;
        let prometheus = if resolved.metrics_enabled {
            Some(metrics::prometheus_handle()?)
        } else {
            None
        };

        let context = Arc::new(ServingContext::new(Arc::clone(&self.lifecycle), models));
        let server = RunningServer::launch(
            resolved,
            context,
            prometheus,
            Arc::clone(&self.lifecycle),
        )?;
        let addresses = server.addresses();
        *self.running.lock() = Some(server);
        Ok(addresses)
    }

    /// Returns `true` only while the handle is [`ServerState::Live`].
    ///
    /// Never blocks, including during an in-flight `start`.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.lifecycle.is_live()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ServerState {
        self.lifecycle.current()
    }

    /// Addresses the transports bound, while live.
    #[must_use]
    pub fn bound_addresses(&self) -> Option<BoundAddresses> {
        if !self.is_live() {
            return None;
        }
        self.running.lock().as_ref().map(RunningServer::addresses)
    }

    /// Stops the transports and returns the handle to `NotStarted`.
    ///
    /// Returns [`StatusCode::NotStarted`] when nothing is running,
    /// [`StatusCode::StartInProgress`] while a start is in flight and
    /// [`StatusCode::StopInProgress`] while another shutdown runs. A handle
    /// whose last start failed is reset to `NotStarted`.
    pub fn shutdown(&self) -> Status {
        if let Err(e) = self.lifecycle.begin_stop() {
            return Status::from(e);
        }

        let server = self.running.lock().take();
        let Some(mut server) = server else {
            self.lifecycle.finish_stop();
            return Status::from(ServerError::NotStarted);
        };
        server.stop();
        self.lifecycle.finish_stop();
        metrics::set_live(false);

        info!("Server stopped");
        log_audit(&AuditEvent::ServerStopped {
            reason: "shutdown requested".to_string(),
        });
        Status::ok()
    }
}
