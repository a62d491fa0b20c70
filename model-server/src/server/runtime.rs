//! Dedicated thread that owns the serving tokio runtime.
//!
//! `launch` blocks the caller until the listeners are bound, so callers may
//! be plain threads or async tasks alike.

use super::Lifecycle;
use crate::error::ServerError;
use crate::infrastructure::{audit, metrics};
use crate::settings::ResolvedServerSettings;
use crate::transport::{self, BoundAddresses, Listeners, ServingContext};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use tokio::sync::watch;
use tracing::{error, warn};

/// Transports running on their own runtime thread.
pub(crate) struct RunningServer {
    addresses: BoundAddresses,
    shutdown: watch::Sender<bool>,
    thread: Option<JoinHandle<()>>,
}

impl RunningServer {
    /// Spawns the runtime thread and waits until both listeners are bound.
    pub(crate) fn launch(
        resolved: ResolvedServerSettings,
        context: Arc<ServingContext>,
        prometheus: Option<PrometheusHandle>,
        lifecycle: Arc<Lifecycle>,
    ) -> Result<Self, ServerError> {
        let (ready_tx, ready_rx) = mpsc::channel::<Result<BoundAddresses, ServerError>>();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let thread = std::thread::Builder::new()
            .name("model-server-runtime".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(resolved.workers)
                    .thread_name("model-server-worker")
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = ready_tx.send(Err(ServerError::Runtime(e.to_string())));
                        return;
                    }
                };

                runtime.block_on(async move {
                    let listeners = match Listeners::bind(&resolved).await {
                        Ok(listeners) => listeners,
                        Err(e) => {
                            let _ = ready_tx.send(Err(e));
                            return;
                        }
                    };
                    let _ = ready_tx.send(Ok(listeners.addresses()));

                    if let Err(e) = transport::run(listeners, context, prometheus, shutdown_rx).await
                    {
                        transport_failed(&lifecycle, &e);
                    }
                });
            })
            .map_err(|e| ServerError::Runtime(format!("Failed to spawn runtime thread: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok(addresses)) => Ok(Self {
                addresses,
                shutdown: shutdown_tx,
                thread: Some(thread),
            }),
            Ok(Err(e)) => {
                join_runtime(thread);
                Err(e)
            }
            Err(_) => {
                join_runtime(thread);
                Err(ServerError::Runtime(
                    "Runtime thread exited before binding".to_string(),
                ))
            }
        }
    }

    pub(crate) fn addresses(&self) -> BoundAddresses {
        self.addresses
    }

    /// Signals the transports to stop and joins the runtime thread.
    pub(crate) fn stop(&mut self) {
        let _ = self.shutdown.send(true);
        if let Some(thread) = self.thread.take() {
            join_runtime(thread);
        }
    }
}

/// A transport ended with an error after the handle went live.
///
/// A shutdown in flight keeps its own transition.
fn transport_failed(lifecycle: &Lifecycle, error: &ServerError) {
    error!(error = %error, "Transport stopped unexpectedly");
    if lifecycle.mark_failed() {
        metrics::set_live(false);
        audit::log_audit(&audit::AuditEvent::ServerStopped {
            reason: error.to_string(),
        });
    }
}

fn join_runtime(thread: JoinHandle<()>) {
    if thread.join().is_err() {
        warn!("Runtime thread panicked");
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        self.stop();
    }
}
