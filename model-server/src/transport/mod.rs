//! Network transports opened by a started server.
//!
//! gRPC is always served; REST only when a REST port is configured. Both
//! answer from one [`ServingContext`] and stop together when the shutdown
//! signal fires.

pub mod grpc;
pub mod proto;
pub mod rest;

pub use grpc::InferenceService;

use crate::error::ServerError;
use crate::repository::ModelRepository;
use crate::server::Lifecycle;
use crate::settings::ResolvedServerSettings;
use metrics_exporter_prometheus::PrometheusHandle;
use proto::grpc_inference_service_server::GrpcInferenceServiceServer;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_stream::wrappers::TcpListenerStream;
use tracing::info;

/// State shared by every request handler.
#[derive(Debug)]
pub struct ServingContext {
    lifecycle: Arc<Lifecycle>,
    repository: ModelRepository,
}

impl ServingContext {
    /// Creates a context over `repository` that reports `lifecycle`.
    #[must_use]
    pub fn new(lifecycle: Arc<Lifecycle>, repository: ModelRepository) -> Self {
        Self {
            lifecycle,
            repository,
        }
    }

    /// Whether the owning handle is live.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.lifecycle.is_live()
    }

    /// Whether the server accepts requests; currently the same as live.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.is_live()
    }

    /// Models loaded at start.
    #[must_use]
    pub fn repository(&self) -> &ModelRepository {
        &self.repository
    }

    /// Server identity reported by the metadata endpoints.
    #[must_use]
    pub fn metadata(&self) -> ServerMetadata {
        ServerMetadata {
            name: crate::SERVICE_NAME.to_string(),
            version: crate::SERVICE_VERSION.to_string(),
            extensions: Vec::new(),
        }
    }
}

/// Server identity as reported over gRPC and REST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerMetadata {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
    /// Supported protocol extensions.
    pub extensions: Vec<String>,
}

/// Socket addresses the transports actually bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundAddresses {
    /// gRPC listener.
    pub grpc: SocketAddr,
    /// REST listener, when enabled.
    pub rest: Option<SocketAddr>,
}

/// Bound but not yet serving listeners.
pub(crate) struct Listeners {
    grpc: TcpListener,
    rest: Option<TcpListener>,
    addresses: BoundAddresses,
}

impl Listeners {
    /// Binds every configured listener.
    pub(crate) async fn bind(resolved: &ResolvedServerSettings) -> Result<Self, ServerError> {
        let grpc = bind_one(resolved.grpc_addr).await?;
        let rest = match resolved.rest_addr {
            Some(addr) => Some(bind_one(addr).await?),
            None => None,
        };

        let local = |listener: &TcpListener, requested: SocketAddr| {
            listener
                .local_addr()
                .map_err(|e| ServerError::bind(requested.to_string(), e))
        };
        let addresses = BoundAddresses {
            grpc: local(&grpc, resolved.grpc_addr)?,
            rest: match (&rest, resolved.rest_addr) {
                (Some(listener), Some(requested)) => Some(local(listener, requested)?),
                _ => None,
            },
        };

        Ok(Self {
            grpc,
            rest,
            addresses,
        })
    }

    pub(crate) fn addresses(&self) -> BoundAddresses {
        self.addresses
    }
}

async fn bind_one(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::bind(addr.to_string(), e))
}

async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    // A dropped sender also means stop.
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Serves both transports until `shutdown` fires or one of them fails.
pub(crate) async fn run(
    listeners: Listeners,
    context: Arc<ServingContext>,
    prometheus: Option<PrometheusHandle>,
    shutdown: watch::Receiver<bool>,
) -> Result<(), ServerError> {
    let Listeners {
        grpc,
        rest,
        addresses,
    } = listeners;

    info!("gRPC server listening on {}", addresses.grpc);
    let grpc_server = tonic::transport::Server::builder()
        .add_service(GrpcInferenceServiceServer::new(InferenceService::new(
            Arc::clone(&context),
        )))
        .serve_with_incoming_shutdown(
            TcpListenerStream::new(grpc),
            wait_for_shutdown(shutdown.clone()),
        );
    let grpc_task = async {
        grpc_server
            .await
            .map_err(|e| ServerError::Runtime(format!("gRPC server failed: {e}")))
    };

    let rest_task = async {
        let Some(listener) = rest else {
            return Ok(());
        };
        if let Some(addr) = addresses.rest {
            info!("REST server listening on {}", addr);
        }
        axum::serve(listener, rest::router(Arc::clone(&context), prometheus))
            .with_graceful_shutdown(wait_for_shutdown(shutdown.clone()))
            .await
            .map_err(|e| ServerError::Runtime(format!("REST server failed: {e}")))
    };

    tokio::try_join!(grpc_task, rest_task)?;
    Ok(())
}
