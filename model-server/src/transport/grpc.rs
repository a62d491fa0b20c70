//! KServe v2 health and metadata service over tonic.

use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::debug;

use crate::infrastructure::metrics;
use crate::transport::proto::{
    grpc_inference_service_server::GrpcInferenceService, ModelReadyRequest, ModelReadyResponse,
    ServerLiveRequest, ServerLiveResponse, ServerMetadataRequest, ServerMetadataResponse,
    ServerReadyRequest, ServerReadyResponse,
};
use crate::transport::ServingContext;

/// gRPC implementation of `GRPCInferenceService`.
/// Answers health and metadata queries from the shared [`ServingContext`].
pub struct InferenceService {
    context: Arc<ServingContext>,
}

impl InferenceService {
    /// Creates a service answering from `context`.
    #[must_use]
    pub fn new(context: Arc<ServingContext>) -> Self {
        Self { context }
    }
}

#[tonic::async_trait]
impl GrpcInferenceService for InferenceService {
    async fn server_live(
        &self,
        _request: Request<ServerLiveRequest>,
    ) -> Result<Response<ServerLiveResponse>, Status> {
        metrics::record_request("grpc", "server_live");
        Ok(Response::new(ServerLiveResponse {
            live: self.context.is_live(),
        }))
    }

    async fn server_ready(
        &self,
        _request: Request<ServerReadyRequest>,
    ) -> Result<Response<ServerReadyResponse>, Status> {
        metrics::record_request("grpc", "server_ready");
        Ok(Response::new(ServerReadyResponse {
            ready: self.context.is_ready(),
        }))
    }

    async fn server_metadata(
        &self,
        _request: Request<ServerMetadataRequest>,
    ) -> Result<Response<ServerMetadataResponse>, Status> {
        metrics::record_request("grpc", "server_metadata");
        let metadata = self.context.metadata();
        Ok(Response::new(ServerMetadataResponse {
            name: metadata.name,
            version: metadata.version,
            extensions: metadata.extensions,
        }))
    }

    async fn model_ready(
        &self,
        request: Request<ModelReadyRequest>,
    ) -> Result<Response<ModelReadyResponse>, Status> {
        metrics::record_request("grpc", "model_ready");
        let req = request.into_inner();
        debug!(model = %req.name, version = %req.version, "ModelReady requested");

        match self.context.repository().get(&req.name) {
            Some(model) => Ok(Response::new(ModelReadyResponse {
                ready: self.context.is_live() && model.is_ready(),
            })),
            None => Err(Status::not_found(format!("Model '{}' not found", req.name))),
        }
    }
}
