//! REST control plane (KServe v2 health and metadata routes).

use crate::infrastructure::metrics;
use crate::repository::ModelState;
use crate::transport::{ServerMetadata, ServingContext};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

type SharedContext = State<Arc<ServingContext>>;

/// Builds the REST router; `/metrics` is mounted only when a handle is given.
pub fn router(context: Arc<ServingContext>, prometheus: Option<PrometheusHandle>) -> Router {
    let mut router = Router::new()
        .route("/v2/health/live", get(health_live))
        .route("/v2/health/ready", get(health_ready))
        .route("/v2", get(server_metadata))
        .route("/v2/models/{name}/ready", get(model_ready))
        .route("/v1/config", get(config_status));

    if let Some(handle) = prometheus {
        router = router.route("/metrics", get(move || std::future::ready(handle.render())));
    }

    router.with_state(context)
}

fn probe(ok: bool) -> StatusCode {
    if ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn health_live(State(context): SharedContext) -> StatusCode {
    metrics::record_request("rest", "health_live");
    probe(context.is_live())
}

async fn health_ready(State(context): SharedContext) -> StatusCode {
    metrics::record_request("rest", "health_ready");
    probe(context.is_ready())
}

async fn server_metadata(State(context): SharedContext) -> Json<ServerMetadata> {
    metrics::record_request("rest", "server_metadata");
    Json(context.metadata())
}

async fn model_ready(
    State(context): SharedContext,
    Path(name): Path<String>,
) -> impl IntoResponse {
    metrics::record_request("rest", "model_ready");
    match context.repository().get(&name) {
        Some(model) => probe(context.is_live() && model.is_ready()).into_response(),
        None => (StatusCode::NOT_FOUND, format!("Model '{name}' not found")).into_response(),
    }
}

#[derive(Debug, Serialize)]
struct ModelStatusView {
    state: ModelState,
    base_path: String,
}

async fn config_status(State(context): SharedContext) -> Json<BTreeMap<String, ModelStatusView>> {
    metrics::record_request("rest", "config");
    let models = context
        .repository()
        .models()
        .map(|model| {
            (
                model.name.clone(),
                ModelStatusView {
                    state: model.state,
                    base_path: model.base_path.display().to_string(),
                },
            )
        })
        .collect();
    Json(models)
}
