//! v2 endpoints (Open Inference Protocol REST).

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use seq2seq_common::{Datatype, ModelMetadata, ModelReady, ServerMetadata, TensorMetadata, Task};
use serde_json::{json, Value};

use super::{ensure_model, json_payload};
use crate::error::Result;
use crate::state::AppState;

const SERVER_NAME: &str = "seq2seq-server";
const PLATFORM: &str = "seq2seq";

/// Build the v2 router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v2", get(server_metadata))
        .route("/v2/health/live", get(live))
        .route("/v2/health/ready", get(ready))
        .route("/v2/models/:name", get(model_metadata))
        .route("/v2/models/:name/ready", get(model_ready))
        .route("/v2/models/:name/infer", post(infer))
}

/// GET /v2 - Server metadata.
async fn server_metadata() -> Json<ServerMetadata> {
    Json(ServerMetadata {
        name: SERVER_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        extensions: vec![],
    })
}

/// GET /v2/health/live
async fn live() -> Json<Value> {
    Json(json!({ "live": true }))
}

/// GET /v2/health/ready
async fn ready(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let ready = state.is_ready();
    (readiness_status(ready), Json(json!({ "ready": ready })))
}

/// GET /v2/models/{name} - Inputs are the task names, the single output is `result`.
async fn model_metadata(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ModelMetadata>> {
    ensure_model(&state, &name)?;

    let inputs = Task::ALL
        .iter()
        .map(|task| TensorMetadata {
            name: task.name().to_string(),
            datatype: Datatype::Bytes,
            shape: vec![1],
        })
        .collect();

    Ok(Json(ModelMetadata {
        name,
        versions: vec![],
        platform: PLATFORM.to_string(),
        inputs,
        outputs: vec![TensorMetadata {
            name: "result".to_string(),
            datatype: Datatype::Bytes,
            shape: vec![1],
        }],
    }))
}

/// GET /v2/models/{name}/ready
async fn model_ready(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<(StatusCode, Json<ModelReady>)> {
    ensure_model(&state, &name)?;
    let ready = state.is_ready();
    Ok((readiness_status(ready), Json(ModelReady { name, ready })))
}

/// POST /v2/models/{name}/infer - Run inference.
async fn infer(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Response> {
    let payload = json_payload(payload)?;
    tracing::debug!("Infer request for model: {}", name);
    super::infer(&state, &name, headers, payload).await
}

fn readiness_status(ready: bool) -> StatusCode {
    if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
