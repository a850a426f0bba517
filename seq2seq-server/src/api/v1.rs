//! v1 endpoints: `:predict` and model status.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use seq2seq_common::ModelReady;
use serde_json::Value;

use super::{ensure_model, json_payload};
use crate::error::{Error, Result};
use crate::state::AppState;

const PREDICT_VERB: &str = ":predict";

/// Build the v1 router.
pub fn router() -> Router<Arc<AppState>> {
    // The verb is part of the last segment ("{name}:predict"), so it is split off by hand.
    Router::new().route("/v1/models/:target", get(model_status).post(predict))
}

/// GET /v1/models/{name} - Model readiness.
async fn model_status(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ModelReady>> {
    ensure_model(&state, &name)?;
    Ok(Json(ModelReady {
        name,
        ready: state.is_ready(),
    }))
}

/// POST /v1/models/{name}:predict - Run a prediction.
async fn predict(
    State(state): State<Arc<AppState>>,
    Path(target): Path<String>,
    headers: HeaderMap,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Response> {
    let payload = json_payload(payload)?;
    let name = target
        .strip_suffix(PREDICT_VERB)
        .ok_or_else(|| Error::ModelNotFound(target.clone()))?;

    tracing::debug!("Predict request for model: {}", name);
    super::infer(&state, name, headers, payload).await
}
