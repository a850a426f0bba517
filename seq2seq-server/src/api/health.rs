//! Health check endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health - Liveness plus model readiness.
///
/// Always 200 while the process serves requests; `status` tells whether the
/// model finished loading.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let status = if state.is_ready() { "ok" } else { "loading" };
    (
        StatusCode::OK,
        Json(json!({ "status": status, "model": state.model_name() })),
    )
}
