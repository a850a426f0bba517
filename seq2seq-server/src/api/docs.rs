//! Endpoint listing, served only when `server.enable_docs` is set.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use seq2seq_common::Task;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /docs
pub async fn docs(State(state): State<Arc<AppState>>) -> Json<Value> {
    let model = state.model_name();
    let tasks: Vec<&str> = Task::ALL.iter().map(|t| t.name()).collect();

    Json(json!({
        "model": model,
        "tasks": tasks,
        "endpoints": [
            { "method": "POST", "path": format!("/v1/models/{}:predict", model),
              "body": { "instances": [{ "task": tasks[0], "source": "..." }] } },
            { "method": "GET", "path": format!("/v1/models/{}", model) },
            { "method": "POST", "path": format!("/v2/models/{}/infer", model),
              "body": { "inputs": [{ "name": tasks[1], "shape": [1], "datatype": "BYTES", "data": ["..."] }] } },
            { "method": "GET", "path": format!("/v2/models/{}", model) },
            { "method": "GET", "path": format!("/v2/models/{}/ready", model) },
            { "method": "GET", "path": "/v2/health/live" },
            { "method": "GET", "path": "/v2/health/ready" },
            { "method": "GET", "path": "/health" }
        ]
    }))
}
