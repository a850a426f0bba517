//! HTTP API for the v1 and v2 prediction protocols.

pub mod docs;
pub mod health;
pub mod v1;
pub mod v2;

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::router::REQUEST_TYPE_HEADER;
use crate::state::AppState;

/// Build the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().merge(v1::router()).merge(v2::router())
}

/// Reject requests for a model this server does not serve.
fn ensure_model(state: &AppState, name: &str) -> Result<()> {
    if name == state.model_name() {
        Ok(())
    } else {
        Err(Error::ModelNotFound(name.to_string()))
    }
}

/// Map a body that is not JSON to the invalid payload error.
fn json_payload(payload: std::result::Result<Json<Value>, JsonRejection>) -> Result<Value> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        tracing::debug!("Rejecting request body: {}", rejection.body_text());
        Error::invalid_payload()
    })
}

/// Shared inference path of both predict endpoints.
///
/// The payload shape decides the protocol, not the endpoint it was posted to.
async fn infer(
    state: &AppState,
    model_name: &str,
    mut headers: HeaderMap,
    payload: Value,
) -> Result<Response> {
    ensure_model(state, model_name)?;
    if !state.is_ready() {
        return Err(Error::ModelNotReady(model_name.to_string()));
    }

    let inference = state.router.infer(payload, &mut headers).await?;

    let mut response = inference.into_response();
    if let Some(value) = headers.get(REQUEST_TYPE_HEADER) {
        response
            .headers_mut()
            .insert(REQUEST_TYPE_HEADER, value.clone());
    }
    Ok(response)
}
