//! Dual-protocol inference router.
//!
//! A request goes through three stages:
//!
//! 1. [`normalize`] detects the payload shape (v1 instances or v2 tensors) and
//!    validates every item into an [`InferenceItem`] before anything runs.
//! 2. [`Dispatcher`] runs the items in order, turning per-item failures into
//!    error targets instead of failing the batch.
//! 3. [`ResponseAssembler`] shapes the results back into the protocol the
//!    request came in with.
//!
//! The dispatcher never sees which protocol was used.

mod assemble;
mod dispatch;
mod normalize;

pub use assemble::ResponseAssembler;
pub use dispatch::Dispatcher;
pub use normalize::{normalize, InferenceRequest, REQUEST_ID_HEADER, REQUEST_TYPE_HEADER};

use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use seq2seq_common::{InferResponse, PredictResponse, Task};
use serde_json::Value;

use crate::error::Result;

/// Payload shape a request arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    V1,
    V2,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::V1 => "v1",
            Protocol::V2 => "v2",
        }
    }
}

/// One unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceItem {
    pub task: Task,
    pub source: String,
}

/// A validated request, ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub protocol: Protocol,
    pub request_id: Option<String>,
    pub items: Vec<InferenceItem>,
}

/// Outcome of one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Text(String),
    Error(String),
}

impl Target {
    pub fn is_error(&self) -> bool {
        matches!(self, Target::Error(_))
    }

    /// The generated text, or the error marker in its place.
    pub fn into_string(self) -> String {
        match self {
            Target::Text(text) | Target::Error(text) => text,
        }
    }
}

/// Result for one item, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResult {
    pub task: Task,
    pub model_name: String,
    pub source: String,
    pub target: Target,
}

/// Response in the shape of the originating protocol.
#[derive(Debug, Clone)]
pub enum InferenceResponse {
    V1(PredictResponse),
    V2(InferResponse),
}

impl IntoResponse for InferenceResponse {
    fn into_response(self) -> Response {
        match self {
            InferenceResponse::V1(response) => Json(response).into_response(),
            InferenceResponse::V2(response) => Json(response).into_response(),
        }
    }
}

/// Single entry point for both protocols.
pub struct InferenceRouter {
    dispatcher: Dispatcher,
    assembler: ResponseAssembler,
}

impl InferenceRouter {
    pub fn new(dispatcher: Dispatcher, assembler: ResponseAssembler) -> Self {
        Self {
            dispatcher,
            assembler,
        }
    }

    /// Validate, run and assemble one request.
    ///
    /// `headers` are the request headers; the detected protocol is recorded in
    /// them under [`REQUEST_TYPE_HEADER`]. Invalid input is rejected before any
    /// item is dispatched.
    pub async fn infer(&self, payload: Value, headers: &mut HeaderMap) -> Result<InferenceResponse> {
        let batch = normalize(payload, headers)?;

        tracing::debug!(
            protocol = batch.protocol.as_str(),
            items = batch.items.len(),
            "Dispatching batch"
        );

        let results = self.dispatcher.dispatch(&batch.items).await;
        Ok(self.assembler.assemble(&batch, results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;
    use crate::transformer::tests::{transformer, EchoEngine};
    use std::sync::Arc;

    fn router(engine: Arc<EchoEngine>) -> InferenceRouter {
        let dispatcher = Dispatcher::new(
            Arc::new(transformer(engine)),
            "/mnt/models".to_string(),
            GenerationConfig::default(),
        );
        InferenceRouter::new(dispatcher, ResponseAssembler::new("seq2seq".to_string(), false))
    }

    #[tokio::test]
    async fn test_v1_round_trip() {
        let engine = Arc::new(EchoEngine::default());
        let mut headers = HeaderMap::new();
        let payload = serde_json::json!({
            "instances": [{"task": "summarize", "source": "Lorem ipsum dolor sit amet"}]
        });

        let response = router(engine).infer(payload, &mut headers).await.unwrap();

        assert_eq!(headers.get(REQUEST_TYPE_HEADER).unwrap(), "v1");
        let InferenceResponse::V1(response) = response else {
            panic!("expected v1 response");
        };
        assert_eq!(response.predictions[0].task, Task::Summarize);
        assert_eq!(response.predictions[0].model_name, "/mnt/models");
        assert!(!response.predictions[0].target.is_empty());
    }

    #[tokio::test]
    async fn test_v2_round_trip() {
        let engine = Arc::new(EchoEngine::default());
        let mut headers = HeaderMap::new();
        let payload = serde_json::json!({
            "inputs": [{"name": "translate", "shape": [1], "datatype": "BYTES", "data": ["Ciao mondo"]}]
        });

        let response = router(engine).infer(payload, &mut headers).await.unwrap();

        assert_eq!(headers.get(REQUEST_TYPE_HEADER).unwrap(), "v2");
        let InferenceResponse::V2(response) = response else {
            panic!("expected v2 response");
        };
        assert_eq!(response.model_name, "seq2seq");
        assert_eq!(response.outputs.len(), 1);
        assert_eq!(response.outputs[0].name, "result");
        assert_eq!(response.outputs[0].data[0], "Ciao mondo");
    }

    #[tokio::test]
    async fn test_unknown_task_never_reaches_engine() {
        let engine = Arc::new(EchoEngine::default());
        let mut headers = HeaderMap::new();
        let payload = serde_json::json!({
            "instances": [
                {"task": "summarize", "source": "Lorem ipsum"},
                {"task": "paraphrase", "source": "Lorem ipsum"}
            ]
        });

        let err = router(engine.clone())
            .infer(payload, &mut headers)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Unavailable Task.");
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_payload_never_reaches_engine() {
        let engine = Arc::new(EchoEngine::default());
        let mut headers = HeaderMap::new();

        let err = router(engine.clone())
            .infer(serde_json::json!({"prompt": "hi"}), &mut headers)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "invalid payload");
        assert_eq!(engine.call_count(), 0);
        assert!(headers.get(REQUEST_TYPE_HEADER).is_none());
    }
}
