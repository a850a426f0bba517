//! Request shape detection and validation.

use axum::http::{HeaderMap, HeaderValue};
use seq2seq_common::{InferRequest, PredictRequest, Task};
use serde_json::Value;

use super::{Batch, InferenceItem, Protocol};
use crate::error::{Error, Result};

/// Header recording the detected protocol ("v1" or "v2").
pub const REQUEST_TYPE_HEADER: &str = "request-type";

/// Header a client may use to pass its own correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const UNAVAILABLE_TASK: &str = "Unavailable Task.";
const UNSUPPORTED_TASK: &str = "Unsupported Task.";

/// An inbound request in one of the two supported shapes.
#[derive(Debug, Clone)]
pub enum InferenceRequest {
    V1(PredictRequest),
    V2(InferRequest),
}

impl InferenceRequest {
    /// Detect the payload shape: an `instances` list is v1, an `inputs` list is v2.
    pub fn from_payload(payload: Value) -> Result<Self> {
        let shape = match &payload {
            Value::Object(map) if map.get("instances").is_some_and(Value::is_array) => {
                Protocol::V1
            }
            Value::Object(map) if map.get("inputs").is_some_and(Value::is_array) => Protocol::V2,
            _ => return Err(Error::invalid_payload()),
        };

        match shape {
            Protocol::V1 => serde_json::from_value(payload)
                .map(InferenceRequest::V1)
                .map_err(|e| {
                    tracing::debug!("Rejecting v1 payload: {}", e);
                    Error::invalid_payload()
                }),
            Protocol::V2 => serde_json::from_value(payload)
                .map(InferenceRequest::V2)
                .map_err(|e| {
                    tracing::debug!("Rejecting v2 payload: {}", e);
                    Error::invalid_payload()
                }),
        }
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            InferenceRequest::V1(_) => Protocol::V1,
            InferenceRequest::V2(_) => Protocol::V2,
        }
    }

    /// Validate every item. Either the whole request is accepted or none of it is.
    pub fn into_batch(self, header_request_id: Option<String>) -> Result<Batch> {
        match self {
            InferenceRequest::V1(request) => {
                let items = request
                    .instances
                    .into_iter()
                    .map(|instance| {
                        let task = instance
                            .task_name()
                            .and_then(Task::from_name)
                            .ok_or_else(|| Error::InvalidInput(UNAVAILABLE_TASK.to_string()))?;
                        let source = instance.source.ok_or_else(Error::invalid_payload)?;
                        Ok(InferenceItem { task, source })
                    })
                    .collect::<Result<Vec<_>>>()?;

                Ok(Batch {
                    protocol: Protocol::V1,
                    request_id: header_request_id,
                    items,
                })
            }
            InferenceRequest::V2(request) => {
                let items = request
                    .inputs
                    .iter()
                    .map(|input| {
                        let task = Task::from_name(&input.name)
                            .ok_or_else(|| Error::InvalidInput(UNSUPPORTED_TASK.to_string()))?;
                        let source = input.first_str().ok_or_else(Error::invalid_payload)?;
                        Ok(InferenceItem {
                            task,
                            source: source.to_string(),
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;

                Ok(Batch {
                    protocol: Protocol::V2,
                    request_id: request.id.or(header_request_id),
                    items,
                })
            }
        }
    }
}

/// Turn a raw payload into a validated batch, recording the protocol in `headers`.
pub fn normalize(payload: Value, headers: &mut HeaderMap) -> Result<Batch> {
    let request = InferenceRequest::from_payload(payload)?;
    let protocol = request.protocol();
    headers.insert(REQUEST_TYPE_HEADER, HeaderValue::from_static(protocol.as_str()));

    let header_request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    request.into_batch(header_request_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(payload: Value) -> Result<Batch> {
        normalize(payload, &mut HeaderMap::new())
    }

    #[test]
    fn test_v1_items_keep_order() {
        let batch = run(json!({
            "instances": [
                {"task": "anonymize", "source": "Mario Rossi abita a Roma"},
                {"task": "translate", "source": "Hello world"},
                {"task": "summarize", "source": "Lorem ipsum"}
            ]
        }))
        .unwrap();

        assert_eq!(batch.protocol, Protocol::V1);
        let tasks: Vec<Task> = batch.items.iter().map(|i| i.task).collect();
        assert_eq!(tasks, vec![Task::Anonymize, Task::Translate, Task::Summarize]);
        assert_eq!(batch.items[1].source, "Hello world");
    }

    #[test]
    fn test_v1_unknown_or_missing_task() {
        let err = run(json!({"instances": [{"task": "classify", "source": "x"}]})).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(ref m) if m == "Unavailable Task."));

        let err = run(json!({"instances": [{"source": "x"}]})).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(ref m) if m == "Unavailable Task."));
    }

    #[test]
    fn test_v1_non_string_task() {
        for task in [json!(5), json!(["summarize"]), json!({"name": "summarize"}), Value::Null] {
            let err = run(json!({"instances": [{"task": task, "source": "x"}]})).unwrap_err();
            assert!(matches!(err, Error::InvalidInput(ref m) if m == "Unavailable Task."));
        }
    }

    #[test]
    fn test_v1_missing_source() {
        let err = run(json!({"instances": [{"task": "summarize"}]})).unwrap_err();
        assert_eq!(err.to_string(), "invalid payload");
    }

    #[test]
    fn test_v1_non_object_instance() {
        let err = run(json!({"instances": ["summarize"]})).unwrap_err();
        assert_eq!(err.to_string(), "invalid payload");
    }

    #[test]
    fn test_v1_empty_instances() {
        let batch = run(json!({"instances": []})).unwrap();
        assert!(batch.items.is_empty());
    }

    #[test]
    fn test_v2_inputs() {
        let batch = run(json!({
            "id": "abc",
            "inputs": [
                {"name": "translate", "shape": [1], "datatype": "BYTES", "data": ["Ciao mondo"]},
                {"name": "summarize", "shape": [1], "datatype": "BYTES", "data": ["Lorem ipsum"]}
            ]
        }))
        .unwrap();

        assert_eq!(batch.protocol, Protocol::V2);
        assert_eq!(batch.request_id.as_deref(), Some("abc"));
        assert_eq!(
            batch.items[0],
            InferenceItem {
                task: Task::Translate,
                source: "Ciao mondo".to_string()
            }
        );
    }

    #[test]
    fn test_v2_unknown_task() {
        let err = run(json!({
            "inputs": [{"name": "input-0", "shape": [1], "datatype": "BYTES", "data": ["x"]}]
        }))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(ref m) if m == "Unsupported Task."));
    }

    #[test]
    fn test_v2_non_text_data() {
        let err = run(json!({
            "inputs": [{"name": "summarize", "shape": [1], "datatype": "INT64", "data": [42]}]
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), "invalid payload");

        let err = run(json!({
            "inputs": [{"name": "summarize", "shape": [0], "datatype": "BYTES", "data": []}]
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), "invalid payload");
    }

    #[test]
    fn test_unknown_shapes() {
        for payload in [
            json!({}),
            json!({"instances": "summarize"}),
            json!({"inputs": {"name": "summarize"}}),
            json!([{"task": "summarize", "source": "x"}]),
            json!("instances"),
            Value::Null,
        ] {
            let err = run(payload).unwrap_err();
            assert_eq!(err.to_string(), "invalid payload");
        }
    }

    #[test]
    fn test_records_request_type() {
        let mut headers = HeaderMap::new();
        normalize(json!({"instances": []}), &mut headers).unwrap();
        assert_eq!(headers.get(REQUEST_TYPE_HEADER).unwrap(), "v1");

        let mut headers = HeaderMap::new();
        normalize(json!({"inputs": []}), &mut headers).unwrap();
        assert_eq!(headers.get(REQUEST_TYPE_HEADER).unwrap(), "v2");
    }

    #[test]
    fn test_request_id_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("from-header"));
        let batch = normalize(json!({"instances": []}), &mut headers).unwrap();
        assert_eq!(batch.request_id.as_deref(), Some("from-header"));

        let batch = normalize(json!({"id": "from-body", "inputs": []}), &mut headers).unwrap();
        assert_eq!(batch.request_id.as_deref(), Some("from-body"));
    }
}
