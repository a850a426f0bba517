//! Wire types for the two prediction protocols.
//!
//! # v1
//!
//! The simple protocol posts a list of instances and receives a list of predictions:
//!
//! ```json
//! { "instances": [ { "task": "summarize", "source": "Lorem ipsum..." } ] }
//! { "predictions": [ { "task": "summarize", "model_name": "/mnt/models",
//!                      "source": "Lorem ipsum...", "target": "..." } ] }
//! ```
//!
//! # v2
//!
//! The typed protocol follows the Open Inference Protocol: requests carry named
//! tensors (`name`, `shape`, `datatype`, `data`) and responses carry output tensors.
//! The same types are used by the server to decode client requests and by the
//! generation engine client to talk to a remote v2 inference server.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Task;

// ============================================================================
// v1 protocol
// ============================================================================

/// v1 prediction request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub instances: Vec<Instance>,
}

/// One v1 instance.
///
/// `task` is kept as raw JSON so that a missing or non-string task is reported
/// as an unavailable task rather than as a decoding failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    #[serde(default)]
    pub task: Option<Value>,
    #[serde(default)]
    pub source: Option<String>,
}

impl Instance {
    /// The task name, if present and a string.
    pub fn task_name(&self) -> Option<&str> {
        self.task.as_ref().and_then(Value::as_str)
    }
}

/// v1 prediction response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predictions: Vec<Prediction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// One v1 prediction. `target` holds either the generated text or an error marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub task: Task,
    pub model_name: String,
    pub source: String,
    pub target: String,
}

// ============================================================================
// v2 protocol
// ============================================================================

/// Tensor element types of the Open Inference Protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Datatype {
    Bool,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int8,
    Int16,
    Int32,
    Int64,
    Fp16,
    Fp32,
    Fp64,
    Bytes,
}

/// v2 inference request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Map<String, Value>>,
    pub inputs: Vec<InferInputTensor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<RequestedOutput>>,
}

/// A named input tensor. `data` is kept as JSON values since its element type
/// depends on `datatype`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferInputTensor {
    pub name: String,
    pub shape: Vec<i64>,
    pub datatype: Datatype,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Map<String, Value>>,
    pub data: Vec<Value>,
}

impl InferInputTensor {
    /// A flat INT64 tensor with the given shape.
    pub fn int64(name: impl Into<String>, shape: Vec<i64>, values: &[i64]) -> Self {
        Self {
            name: name.into(),
            shape,
            datatype: Datatype::Int64,
            parameters: None,
            data: values.iter().map(|v| Value::from(*v)).collect(),
        }
    }

    /// First element of `data` as a string, if it is one.
    pub fn first_str(&self) -> Option<&str> {
        self.data.first().and_then(Value::as_str)
    }
}

/// An output the client asks the server to return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestedOutput {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Map<String, Value>>,
}

/// v2 inference response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferResponse {
    pub model_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Map<String, Value>>,
    pub outputs: Vec<InferOutputTensor>,
}

impl InferResponse {
    /// Build a response, generating a correlation id when the request carried none.
    pub fn new(model_name: String, id: Option<String>, outputs: Vec<InferOutputTensor>) -> Self {
        Self {
            model_name,
            model_version: None,
            id: id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            parameters: None,
            outputs,
        }
    }

    /// Find an output tensor by name.
    pub fn output(&self, name: &str) -> Option<&InferOutputTensor> {
        self.outputs.iter().find(|o| o.name == name)
    }
}

/// A named output tensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferOutputTensor {
    pub name: String,
    pub shape: Vec<i64>,
    pub datatype: Datatype,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Map<String, Value>>,
    pub data: Vec<Value>,
}

impl InferOutputTensor {
    /// A single-element BYTES tensor holding `text`.
    pub fn bytes(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: vec![1],
            datatype: Datatype::Bytes,
            parameters: None,
            data: vec![Value::String(text.into())],
        }
    }

    /// Interpret `data` as integers. Returns `None` if any element is not an integer.
    pub fn as_i64s(&self) -> Option<Vec<i64>> {
        self.data.iter().map(Value::as_i64).collect()
    }
}

/// Shape and type description of a tensor in model metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TensorMetadata {
    pub name: String,
    pub datatype: Datatype,
    pub shape: Vec<i64>,
}

/// Response of `GET /v2/models/{name}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub name: String,
    #[serde(default)]
    pub versions: Vec<String>,
    pub platform: String,
    pub inputs: Vec<TensorMetadata>,
    pub outputs: Vec<TensorMetadata>,
}

/// Response of the model readiness endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelReady {
    pub name: String,
    pub ready: bool,
}

/// Response of `GET /v2`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerMetadata {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub extensions: Vec<String>,
}
