//! Seq2Seq Common Types
//!
//! Shared types used by the seq2seq server and its clients: the closed task set
//! and the wire messages of both prediction protocols.

pub mod protocol;
pub mod task;

pub use protocol::{
    Datatype, InferInputTensor, InferOutputTensor, InferRequest, InferResponse, Instance,
    ModelMetadata, ModelReady, PredictRequest, PredictResponse, Prediction, RequestedOutput,
    ServerMetadata, TensorMetadata,
};
pub use task::{Task, UnknownTask};
