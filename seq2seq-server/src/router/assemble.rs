//! Response envelopes for both protocols.

use seq2seq_common::{InferOutputTensor, InferResponse, PredictResponse, Prediction};

use super::{Batch, InferenceResponse, InferenceResult, Protocol, Target};

/// Name of every v2 output record.
pub const OUTPUT_NAME: &str = "result";

pub struct ResponseAssembler {
    served_name: String,
    include_request_id: bool,
}

impl ResponseAssembler {
    /// `served_name` is the model name reported in v2 responses.
    pub fn new(served_name: String, include_request_id: bool) -> Self {
        Self {
            served_name,
            include_request_id,
        }
    }

    pub fn assemble(&self, batch: &Batch, results: Vec<InferenceResult>) -> InferenceResponse {
        match batch.protocol {
            Protocol::V1 => InferenceResponse::V1(self.predict_response(batch, results)),
            Protocol::V2 => InferenceResponse::V2(self.infer_response(batch, results)),
        }
    }

    fn predict_response(&self, batch: &Batch, results: Vec<InferenceResult>) -> PredictResponse {
        let request_id = self.include_request_id.then(|| {
            batch
                .request_id
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
        });

        PredictResponse {
            predictions: results
                .into_iter()
                .map(|r| Prediction {
                    task: r.task,
                    model_name: r.model_name,
                    source: r.source,
                    target: r.target.into_string(),
                })
                .collect(),
            request_id,
        }
    }

    /// One BYTES record per result. If any item failed, the response collapses
    /// to a single record carrying the first error.
    fn infer_response(&self, batch: &Batch, results: Vec<InferenceResult>) -> InferResponse {
        let failure = results.iter().find_map(|r| match &r.target {
            Target::Error(message) => Some(message.clone()),
            Target::Text(_) => None,
        });

        let outputs = match failure {
            Some(message) => vec![InferOutputTensor::bytes(OUTPUT_NAME, message)],
            None => results
                .into_iter()
                .map(|r| InferOutputTensor::bytes(OUTPUT_NAME, r.target.into_string()))
                .collect(),
        };

        InferResponse::new(self.served_name.clone(), batch.request_id.clone(), outputs)
    }
}
