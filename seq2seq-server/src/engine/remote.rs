//! Remote generation engine speaking the Open Inference Protocol (v2 REST).
//!
//! The model itself is hosted by any v2-compatible inference server. Input ids
//! and the attention mask are sent as INT64 tensors; generated ids come back in
//! an `output_ids` tensor of shape `[num_sequences, length]`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use seq2seq_common::{InferInputTensor, InferRequest, InferResponse, RequestedOutput};
use serde_json::{Map, Value};

use super::{EngineHealth, GenerationEngine, GenerationParams};
use crate::accelerator::Accelerator;
use crate::error::{Error, Result};
use crate::tokenizer::EncodedInput;

const OUTPUT_IDS: &str = "output_ids";

/// Remote v2 engine.
pub struct RemoteEngine {
    http_client: Client,
    base_url: String,
    model_name: String,
}

impl RemoteEngine {
    pub fn new(base_url: &str, model_name: &str, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model_name: model_name.to_string(),
        })
    }

    fn model_url(&self, suffix: &str) -> String {
        format!("{}/v2/models/{}{}", self.base_url, self.model_name, suffix)
    }

    fn build_request(
        input: &EncodedInput,
        params: &GenerationParams,
        accelerator: Accelerator,
    ) -> InferRequest {
        let shape = vec![1, input.len() as i64];
        let ids: Vec<i64> = input.input_ids.iter().map(|&id| id as i64).collect();
        let mask: Vec<i64> = input.attention_mask.iter().map(|&m| m as i64).collect();

        let mut parameters = Map::new();
        parameters.insert("max_length".to_string(), Value::from(params.max_length));
        parameters.insert("num_beams".to_string(), Value::from(params.num_beams));
        parameters.insert("early_stopping".to_string(), Value::from(params.early_stopping));
        parameters.insert("do_sample".to_string(), Value::from(false));
        parameters.insert("device".to_string(), Value::from(accelerator.device.as_str()));
        parameters.insert("dtype".to_string(), Value::from(accelerator.precision.as_str()));

        InferRequest {
            id: None,
            parameters: Some(parameters),
            inputs: vec![
                InferInputTensor::int64("input_ids", shape.clone(), &ids),
                InferInputTensor::int64("attention_mask", shape, &mask),
            ],
            outputs: Some(vec![RequestedOutput {
                name: OUTPUT_IDS.to_string(),
                parameters: None,
            }]),
        }
    }
}

/// Split a flat id tensor into rows according to its shape.
fn split_sequences(shape: &[i64], data: &[i64]) -> Result<Vec<Vec<u32>>> {
    let bad_shape = || {
        Error::InferenceFailed(format!(
            "{} shape {:?} does not match {} elements",
            OUTPUT_IDS,
            shape,
            data.len()
        ))
    };

    let dims: Vec<usize> = shape
        .iter()
        .map(|&d| usize::try_from(d).map_err(|_| bad_shape()))
        .collect::<Result<_>>()?;

    let (rows, cols) = match dims.as_slice() {
        [len] => (1, *len),
        [rows, cols] => (*rows, *cols),
        _ => return Err(bad_shape()),
    };

    if cols == 0 || rows.checked_mul(cols) != Some(data.len()) {
        return Err(bad_shape());
    }

    data.chunks(cols)
        .map(|row| {
            row.iter()
                .map(|&id| {
                    u32::try_from(id).map_err(|_| {
                        Error::InferenceFailed(format!("invalid token id {} from engine", id))
                    })
                })
                .collect()
        })
        .collect()
}

#[async_trait]
impl GenerationEngine for RemoteEngine {
    fn engine_type(&self) -> &'static str {
        "remote_v2"
    }

    async fn health_check(&self) -> Result<EngineHealth> {
        let url = format!("{}/v2/health/ready", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Communication(e.to_string()))?;

        if !response.status().is_success() {
            return Ok(EngineHealth {
                is_healthy: false,
                model_ready: false,
            });
        }

        let model_ready = self
            .http_client
            .get(self.model_url("/ready"))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false);

        Ok(EngineHealth {
            is_healthy: true,
            model_ready,
        })
    }

    async fn load_model(&self) -> Result<()> {
        let url = format!(
            "{}/v2/repository/models/{}/load",
            self.base_url, self.model_name
        );

        let response = self
            .http_client
            .post(&url)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| Error::Communication(e.to_string()))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::LoadFailed(format!(
                "Failed to load model {}: {}",
                self.model_name, body
            )));
        }

        tracing::info!("Model {} loaded on engine", self.model_name);
        Ok(())
    }

    async fn generate(
        &self,
        input: &EncodedInput,
        params: &GenerationParams,
        accelerator: Accelerator,
    ) -> Result<Vec<Vec<u32>>> {
        let request = Self::build_request(input, params, accelerator);
        let url = self.model_url("/infer");

        tracing::debug!(
            "Sending generation request: {} tokens={} beams={}",
            url,
            input.len(),
            params.num_beams
        );

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Communication(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::InferenceFailed(format!("{}: {}", status, body)));
        }

        let infer_response: InferResponse = response
            .json()
            .await
            .map_err(|e| Error::InferenceFailed(e.to_string()))?;

        let output = infer_response.output(OUTPUT_IDS).ok_or_else(|| {
            Error::InferenceFailed(format!("engine response has no {} tensor", OUTPUT_IDS))
        })?;

        let ids = output.as_i64s().ok_or_else(|| {
            Error::InferenceFailed(format!("{} tensor is not integer typed", OUTPUT_IDS))
        })?;

        split_sequences(&output.shape, &ids)
    }
}
