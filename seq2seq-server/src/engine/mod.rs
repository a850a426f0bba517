//! Generation engine abstraction layer.
//!
//! This module defines the `GenerationEngine` trait that hides where the
//! seq2seq forward pass actually runs. The server tokenizes and decodes locally;
//! the engine only turns input ids into generated id sequences.

mod remote;

pub use remote::RemoteEngine;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::accelerator::Accelerator;
use crate::config::GenerationConfig;
use crate::error::Result;
use crate::tokenizer::EncodedInput;

/// Decoding parameters sent with every generation call.
///
/// Beam search without sampling, so outputs are reproducible for fixed weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub max_length: usize,
    pub num_beams: u32,
    pub early_stopping: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_length: 512,
            num_beams: 4,
            early_stopping: true,
        }
    }
}

impl From<&GenerationConfig> for GenerationParams {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            max_length: config.max_length,
            num_beams: config.num_beams,
            early_stopping: config.early_stopping,
        }
    }
}

/// Health status of a generation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineHealth {
    pub is_healthy: bool,
    pub model_ready: bool,
}

/// Primary trait for generation engines.
#[async_trait]
pub trait GenerationEngine: Send + Sync {
    /// Unique identifier for this engine type.
    fn engine_type(&self) -> &'static str;

    /// Check if the engine is responding and the model is ready.
    async fn health_check(&self) -> Result<EngineHealth>;

    /// Load the model into the engine.
    async fn load_model(&self) -> Result<()>;

    /// Run generation for one encoded prompt.
    ///
    /// Returns the generated sequences, best first.
    async fn generate(
        &self,
        input: &EncodedInput,
        params: &GenerationParams,
        accelerator: Accelerator,
    ) -> Result<Vec<Vec<u32>>>;
}
