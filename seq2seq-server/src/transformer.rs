//! Text transformation: prompt, tokenize, generate, decode.

use std::sync::Arc;

use seq2seq_common::Task;

use crate::accelerator::Accelerator;
use crate::config::GenerationConfig;
use crate::engine::{GenerationEngine, GenerationParams};
use crate::error::{Error, Result};
use crate::tokenizer::Seq2SeqTokenizer;

/// Runs one task over one text with the shared model and tokenizer.
pub struct TextTransformer {
    tokenizer: Arc<Seq2SeqTokenizer>,
    engine: Arc<dyn GenerationEngine>,
    accelerator: Accelerator,
}

impl TextTransformer {
    pub fn new(
        tokenizer: Arc<Seq2SeqTokenizer>,
        engine: Arc<dyn GenerationEngine>,
        accelerator: Accelerator,
    ) -> Self {
        Self {
            tokenizer,
            engine,
            accelerator,
        }
    }

    pub fn accelerator(&self) -> Accelerator {
        self.accelerator
    }

    pub fn engine(&self) -> &Arc<dyn GenerationEngine> {
        &self.engine
    }

    /// Transform `text` according to `task`.
    ///
    /// The prompt is truncated to `options.max_length` tokens and generation uses
    /// beam search, so the same text and task always yield the same output.
    pub async fn transform(
        &self,
        task: Task,
        text: &str,
        options: &GenerationConfig,
    ) -> Result<String> {
        let prompt = task.prompt(text);
        let input = self
            .tokenizer
            .encode(&prompt, options.max_length, options.truncation)?;

        let params = GenerationParams::from(options);
        let sequences = self
            .engine
            .generate(&input, &params, self.accelerator)
            .await?;

        let best = sequences
            .first()
            .ok_or_else(|| Error::InferenceFailed("engine returned no sequences".to_string()))?;

        self.tokenizer.decode(best)
    }
}
