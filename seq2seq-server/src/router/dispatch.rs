//! Sequential per-item dispatch.

use std::sync::Arc;

use super::{InferenceItem, InferenceResult, Target};
use crate::config::GenerationConfig;
use crate::transformer::TextTransformer;

/// Runs validated items through the text transformer.
pub struct Dispatcher {
    transformer: Arc<TextTransformer>,
    model_name: String,
    options: GenerationConfig,
}

impl Dispatcher {
    /// `model_name` is reported in every result (the model directory).
    pub fn new(
        transformer: Arc<TextTransformer>,
        model_name: String,
        options: GenerationConfig,
    ) -> Self {
        Self {
            transformer,
            model_name,
            options,
        }
    }

    /// Produce one result per item, in order.
    ///
    /// Items run one after the other. A failing item gets an error target and
    /// the remaining items still run.
    pub async fn dispatch(&self, items: &[InferenceItem]) -> Vec<InferenceResult> {
        let mut results = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            tracing::debug!(index, task = %item.task, "Generating with source text {}", item.source);

            let target = match self
                .transformer
                .transform(item.task, &item.source, &self.options)
                .await
            {
                Ok(text) => Target::Text(text),
                Err(e) => {
                    tracing::warn!(index, task = %item.task, "Inference failed: {}", e);
                    Target::Error(format!("Error in inference: {}", e))
                }
            };

            results.push(InferenceResult {
                task: item.task,
                model_name: self.model_name.clone(),
                source: item.source.clone(),
                target,
            });
        }

        results
    }
}
