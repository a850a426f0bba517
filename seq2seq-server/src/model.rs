//! Model loading.
//!
//! Loading happens once at startup. Any failure here is fatal: the server never
//! reports ready without a tokenizer and a ready engine model.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::accelerator::Accelerator;
use crate::config::Config;
use crate::engine::{GenerationEngine, RemoteEngine};
use crate::error::{Error, Result};
use crate::tokenizer::Seq2SeqTokenizer;
use crate::transformer::TextTransformer;

/// Load the tokenizer from the model directory and bring up the model on the engine.
pub async fn load(config: &Config, accelerator: Accelerator) -> Result<TextTransformer> {
    let model_dir = Path::new(&config.model.path);
    if !model_dir.is_dir() {
        return Err(Error::LoadFailed(format!(
            "Model directory not found: {}",
            model_dir.display()
        )));
    }

    let tokenizer = Seq2SeqTokenizer::from_model_dir(model_dir)?;
    tracing::info!("Loaded tokenizer from {}", model_dir.display());

    let engine = RemoteEngine::new(
        &config.engine.base_url,
        config.engine.remote_model_name(&config.model),
        Duration::from_secs(config.engine.timeout_secs),
    )?;

    load_with_engine(config, tokenizer, Arc::new(engine), accelerator).await
}

/// Bring up an already constructed engine and pair it with the tokenizer.
pub async fn load_with_engine(
    config: &Config,
    tokenizer: Seq2SeqTokenizer,
    engine: Arc<dyn GenerationEngine>,
    accelerator: Accelerator,
) -> Result<TextTransformer> {
    if config.engine.load_on_startup {
        engine.load_model().await?;
    }

    let health = engine.health_check().await?;
    if !health.is_healthy || !health.model_ready {
        return Err(Error::LoadFailed(format!(
            "{} engine is not ready (healthy={}, model_ready={})",
            engine.engine_type(),
            health.is_healthy,
            health.model_ready
        )));
    }

    tracing::info!(
        "Model {} ready on {} engine",
        config.engine.remote_model_name(&config.model),
        engine.engine_type()
    );

    Ok(TextTransformer::new(Arc::new(tokenizer), engine, accelerator))
}
