//! Shared application state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::Config;
use crate::router::{Dispatcher, InferenceRouter, ResponseAssembler};
use crate::transformer::TextTransformer;

/// Shared application state passed to all handlers.
///
/// Everything except the readiness flag is immutable after construction.
pub struct AppState {
    pub config: Config,
    pub router: InferenceRouter,
    ready: AtomicBool,
}

impl AppState {
    pub fn new(config: Config, transformer: Arc<TextTransformer>) -> Self {
        let dispatcher = Dispatcher::new(
            transformer,
            config.model.path.clone(),
            config.generation.clone(),
        );
        let assembler =
            ResponseAssembler::new(config.model.name.clone(), config.model.include_request_id);

        Self {
            config,
            router: InferenceRouter::new(dispatcher, assembler),
            ready: AtomicBool::new(false),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.config.model.name
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }
}
