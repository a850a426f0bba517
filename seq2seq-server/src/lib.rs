//! Seq2Seq Server - serves a text-to-text model over the v1 and v2 prediction protocols.

pub mod accelerator;
pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;
pub mod router;
pub mod state;
pub mod tokenizer;
pub mod transformer;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;

use std::sync::Arc;

use axum::routing::get;
use axum::{middleware, Router};
use tower_http::cors::CorsLayer;

/// Build the HTTP application for `state`.
pub fn app(state: Arc<AppState>) -> Router {
    let mut app: Router<Arc<AppState>> = Router::new()
        .merge(api::router())
        .route("/health", get(api::health::health));

    if state.config.server.enable_docs {
        app = app.route("/docs", get(api::docs::docs));
    }

    app.layer(middleware::from_fn(logging::request_logger))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
