//! Seq2Seq Server - serves anonymization, translation and summarization.

use std::env;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use seq2seq_server::{accelerator, app, model, AppState, Config};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    println!("seq2seq-server {}", VERSION);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle --version / -V
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        print_version();
        return Ok(());
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load().map_err(|e| {
        format!(
            "Failed to load configuration: {}. \
             Check config.toml and SEQ2SEQ__SECTION__KEY environment variables.",
            e
        )
    })?;

    let mut runtime = tokio::runtime::Builder::new_multi_thread();
    if let Some(workers) = config.server.workers {
        runtime.worker_threads(workers);
    }
    runtime.enable_all().build()?.block_on(serve(config))
}

async fn serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Starting seq2seq-server: model {} from {}",
        config.model.name,
        config.model.path
    );

    let accelerator = accelerator::select(config.accelerator.device).await;

    // A model that fails to load is fatal: the server never becomes ready.
    let transformer = model::load(&config, accelerator).await.map_err(|e| {
        tracing::error!("Failed loading model: {}", e);
        e
    })?;

    let state = Arc::new(AppState::new(config.clone(), Arc::new(transformer)));
    state.set_ready(true);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
