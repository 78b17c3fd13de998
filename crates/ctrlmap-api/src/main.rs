//! # ctrlmap-api — Binary Entry Point
//!
//! Builds the embedding backend and justification generator from the
//! environment, then starts the Axum server. Both HTTP collaborators use
//! blocking clients, so they are constructed before the Tokio runtime starts.

use std::sync::Arc;

use ctrlmap_api::state::{AppConfig, AppState};
use ctrlmap_embed::{build_backend, EmbeddingConfig, EmbeddingProvider};
use ctrlmap_engine::MappingEngine;
use ctrlmap_justify::{GeneratorConfig, JustificationGenerator, OllamaGenerator};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();

    let embedding = EmbeddingConfig::from_env().map_err(|e| {
        tracing::error!("Embedding configuration failed: {e}");
        e
    })?;
    let backend = build_backend(&embedding)?;
    tracing::info!(backend = %embedding.backend, model = backend.model_id(), "embedding backend configured");
    let engine = MappingEngine::new(EmbeddingProvider::new(backend));

    let generator: Option<Arc<dyn JustificationGenerator>> = if config.justification_enabled {
        let settings = GeneratorConfig::from_env()?;
        tracing::info!(model = %settings.model, "justification generator configured");
        Some(Arc::new(OllamaGenerator::new(&settings)?))
    } else {
        tracing::warn!("Justification generator disabled. Justification endpoint will return 503.");
        None
    };

    let port = config.port;
    let state = AppState::with_config(config, engine, generator);
    let app = ctrlmap_api::app(state);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async move {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
        tracing::info!("ctrlmap API listening on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
