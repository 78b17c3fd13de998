//! # ctrlmap-embed — Embedding Provider
//!
//! Converts requirement text into fixed-length vectors such that cosine
//! similarity approximates semantic relatedness.
//!
//! ## Architecture
//!
//! - [`EmbeddingBackend`] is the capability boundary. The matcher and
//!   aggregator never see which model produced a vector.
//! - [`EmbeddingCache`] memoizes vectors by [`TextDigest`](ctrlmap_core::TextDigest).
//!   It is an explicit component handed to the provider, never a global.
//! - [`EmbeddingProvider`] pairs one backend with one cache and enforces the
//!   batch contract: one vector per text, order preserved, nothing cached
//!   from a failed batch.
//!
//! ## Backends
//!
//! | Backend | Module | Network |
//! |---------|--------|---------|
//! | [`HashingEmbedder`] | `hashing.rs` | none |
//! | [`OllamaEmbedder`] | `ollama.rs` | `POST /api/embed` |
//!
//! [`build_backend`] selects one from an [`EmbeddingConfig`].

pub mod backend;
pub mod cache;
pub mod config;
pub mod hashing;
pub mod ollama;
pub mod provider;

pub use backend::EmbeddingBackend;
pub use cache::EmbeddingCache;
pub use config::{BackendKind, EmbeddingConfig};
pub use hashing::HashingEmbedder;
pub use ollama::OllamaEmbedder;
pub use provider::EmbeddingProvider;

use std::sync::Arc;

use ctrlmap_core::EmbeddingError;

/// Construct the backend named by `config`.
///
/// The Ollama backend owns a blocking HTTP client and must be built outside
/// an async context.
pub fn build_backend(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingBackend>, EmbeddingError> {
    let backend: Arc<dyn EmbeddingBackend> = match config.backend {
        BackendKind::Hashing => Arc::new(HashingEmbedder::new(config.dimensions)?),
        BackendKind::Ollama => Arc::new(OllamaEmbedder::new(config)?),
    };
    tracing::info!(
        backend = %config.backend,
        model = backend.model_id(),
        "embedding backend ready"
    );
    Ok(backend)
}
