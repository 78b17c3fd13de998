//! Embedding backend capability.

use ctrlmap_core::EmbeddingError;

/// A model that turns text into vectors.
///
/// Implementations must be deterministic for a fixed model and input, and
/// must return exactly one vector per input text in input order. They are
/// synchronous; async hosts call them from a blocking thread.
pub trait EmbeddingBackend: Send + Sync {
    /// Stable identifier of the model. Part of every cache key, so two
    /// backends that could disagree on a vector must not share an id.
    fn model_id(&self) -> &str;

    /// Embed a batch of texts.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

impl<T: EmbeddingBackend + ?Sized> EmbeddingBackend for std::sync::Arc<T> {
    fn model_id(&self) -> &str {
        (**self).model_id()
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        (**self).embed_batch(texts)
    }
}
