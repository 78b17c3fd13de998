//! # Embedding Provider
//!
//! `embed(texts) -> vectors` with memoization. All cache misses of one call
//! go to the backend as a single deduplicated batch.
//!
//! ## Invariants
//!
//! - Output has one vector per input text, in input order.
//! - Every vector returned by one call has the same dimension.
//! - A failed call inserts nothing into the cache.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ctrlmap_core::{EmbeddingError, TextDigest};

use crate::backend::EmbeddingBackend;
use crate::cache::EmbeddingCache;

/// A backend paired with the cache its results are memoized in.
#[derive(Clone)]
pub struct EmbeddingProvider {
    backend: Arc<dyn EmbeddingBackend>,
    cache: Arc<EmbeddingCache>,
}

impl std::fmt::Debug for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingProvider")
            .field("model_id", &self.backend.model_id())
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl EmbeddingProvider {
    /// Pair a backend with a fresh private cache.
    pub fn new(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self::with_cache(backend, Arc::new(EmbeddingCache::new()))
    }

    /// Pair a backend with an existing, possibly shared, cache.
    pub fn with_cache(backend: Arc<dyn EmbeddingBackend>, cache: Arc<EmbeddingCache>) -> Self {
        Self { backend, cache }
    }

    /// Model id of the underlying backend.
    pub fn model_id(&self) -> &str {
        self.backend.model_id()
    }

    /// The cache this provider reads and fills.
    pub fn cache(&self) -> &Arc<EmbeddingCache> {
        &self.cache
    }

    /// Embed texts, reusing cached vectors.
    pub fn embed(&self, texts: &[String]) -> Result<Vec<Arc<Vec<f32>>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let model_id = self.backend.model_id();
        let keys: Vec<TextDigest> = texts
            .iter()
            .map(|t| TextDigest::compute(model_id, t))
            .collect();

        let mut resolved: HashMap<TextDigest, Arc<Vec<f32>>> = HashMap::new();
        let mut seen: HashSet<TextDigest> = HashSet::with_capacity(keys.len());
        let mut pending_keys: Vec<TextDigest> = Vec::new();
        let mut pending_texts: Vec<String> = Vec::new();
        for (key, text) in keys.iter().zip(texts) {
            if !seen.insert(*key) {
                continue;
            }
            match self.cache.get(key) {
                Some(vector) => {
                    resolved.insert(*key, vector);
                }
                None => {
                    pending_keys.push(*key);
                    pending_texts.push(text.clone());
                }
            }
        }

        tracing::debug!(
            model = model_id,
            texts = texts.len(),
            cached = resolved.len(),
            to_embed = pending_texts.len(),
            "embedding batch"
        );

        let mut fresh = Vec::with_capacity(pending_keys.len());
        if !pending_texts.is_empty() {
            let vectors = self.backend.embed_batch(&pending_texts)?;
            if vectors.len() != pending_texts.len() {
                return Err(EmbeddingError::CountMismatch {
                    expected: pending_texts.len(),
                    actual: vectors.len(),
                });
            }
            for (key, vector) in pending_keys.into_iter().zip(vectors) {
                fresh.push((key, Arc::new(vector)));
            }
        }

        check_dimensions(resolved.values().chain(fresh.iter().map(|(_, v)| v)))?;

        if !fresh.is_empty() {
            self.cache.insert_many(fresh.iter().cloned());
            resolved.extend(fresh);
        }

        keys.iter()
            .map(|key| {
                resolved.get(key).cloned().ok_or_else(|| EmbeddingError::Backend {
                    backend: model_id.to_string(),
                    reason: "vector missing after batch".into(),
                })
            })
            .collect()
    }
}

fn check_dimensions<'a>(vectors: impl Iterator<Item = &'a Arc<Vec<f32>>>) -> Result<(), EmbeddingError> {
    let mut expected: Option<usize> = None;
    for vector in vectors {
        match expected {
            None => expected = Some(vector.len()),
            Some(dim) if dim != vector.len() => {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: dim,
                    actual: vector.len(),
                });
            }
            Some(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Records every batch it receives; vector = [len, first byte].
    struct Recording {
        batches: Mutex<Vec<Vec<String>>>,
        fail: bool,
    }

    impl Recording {
        fn new() -> Arc<Self> {
            Arc::new(Self { batches: Mutex::new(Vec::new()), fail: false })
        }
    }

    impl EmbeddingBackend for Recording {
        fn model_id(&self) -> &str {
            "recording"
        }

        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.batches.lock().push(texts.to_vec());
            if self.fail {
                return Err(EmbeddingError::Backend {
                    backend: "recording".into(),
                    reason: "down".into(),
                });
            }
            Ok(texts
                .iter()
                .map(|t| vec![t.len() as f32, f32::from(t.as_bytes().first().copied().unwrap_or(0))])
                .collect())
        }
    }

    struct Fixed(Vec<Vec<f32>>);

    impl EmbeddingBackend for Fixed {
        fn model_id(&self) -> &str {
            "fixed"
        }

        fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(self.0.clone())
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn preserves_order_and_dedupes_batch() {
        let backend = Recording::new();
        let provider = EmbeddingProvider::new(backend.clone());
        let out = provider.embed(&strings(&["bb", "a", "bb"])).unwrap();
        assert_eq!(out[0].as_slice(), &[2.0, 98.0]);
        assert_eq!(out[1].as_slice(), &[1.0, 97.0]);
        assert_eq!(out[2].as_slice(), &[2.0, 98.0]);
        assert_eq!(*backend.batches.lock(), vec![strings(&["bb", "a"])]);
    }

    #[test]
    fn second_call_hits_cache() {
        let backend = Recording::new();
        let provider = EmbeddingProvider::new(backend.clone());
        provider.embed(&strings(&["x", "y"])).unwrap();
        provider.embed(&strings(&["y", "z"])).unwrap();
        let batches = backend.batches.lock();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1], strings(&["z"]));
        assert_eq!(provider.cache().len(), 3);
    }

    #[test]
    fn fully_cached_call_skips_backend() {
        let backend = Recording::new();
        let provider = EmbeddingProvider::new(backend.clone());
        provider.embed(&strings(&["x"])).unwrap();
        provider.embed(&strings(&["x", "x"])).unwrap();
        assert_eq!(backend.batches.lock().len(), 1);
    }

    #[test]
    fn shared_cache_across_providers() {
        let cache = Arc::new(EmbeddingCache::new());
        let first = Recording::new();
        let second = Recording::new();
        EmbeddingProvider::with_cache(first, cache.clone())
            .embed(&strings(&["shared"]))
            .unwrap();
        EmbeddingProvider::with_cache(second.clone(), cache)
            .embed(&strings(&["shared"]))
            .unwrap();
        assert!(second.batches.lock().is_empty());
    }

    #[test]
    fn empty_input_skips_backend() {
        let backend = Recording::new();
        let provider = EmbeddingProvider::new(backend.clone());
        assert!(provider.embed(&[]).unwrap().is_empty());
        assert!(backend.batches.lock().is_empty());
    }

    #[test]
    fn backend_failure_caches_nothing() {
        let backend = Arc::new(Recording { batches: Mutex::new(Vec::new()), fail: true });
        let provider = EmbeddingProvider::new(backend);
        assert!(provider.embed(&strings(&["x"])).is_err());
        assert!(provider.cache().is_empty());
    }

    #[test]
    fn count_mismatch_is_error() {
        let provider = EmbeddingProvider::new(Arc::new(Fixed(vec![vec![1.0]])));
        let err = provider.embed(&strings(&["a", "b"])).unwrap_err();
        assert_eq!(err, EmbeddingError::CountMismatch { expected: 2, actual: 1 });
        assert!(provider.cache().is_empty());
    }

    #[test]
    fn dimension_mismatch_is_error() {
        let provider = EmbeddingProvider::new(Arc::new(Fixed(vec![vec![1.0], vec![1.0, 2.0]])));
        let err = provider.embed(&strings(&["a", "b"])).unwrap_err();
        assert_eq!(err, EmbeddingError::DimensionMismatch { expected: 1, actual: 2 });
        assert!(provider.cache().is_empty());
    }
}
