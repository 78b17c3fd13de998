//! # Ollama Embedder — HTTP Embedding Backend
//!
//! Calls `POST {base_url}/api/embed` with `{"model", "input": [..]}` and
//! reads `{"embeddings": [[..], ..]}`.
//!
//! ## Timeout
//!
//! Every request is bounded by the configured timeout. Timeouts map to
//! [`EmbeddingError::Timeout`]; all other transport failures, non-2xx
//! responses, and undecodable bodies map to [`EmbeddingError::Backend`].
//!
//! The client is `reqwest::blocking`. Build and call it from a thread that
//! is not driving an async runtime.

use std::time::Duration;

use ctrlmap_core::EmbeddingError;
use serde::{Deserialize, Serialize};

use crate::backend::EmbeddingBackend;
use crate::config::EmbeddingConfig;

/// Longest response-body excerpt kept in an error message.
const BODY_EXCERPT_LEN: usize = 200;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Ollama `/api/embed` client.
#[derive(Debug)]
pub struct OllamaEmbedder {
    client: reqwest::blocking::Client,
    endpoint: url::Url,
    model: String,
    timeout_secs: u64,
}

impl OllamaEmbedder {
    /// Build a client from configuration.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        if config.model.trim().is_empty() {
            return Err(EmbeddingError::Config("embedding model must not be empty".into()));
        }
        let base = url::Url::parse(&format!("{}/", config.base_url.trim_end_matches('/')))
            .map_err(|e| EmbeddingError::Config(format!("invalid Ollama base URL {:?}: {e}", config.base_url)))?;
        let endpoint = base
            .join("api/embed")
            .map_err(|e| EmbeddingError::Config(format!("invalid Ollama base URL: {e}")))?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint,
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Full URL of the embed endpoint.
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    fn backend_error(&self, reason: String) -> EmbeddingError {
        EmbeddingError::Backend {
            backend: self.model.clone(),
            reason,
        }
    }
}

impl EmbeddingBackend for OllamaEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!(endpoint = %self.endpoint, texts = texts.len(), "requesting embeddings");

        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout {
                        backend: self.model.clone(),
                        timeout_secs: self.timeout_secs,
                    }
                } else {
                    self.backend_error(format!("request failed: {e}"))
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            let excerpt: String = body.chars().take(BODY_EXCERPT_LEN).collect();
            return Err(self.backend_error(format!("HTTP {status}: {excerpt}")));
        }

        let parsed: EmbedResponse = resp.json().map_err(|e| {
            if e.is_timeout() {
                EmbeddingError::Timeout {
                    backend: self.model.clone(),
                    timeout_secs: self.timeout_secs,
                }
            } else {
                self.backend_error(format!("invalid response body: {e}"))
            }
        })?;

        if parsed.embeddings.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: parsed.embeddings.len(),
            });
        }
        Ok(parsed.embeddings)
    }
}
