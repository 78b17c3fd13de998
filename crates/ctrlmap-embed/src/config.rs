//! # Embedding Configuration
//!
//! Reads backend selection and Ollama connection settings from the
//! environment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `CTRLMAP_EMBEDDING_BACKEND` | `hashing` |
//! | `OLLAMA_BASE_URL` | `http://ollama:11434` |
//! | `DEV_MODE` | unset; containing `localhost` forces `http://localhost:11434` |
//! | `CTRLMAP_EMBEDDING_MODEL` | `all-minilm` |
//! | `CTRLMAP_EMBEDDING_TIMEOUT_SECS` | `30` |
//! | `CTRLMAP_HASHING_DIMENSIONS` | `384` |

use std::str::FromStr;

use ctrlmap_core::EmbeddingError;
use serde::{Deserialize, Serialize};

/// Ollama endpoint inside the compose network.
pub const DEFAULT_OLLAMA_URL: &str = "http://ollama:11434";
/// Ollama endpoint when running on the developer's machine.
pub const LOCAL_OLLAMA_URL: &str = "http://localhost:11434";
/// Default Ollama embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm";
/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Default hashing dimension, matching all-MiniLM-L6-v2.
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Which embedding backend to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local feature-hashing embedder.
    #[default]
    Hashing,
    /// Ollama `/api/embed`.
    Ollama,
}

impl BackendKind {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hashing => "hashing",
            Self::Ollama => "ollama",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = EmbeddingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hashing" => Ok(Self::Hashing),
            "ollama" => Ok(Self::Ollama),
            other => Err(EmbeddingError::Config(format!(
                "unknown embedding backend {other:?} (expected hashing or ollama)"
            ))),
        }
    }
}

/// Embedding backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Backend selection.
    pub backend: BackendKind,
    /// Ollama base URL, without trailing slash.
    pub base_url: String,
    /// Ollama model name.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Output dimension of the hashing backend.
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            dimensions: DEFAULT_DIMENSIONS,
        }
    }
}

impl EmbeddingConfig {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, EmbeddingError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, EmbeddingError> {
        let defaults = Self::default();
        let backend = match lookup("CTRLMAP_EMBEDDING_BACKEND") {
            Some(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => defaults.backend,
        };
        let timeout_secs = parse_var(&lookup, "CTRLMAP_EMBEDDING_TIMEOUT_SECS")?
            .unwrap_or(defaults.timeout_secs);
        let dimensions =
            parse_var(&lookup, "CTRLMAP_HASHING_DIMENSIONS")?.unwrap_or(defaults.dimensions);
        let model = lookup("CTRLMAP_EMBEDDING_MODEL")
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(defaults.model);

        Ok(Self {
            backend,
            base_url: ollama_base_url(lookup("OLLAMA_BASE_URL"), lookup("DEV_MODE")),
            model,
            timeout_secs,
            dimensions,
        })
    }
}

/// Resolve the Ollama base URL. `DEV_MODE` containing `localhost` wins over
/// `OLLAMA_BASE_URL`.
pub fn ollama_base_url(configured: Option<String>, dev_mode: Option<String>) -> String {
    if dev_mode.is_some_and(|m| m.contains("localhost")) {
        return LOCAL_OLLAMA_URL.to_string();
    }
    configured
        .map(|u| u.trim().trim_end_matches('/').to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string())
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, EmbeddingError> {
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| EmbeddingError::Config(format!("{key} has invalid value {raw:?}"))),
        _ => Ok(None),
    }
}
