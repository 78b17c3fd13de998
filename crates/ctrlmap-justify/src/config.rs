//! Justification generator configuration.

use serde::{Deserialize, Serialize};

use crate::error::JustificationError;

/// Ollama endpoint inside the compose network.
pub const DEFAULT_OLLAMA_URL: &str = "http://ollama:11434";
/// Ollama endpoint on the developer's machine.
pub const LOCAL_OLLAMA_URL: &str = "http://localhost:11434";
/// Default generation model.
pub const DEFAULT_MODEL: &str = "mistral";
/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the text-generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Base URL, without trailing slash.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl GeneratorConfig {
    /// Create a configuration with default model and timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load from environment variables.
    ///
    /// `OLLAMA_BASE_URL`, `DEV_MODE` (containing `localhost` forces
    /// `http://localhost:11434`), `CTRLMAP_JUSTIFICATION_MODEL`,
    /// `CTRLMAP_JUSTIFICATION_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, JustificationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, JustificationError> {
        let defaults = Self::default();
        let base_url = if lookup("DEV_MODE").is_some_and(|m| m.contains("localhost")) {
            LOCAL_OLLAMA_URL.to_string()
        } else {
            lookup("OLLAMA_BASE_URL")
                .map(|u| u.trim().trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty())
                .unwrap_or(defaults.base_url)
        };
        let model = lookup("CTRLMAP_JUSTIFICATION_MODEL")
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(defaults.model);
        let timeout_secs = match lookup("CTRLMAP_JUSTIFICATION_TIMEOUT_SECS") {
            Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|_| {
                JustificationError::Config(format!(
                    "CTRLMAP_JUSTIFICATION_TIMEOUT_SECS has invalid value {raw:?}"
                ))
            })?,
            _ => defaults.timeout_secs,
        };
        Ok(Self {
            base_url,
            model,
            timeout_secs,
        })
    }
}
