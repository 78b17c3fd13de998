//! # CLI Configuration File
//!
//! Optional YAML passed with `--config`:
//!
//! ```yaml
//! thresholds:
//!   full: 0.85
//!   partial: 0.65
//! embedding:
//!   backend: ollama
//!   model: all-minilm
//! justification:
//!   model: mistral
//!   timeout_secs: 30
//! ```
//!
//! Every key is optional. Precedence: command-line flag, then this file,
//! then environment variables, then built-in defaults.

use std::path::Path;

use anyhow::{Context, Result};
use ctrlmap_core::Thresholds;
use ctrlmap_embed::{BackendKind, EmbeddingConfig};
use ctrlmap_justify::GeneratorConfig;
use serde::Deserialize;

/// Parsed `--config` file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CtrlmapConfig {
    pub thresholds: ThresholdSection,
    pub embedding: EmbeddingSection,
    pub justification: JustificationSection,
}

/// `thresholds:` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThresholdSection {
    pub full: Option<f32>,
    pub partial: Option<f32>,
}

/// `embedding:` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbeddingSection {
    pub backend: Option<BackendKind>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub dimensions: Option<usize>,
}

/// `justification:` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JustificationSection {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl CtrlmapConfig {
    /// Read a config file, or return the empty config when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file: {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config file: {}", path.display()))
    }

    /// Parse YAML text.
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Resolve thresholds: flags over file over defaults.
    pub fn thresholds(&self, full: Option<f32>, partial: Option<f32>) -> Result<Thresholds> {
        let defaults = Thresholds::default();
        let full = full.or(self.thresholds.full).unwrap_or(defaults.full());
        let partial = partial
            .or(self.thresholds.partial)
            .unwrap_or(defaults.partial());
        Thresholds::new(full, partial).context("invalid thresholds")
    }

    /// Overlay the file's embedding section on an environment-derived config.
    pub fn embedding(&self, mut base: EmbeddingConfig) -> EmbeddingConfig {
        let s = &self.embedding;
        if let Some(backend) = s.backend {
            base.backend = backend;
        }
        if let Some(url) = &s.base_url {
            base.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = &s.model {
            base.model = model.clone();
        }
        if let Some(t) = s.timeout_secs {
            base.timeout_secs = t;
        }
        if let Some(d) = s.dimensions {
            base.dimensions = d;
        }
        base
    }

    /// Overlay the file's justification section on an environment-derived config.
    pub fn generator(&self, mut base: GeneratorConfig) -> GeneratorConfig {
        let s = &self.justification;
        if let Some(url) = &s.base_url {
            base.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = &s.model {
            base.model = model.clone();
        }
        if let Some(t) = s.timeout_secs {
            base.timeout_secs = t;
        }
        base
    }
}
