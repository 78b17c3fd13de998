//! # Ollama Generator — HTTP Text-Generation Client
//!
//! `POST {base_url}/api/generate` with `{"model", "prompt", "stream": false}`;
//! the reply's `response` field, trimmed, is the justification.
//!
//! Requests are bounded by the configured timeout. The client is
//! `reqwest::blocking`; build and call it off the async runtime.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::GeneratorConfig;
use crate::error::JustificationError;
use crate::generator::JustificationGenerator;
use crate::prompt::build_prompt;

const BODY_EXCERPT_LEN: usize = 200;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Ollama `/api/generate` client.
#[derive(Debug)]
pub struct OllamaGenerator {
    client: reqwest::blocking::Client,
    endpoint: url::Url,
    model: String,
    timeout_secs: u64,
}

impl OllamaGenerator {
    /// Build a client from configuration.
    pub fn new(config: &GeneratorConfig) -> Result<Self, JustificationError> {
        if config.model.trim().is_empty() {
            return Err(JustificationError::Config("generation model must not be empty".into()));
        }
        let endpoint = url::Url::parse(&format!("{}/", config.base_url.trim_end_matches('/')))
            .and_then(|base| base.join("api/generate"))
            .map_err(|e| {
                JustificationError::Config(format!("invalid base URL {:?}: {e}", config.base_url))
            })?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| JustificationError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint,
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Full URL of the generate endpoint.
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Send a raw prompt.
    pub fn complete(&self, prompt: &str) -> Result<String, JustificationError> {
        let endpoint = self.endpoint.to_string();
        tracing::debug!(endpoint = %endpoint, model = %self.model, "sending prompt");

        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(JustificationError::Api {
                endpoint,
                status: status.as_u16(),
                body: body.chars().take(BODY_EXCERPT_LEN).collect(),
            });
        }

        let parsed: GenerateResponse = resp.json().map_err(|e| {
            if e.is_timeout() {
                self.transport_error(e)
            } else {
                JustificationError::Deserialization {
                    endpoint: endpoint.clone(),
                    source: e,
                }
            }
        })?;

        let text = parsed.response.trim();
        if text.is_empty() {
            return Err(JustificationError::EmptyResponse { endpoint });
        }
        Ok(text.to_string())
    }

    fn transport_error(&self, e: reqwest::Error) -> JustificationError {
        if e.is_timeout() {
            JustificationError::Timeout {
                endpoint: self.endpoint.to_string(),
                timeout_secs: self.timeout_secs,
            }
        } else {
            JustificationError::Http {
                endpoint: self.endpoint.to_string(),
                source: e,
            }
        }
    }
}

impl JustificationGenerator for OllamaGenerator {
    fn generate(
        &self,
        source_requirement: &str,
        target_requirements: &[String],
    ) -> Result<String, JustificationError> {
        self.complete(&build_prompt(source_requirement, target_requirements))
    }
}
