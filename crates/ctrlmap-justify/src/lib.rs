//! # ctrlmap-justify — Justification Generator
//!
//! Explains, in a sentence or two, why a source control aligns with its
//! matched targets and where the gaps are.
//!
//! - [`JustificationGenerator`] is the pluggable capability.
//! - [`build_prompt`] renders the fixed instruction template.
//! - [`OllamaGenerator`] is the HTTP implementation.
//! - [`justify_record`] applies a generator to one match record and never
//!   returns an error: failures are recorded as inline text so one bad
//!   call cannot disturb the rest of an analysis.

pub mod config;
pub mod error;
pub mod generator;
pub mod ollama;
pub mod prompt;

pub use config::GeneratorConfig;
pub use error::JustificationError;
pub use generator::{justify_record, JustificationGenerator, ERROR_PREFIX};
pub use ollama::OllamaGenerator;
pub use prompt::build_prompt;
