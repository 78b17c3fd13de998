//! Loader error types.
//!
//! Read failures carry the file path where one is known. Schema failures
//! wrap [`SchemaError`] so callers can tell "fix your columns" apart from
//! "could not read the file".

use std::path::PathBuf;

use ctrlmap_core::SchemaError;
use thiserror::Error;

/// Errors that can occur while reading or loading a control file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A required file was not found.
    #[error("control file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// File extension is not a supported tabular format.
    #[error("unsupported control file format {extension:?} for {path} (expected .csv, .json, .yaml or .yml)")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// CSV parsing failed.
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing failed.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing failed.
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Records document is not a sequence of flat mappings.
    #[error("invalid records document: {0}")]
    InvalidRecords(String),

    /// Required columns are missing.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for loader operations.
pub type LoadResult<T> = Result<T, LoadError>;
