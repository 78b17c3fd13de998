//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types used throughout ctrlmap. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Schema errors name every missing column so the user can fix the file
//!   in one pass.
//! - Embedding errors are fatal to the current analysis run only. No partial
//!   similarity matrix is ever produced from a failed batch.
//! - Degenerate inputs (empty control sets, zero-magnitude vectors) are not
//!   errors; they produce defined zero results.

use thiserror::Error;

/// Top-level error type for ctrlmap.
#[derive(Error, Debug)]
pub enum CtrlmapError {
    /// Input table does not carry the required columns.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Embedding backend failure.
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Threshold configuration rejected.
    #[error("threshold error: {0}")]
    Threshold(#[from] ThresholdError),

    /// A similarity matrix was paired with control sets of another shape.
    #[error("similarity matrix is {rows}x{cols} but control sets are {sources}x{targets}")]
    MatrixShape {
        /// Matrix row count.
        rows: usize,
        /// Matrix column count.
        cols: usize,
        /// Number of source controls.
        sources: usize,
        /// Number of target controls.
        targets: usize,
    },

    /// No match record exists for the given source control id.
    #[error("no match record for source control {0:?}")]
    UnknownControl(String),
}

/// Input table failed structural validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// One or more required columns are absent after name normalization.
    #[error("missing required columns: {} (expected control_id, control_category, control_subcategory, control_requirement)", .missing.join(", "))]
    MissingColumns {
        /// Normalized names of the absent columns, in canonical order.
        missing: Vec<String>,
    },

    /// A single control failed construction.
    #[error("invalid control: {0}")]
    InvalidControl(String),
}

/// Embedding backend failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    /// Backend reported a failure (transport error, non-2xx status, bad payload).
    #[error("embedding backend {backend} failed: {reason}")]
    Backend {
        /// Backend identifier (model id).
        backend: String,
        /// Diagnostic detail.
        reason: String,
    },

    /// Backend did not answer within the configured timeout.
    #[error("embedding backend {backend} timed out after {timeout_secs}s")]
    Timeout {
        /// Backend identifier (model id).
        backend: String,
        /// Configured request timeout.
        timeout_secs: u64,
    },

    /// Backend returned a different number of vectors than texts submitted.
    #[error("embedding backend returned {actual} vectors for {expected} texts")]
    CountMismatch {
        /// Number of texts submitted.
        expected: usize,
        /// Number of vectors returned.
        actual: usize,
    },

    /// Vectors of different dimensions cannot be compared.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension established by the first vector.
        expected: usize,
        /// Offending dimension.
        actual: usize,
    },

    /// Backend configuration is unusable.
    #[error("embedding configuration error: {0}")]
    Config(String),
}

/// Threshold pair rejected at construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ThresholdError {
    /// A threshold is NaN, infinite, or outside `[0, 1]`.
    #[error("{name} threshold {value} must be within [0, 1]")]
    OutOfRange {
        /// Which threshold (`full` or `partial`).
        name: &'static str,
        /// The rejected value.
        value: f32,
    },

    /// The partial threshold exceeds the full threshold.
    #[error("partial threshold {partial} must not exceed full threshold {full}")]
    Inverted {
        /// Requested full threshold.
        full: f32,
        /// Requested partial threshold.
        partial: f32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_message_lists_every_column() {
        let err = SchemaError::MissingColumns {
            missing: vec!["control_id".into(), "control_requirement".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("control_id, control_requirement"), "got: {msg}");
    }

    #[test]
    fn schema_error_converts_to_top_level() {
        let err: CtrlmapError = SchemaError::InvalidControl("x".into()).into();
        assert!(matches!(err, CtrlmapError::Schema(_)));
        assert!(err.to_string().starts_with("schema error"));
    }

    #[test]
    fn embedding_error_converts_to_top_level() {
        let err: CtrlmapError = EmbeddingError::CountMismatch {
            expected: 3,
            actual: 2,
        }
        .into();
        assert!(matches!(err, CtrlmapError::Embedding(_)));
        assert!(err.to_string().contains("2 vectors for 3 texts"));
    }

    #[test]
    fn matrix_shape_message() {
        let err = CtrlmapError::MatrixShape {
            rows: 2,
            cols: 3,
            sources: 4,
            targets: 3,
        };
        assert_eq!(
            err.to_string(),
            "similarity matrix is 2x3 but control sets are 4x3"
        );
    }

    #[test]
    fn threshold_inverted_message() {
        let err = ThresholdError::Inverted {
            full: 0.5,
            partial: 0.7,
        };
        assert!(err.to_string().contains("0.7"));
        assert!(err.to_string().contains("0.5"));
    }
}
