//! Report output errors.

/// Failure writing a table or report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// CSV encoding or write failure.
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding failure.
    #[error("JSON write failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Underlying writer failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
