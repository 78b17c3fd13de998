//! Justification generator error types.

/// Errors from a text-generation call.
#[derive(Debug, thiserror::Error)]
pub enum JustificationError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        /// URL that was called.
        endpoint: String,
        /// Underlying client error.
        source: reqwest::Error,
    },

    /// No response within the configured timeout.
    #[error("request to {endpoint} timed out after {timeout_secs}s")]
    Timeout {
        /// URL that was called.
        endpoint: String,
        /// Configured timeout.
        timeout_secs: u64,
    },

    /// Service answered with a non-2xx status.
    #[error("{endpoint} returned {status}: {body}")]
    Api {
        /// URL that was called.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Response body excerpt.
        body: String,
    },

    /// Response body did not decode.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        /// URL that was called.
        endpoint: String,
        /// Underlying client error.
        source: reqwest::Error,
    },

    /// Service answered with no text.
    #[error("{endpoint} returned an empty response")]
    EmptyResponse {
        /// URL that was called.
        endpoint: String,
    },

    /// Generator configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),
}
