//! # Text Digest — Content-Addressed Cache Keys
//!
//! `TextDigest` names an embedding by the exact bytes that produced it:
//! the model identifier and the requirement text. Two callers share a
//! cached vector only when both components are byte-identical, so sessions
//! never observe each other's results for different input and no cache
//! invalidation is needed.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// SHA-256 digest over `model_id || 0x00 || text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextDigest([u8; 32]);

impl TextDigest {
    /// Digest a text under the given model identifier.
    ///
    /// The NUL separator keeps `("ab", "c")` and `("a", "bc")` apart.
    pub fn compute(model_id: &str, text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(model_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(text.as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hasher.finalize());
        Self(bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for TextDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}
