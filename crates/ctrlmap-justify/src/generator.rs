//! # Justification Generator
//!
//! The capability boundary for text generation, plus the recovery rule
//! that keeps generator failures out of the caller's control flow.

use ctrlmap_core::{Justification, MatchRecord, MatchType};

use crate::error::JustificationError;

/// Prefix of the inline text recorded when generation fails.
pub const ERROR_PREFIX: &str = "LLM Network Error";

/// Produces a short alignment justification and gap analysis.
///
/// Implementations are synchronous; async hosts call them from a blocking
/// thread.
pub trait JustificationGenerator: Send + Sync {
    /// Generate text for one source requirement and its matched targets.
    fn generate(
        &self,
        source_requirement: &str,
        target_requirements: &[String],
    ) -> Result<String, JustificationError>;
}

impl<T: JustificationGenerator + ?Sized> JustificationGenerator for std::sync::Arc<T> {
    fn generate(
        &self,
        source_requirement: &str,
        target_requirements: &[String],
    ) -> Result<String, JustificationError> {
        (**self).generate(source_requirement, target_requirements)
    }
}

/// Justify one record. Never fails.
///
/// No-match records keep their placeholder and make no call. Generator
/// errors become [`Justification::Failed`] carrying the error text.
pub fn justify_record(generator: &dyn JustificationGenerator, record: &MatchRecord) -> Justification {
    if record.match_type == MatchType::None {
        return Justification::NotApplicable;
    }
    match generator.generate(&record.source_requirement, &record.target_requirements) {
        Ok(text) => Justification::Generated(text),
        Err(e) => {
            tracing::warn!(
                source_id = %record.source_id,
                error = %e,
                "justification generation failed"
            );
            Justification::Failed(format!("{ERROR_PREFIX}: {e}"))
        }
    }
}
