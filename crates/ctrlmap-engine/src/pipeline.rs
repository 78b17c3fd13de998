//! # Mapping Pipeline
//!
//! Runs similarity → matcher → aggregator for one (source, target) pair and
//! packages the derived artifacts as an [`Analysis`].
//!
//! ## Lifecycle
//!
//! An `Analysis` is immutable except for record justifications, which are
//! replaced one record at a time through [`Analysis::set_justification`].
//! Counts, coverage, and category summaries do not depend on justification
//! text, so they never need recomputing after an update.

use ctrlmap_core::{
    round2, CategorySummary, ControlId, ControlSet, CtrlmapError, Justification, MatchCounts,
    MatchRecord, Thresholds,
};
use ctrlmap_embed::EmbeddingProvider;
use serde::{Deserialize, Serialize};

use crate::aggregate::summarize;
use crate::filter::RecordFilter;
use crate::matcher::match_controls;
use crate::similarity::SimilarityMatrix;

/// Owns an embedding provider and runs analyses with it.
#[derive(Debug, Clone)]
pub struct MappingEngine {
    provider: EmbeddingProvider,
}

impl MappingEngine {
    /// Create an engine around a provider.
    pub fn new(provider: EmbeddingProvider) -> Self {
        Self { provider }
    }

    /// The embedding provider in use.
    pub fn provider(&self) -> &EmbeddingProvider {
        &self.provider
    }

    /// Compute the similarity matrix for two sets.
    pub fn similarity(
        &self,
        source: &ControlSet,
        target: &ControlSet,
    ) -> Result<SimilarityMatrix, CtrlmapError> {
        Ok(SimilarityMatrix::compute(&self.provider, source, target)?)
    }

    /// Run a full analysis. Takes ownership of both sets; the analysis is
    /// the run that owns them from here on.
    pub fn analyze(
        &self,
        source: ControlSet,
        target: ControlSet,
        thresholds: Thresholds,
    ) -> Result<Analysis, CtrlmapError> {
        tracing::info!(
            sources = source.len(),
            targets = target.len(),
            model = self.provider.model_id(),
            full = thresholds.full(),
            partial = thresholds.partial(),
            "starting analysis"
        );
        let matrix = self.similarity(&source, &target)?;
        let outcome = match_controls(&source, &target, &matrix, thresholds)?;
        let categories = summarize(&outcome.records, &source);

        Ok(Analysis {
            model_id: self.provider.model_id().to_string(),
            thresholds,
            source,
            target,
            records: outcome.records,
            counts: outcome.counts,
            coverage_percent: outcome.coverage_percent,
            categories,
        })
    }
}

/// Headline numbers for an analysis or a filtered view of one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOverview {
    /// Source controls considered.
    pub total_controls: usize,
    /// Full matches.
    pub full_matches: usize,
    /// Partial matches.
    pub partial_matches: usize,
    /// Source controls without a match.
    pub no_matches: usize,
    /// Share of controls with at least a partial match, 2 decimals.
    pub coverage_percent: f64,
}

impl AnalysisOverview {
    /// Derive from a tally.
    pub fn from_counts(counts: MatchCounts) -> Self {
        Self {
            total_controls: counts.total(),
            full_matches: counts.full,
            partial_matches: counts.partial,
            no_matches: counts.none,
            coverage_percent: round2(counts.coverage_percent()),
        }
    }
}

/// Records, counts, and summaries restricted by a [`RecordFilter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisView {
    /// Records passing the filter, in source order.
    pub records: Vec<MatchRecord>,
    /// Totals over the filtered records.
    pub overview: AnalysisOverview,
    /// Category summary over the filtered records.
    pub categories: Vec<CategorySummary>,
}

/// Everything derived from one (source, target) pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    model_id: String,
    thresholds: Thresholds,
    source: ControlSet,
    target: ControlSet,
    records: Vec<MatchRecord>,
    counts: MatchCounts,
    coverage_percent: f64,
    categories: Vec<CategorySummary>,
}

impl Analysis {
    /// Model that produced the embeddings.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Thresholds the matcher ran with.
    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Source controls.
    pub fn source(&self) -> &ControlSet {
        &self.source
    }

    /// Target controls.
    pub fn target(&self) -> &ControlSet {
        &self.target
    }

    /// One record per source control, in source order.
    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    /// Record for one source control.
    pub fn record(&self, source_id: &str) -> Option<&MatchRecord> {
        self.records.iter().find(|r| r.source_id.as_str() == source_id)
    }

    /// Records per match type.
    pub fn counts(&self) -> MatchCounts {
        self.counts
    }

    /// Overall coverage, 2 decimals.
    pub fn coverage_percent(&self) -> f64 {
        self.coverage_percent
    }

    /// Per-category coverage, category ascending.
    pub fn categories(&self) -> &[CategorySummary] {
        &self.categories
    }

    /// Headline totals.
    pub fn overview(&self) -> AnalysisOverview {
        AnalysisOverview::from_counts(self.counts)
    }

    /// Distinct non-empty source categories, first-seen order.
    pub fn source_categories(&self) -> Vec<String> {
        self.source.categories()
    }

    /// Recompute counts and summaries over a filtered subset.
    pub fn view(&self, filter: &RecordFilter) -> AnalysisView {
        let records: Vec<MatchRecord> = filter
            .apply(&self.records, &self.source)
            .into_iter()
            .cloned()
            .collect();
        let counts = MatchCounts::tally(&records);
        let categories = summarize(&records, &self.source);
        AnalysisView {
            records,
            overview: AnalysisOverview::from_counts(counts),
            categories,
        }
    }

    /// Replace the justification of one record. Last write wins.
    pub fn set_justification(
        &mut self,
        source_id: &ControlId,
        justification: Justification,
    ) -> Result<&MatchRecord, CtrlmapError> {
        let record = self
            .records
            .iter_mut()
            .find(|r| &r.source_id == source_id)
            .ok_or_else(|| CtrlmapError::UnknownControl(source_id.to_string()))?;
        record.justification = justification;
        Ok(record)
    }
}
