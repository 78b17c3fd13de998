//! # Mapping Results — Match Records and Coverage
//!
//! Types produced by the matcher and the aggregator. A `MatchRecord`
//! describes how one source control maps onto the target framework; a
//! `CategorySummary` rolls records up per source category.
//!
//! ## Invariants
//!
//! - A record lists at most [`MAX_TARGETS_PER_RECORD`] targets, ordered by
//!   similarity descending, and `target_ids`, `target_requirements` and
//!   `target_scores` always have equal length.
//! - A `None` record has empty target lists and a score of `0.0`.
//! - Coverage is `100 * (full + partial) / total`, and `0.0` when
//!   `total == 0`. It is never NaN.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::control::ControlId;

/// Upper bound on targets kept per source control.
pub const MAX_TARGETS_PER_RECORD: usize = 3;

/// Placeholder for a matched record whose justification was not requested yet.
pub const PENDING_JUSTIFICATION: &str = "Not yet generated.";

/// Placeholder for a record with no qualifying target.
pub const NO_MATCH_JUSTIFICATION: &str = "No sufficiently similar control identified.";

/// Classification of a source control against the threshold bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// At least one kept target scored at or above the full threshold.
    Full,
    /// Kept targets all scored in `[partial, full)`.
    Partial,
    /// No target reached the partial threshold.
    None,
}

impl MatchType {
    /// All match types in reporting order.
    pub fn all() -> &'static [MatchType] {
        &[Self::Full, Self::Partial, Self::None]
    }

    /// Snake-case identifier, matching the serde format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Partial => "partial",
            Self::None => "none",
        }
    }

    /// Label used in exported tables and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Full => "Full Match",
            Self::Partial => "Partial Match",
            Self::None => "No Match",
        }
    }

    /// Whether this type counts toward coverage.
    pub fn is_match(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MatchType {
    type Err = String;

    /// Accepts both the snake-case identifier and the table label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "full" | "Full Match" => Ok(Self::Full),
            "partial" | "Partial Match" => Ok(Self::Partial),
            "none" | "No Match" => Ok(Self::None),
            other => Err(format!("unknown match type: {other:?}")),
        }
    }
}

/// Justification text attached to a match record.
///
/// This is the one field of a record that changes after the matcher runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum Justification {
    /// Matched, but no justification has been generated yet.
    Pending,
    /// No target qualified; nothing to justify.
    NotApplicable,
    /// Text returned by the justification generator.
    Generated(String),
    /// The generator failed; the message is shown in place of a justification.
    Failed(String),
}

impl Justification {
    /// Initial justification for a freshly matched record of the given type.
    pub fn initial(match_type: MatchType) -> Self {
        if match_type.is_match() {
            Self::Pending
        } else {
            Self::NotApplicable
        }
    }

    /// Display text, substituting placeholders for the non-text states.
    pub fn text(&self) -> &str {
        match self {
            Self::Pending => PENDING_JUSTIFICATION,
            Self::NotApplicable => NO_MATCH_JUSTIFICATION,
            Self::Generated(text) | Self::Failed(text) => text,
        }
    }
}

impl std::fmt::Display for Justification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

/// How one source control maps onto the target framework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Source control id.
    pub source_id: ControlId,
    /// Source requirement text.
    pub source_requirement: String,
    /// Kept target ids, score descending.
    pub target_ids: Vec<ControlId>,
    /// Requirement text of each kept target, aligned with `target_ids`.
    pub target_requirements: Vec<String>,
    /// Similarity of each kept target as a percentage (2 decimals).
    pub target_scores: Vec<f64>,
    /// Mean similarity of the kept targets as a percentage (2 decimals).
    pub average_score: f64,
    /// Band classification.
    pub match_type: MatchType,
    /// Justification text or placeholder.
    pub justification: Justification,
}

impl MatchRecord {
    /// A record for a source control with no qualifying target.
    pub fn unmatched(source_id: ControlId, source_requirement: impl Into<String>) -> Self {
        Self {
            source_id,
            source_requirement: source_requirement.into(),
            target_ids: Vec::new(),
            target_requirements: Vec::new(),
            target_scores: Vec::new(),
            average_score: 0.0,
            match_type: MatchType::None,
            justification: Justification::NotApplicable,
        }
    }
}

/// Count of records per match type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCounts {
    /// Full matches.
    pub full: usize,
    /// Partial matches.
    pub partial: usize,
    /// No matches.
    pub none: usize,
}

impl MatchCounts {
    /// Build counts from explicit values.
    pub fn new(full: usize, partial: usize, none: usize) -> Self {
        Self {
            full,
            partial,
            none,
        }
    }

    /// Count the match types of a record sequence.
    pub fn tally<'a>(records: impl IntoIterator<Item = &'a MatchRecord>) -> Self {
        let mut counts = Self::default();
        for record in records {
            counts.record(record.match_type);
        }
        counts
    }

    /// Add one record of the given type.
    pub fn record(&mut self, match_type: MatchType) {
        match match_type {
            MatchType::Full => self.full += 1,
            MatchType::Partial => self.partial += 1,
            MatchType::None => self.none += 1,
        }
    }

    /// Count for one match type.
    pub fn get(&self, match_type: MatchType) -> usize {
        match match_type {
            MatchType::Full => self.full,
            MatchType::Partial => self.partial,
            MatchType::None => self.none,
        }
    }

    /// Records with at least a partial match.
    pub fn matched(&self) -> usize {
        self.full + self.partial
    }

    /// All records.
    pub fn total(&self) -> usize {
        self.full + self.partial + self.none
    }

    /// `100 * (full + partial) / total`, unrounded; `0.0` for an empty tally.
    pub fn coverage_percent(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        100.0 * self.matched() as f64 / total as f64
    }
}

/// Coverage statistics for one source category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    /// Source category name.
    pub category: String,
    /// Full matches in the category.
    pub full_count: usize,
    /// Partial matches in the category.
    pub partial_count: usize,
    /// No matches in the category.
    pub none_count: usize,
    /// `full_count + partial_count + none_count`.
    pub total: usize,
    /// `100 * (full + partial) / total`, `0.0` when `total == 0`.
    pub coverage_percent: f64,
}

impl CategorySummary {
    /// Derive a summary row from a tally.
    pub fn from_counts(category: impl Into<String>, counts: MatchCounts) -> Self {
        Self {
            category: category.into(),
            full_count: counts.full,
            partial_count: counts.partial,
            none_count: counts.none,
            total: counts.total(),
            coverage_percent: counts.coverage_percent(),
        }
    }

    /// The tally this row was derived from.
    pub fn counts(&self) -> MatchCounts {
        MatchCounts::new(self.full_count, self.partial_count, self.none_count)
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
