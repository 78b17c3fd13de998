//! # Matcher — Dual-Threshold Classification
//!
//! Bands each source control against the target set using the similarity
//! matrix and a validated [`Thresholds`] pair.
//!
//! ## Algorithm (per source row `i`)
//!
//! 1. Candidates are all targets `j` with `matrix[i][j] >= partial`.
//! 2. No candidate: record type `None`, no targets, score `0.0`.
//! 3. Otherwise sort candidates by score descending (stable, so ties keep
//!    target order) and keep the first [`MAX_TARGETS_PER_RECORD`]. The
//!    record score is the mean of the kept scores as a percentage, rounded
//!    to 2 decimals. The type is `Full` if any kept score is `>= full`,
//!    else `Partial`.
//!
//! ## Invariants
//!
//! - One record per source control, in source order.
//! - Both boundaries are inclusive. Comparisons run in `f32`, the matrix
//!   domain, so a score equal to a threshold always clears it.
//! - `coverage_percent` is 0 for an empty source set.

use std::cmp::Ordering;

use ctrlmap_core::{
    round2, Control, ControlSet, CtrlmapError, Justification, MatchCounts, MatchRecord, MatchType,
    Thresholds, MAX_TARGETS_PER_RECORD,
};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::similarity::SimilarityMatrix;

/// Result of one matcher run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// One record per source control, in source order.
    pub records: Vec<MatchRecord>,
    /// `100 * (full + partial) / |source|`, 2 decimals.
    pub coverage_percent: f64,
    /// Records per match type.
    pub counts: MatchCounts,
}

/// Classify every source control.
pub fn match_controls(
    source: &ControlSet,
    target: &ControlSet,
    matrix: &SimilarityMatrix,
    thresholds: Thresholds,
) -> Result<MatchOutcome, CtrlmapError> {
    if matrix.rows() != source.len() || matrix.cols() != target.len() {
        return Err(CtrlmapError::MatrixShape {
            rows: matrix.rows(),
            cols: matrix.cols(),
            sources: source.len(),
            targets: target.len(),
        });
    }

    let records: Vec<MatchRecord> = source
        .iter()
        .enumerate()
        .map(|(i, control)| match_row(control, target, matrix.row(i), thresholds))
        .collect();
    let counts = MatchCounts::tally(&records);
    let coverage_percent = round2(counts.coverage_percent());

    tracing::info!(
        sources = source.len(),
        targets = target.len(),
        full = counts.full,
        partial = counts.partial,
        none = counts.none,
        coverage = coverage_percent,
        "matched controls"
    );

    Ok(MatchOutcome {
        records,
        coverage_percent,
        counts,
    })
}

/// Classify one source control given its similarity row.
///
/// `scores` must have one entry per control in `target`.
pub fn match_row(
    control: &Control,
    target: &ControlSet,
    scores: ArrayView1<'_, f32>,
    thresholds: Thresholds,
) -> MatchRecord {
    let mut candidates: Vec<(usize, f32)> = scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, score)| *score >= thresholds.partial())
        .collect();

    if candidates.is_empty() {
        return MatchRecord::unmatched(control.id.clone(), control.requirement.clone());
    }

    // `sort_by` is stable: equal scores keep target order.
    candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    candidates.truncate(MAX_TARGETS_PER_RECORD);

    let match_type = if candidates.iter().any(|(_, s)| *s >= thresholds.full()) {
        MatchType::Full
    } else {
        MatchType::Partial
    };

    let mut target_ids = Vec::with_capacity(candidates.len());
    let mut target_requirements = Vec::with_capacity(candidates.len());
    let mut target_scores = Vec::with_capacity(candidates.len());
    let mut sum = 0.0f64;
    for (j, score) in &candidates {
        let score = f64::from(*score);
        sum += score;
        target_scores.push(round2(score * 100.0));
        if let Some(t) = target.get(*j) {
            target_ids.push(t.id.clone());
            target_requirements.push(t.requirement.clone());
        }
    }
    let average_score = round2(sum / candidates.len() as f64 * 100.0);

    MatchRecord {
        source_id: control.id.clone(),
        source_requirement: control.requirement.clone(),
        target_ids,
        target_requirements,
        target_scores,
        average_score,
        match_type,
        justification: Justification::initial(match_type),
    }
}
