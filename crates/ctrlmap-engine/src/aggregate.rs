//! # Aggregator — Category Coverage
//!
//! Rolls match records up into one [`CategorySummary`] per source
//! category.
//!
//! ## Policy
//!
//! - A record is joined to its category through `source_id` in the
//!   reference set. Records whose id is absent from the reference set are
//!   skipped, as are controls with an empty category.
//! - Output is ordered by category name ascending.
//! - `coverage_percent` is 0 when a group is empty; it is never NaN.

use std::collections::BTreeMap;

use ctrlmap_core::{CategorySummary, ControlSet, MatchCounts, MatchRecord};

/// Summarize records by source category.
pub fn summarize<'a>(
    records: impl IntoIterator<Item = &'a MatchRecord>,
    reference: &ControlSet,
) -> Vec<CategorySummary> {
    let mut groups: BTreeMap<&str, MatchCounts> = BTreeMap::new();
    let mut skipped = 0usize;
    for record in records {
        match reference.find(&record.source_id) {
            Some(control) if !control.category.is_empty() => {
                groups
                    .entry(control.category.as_str())
                    .or_default()
                    .record(record.match_type);
            }
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!(skipped, "records without a reference category left out of summary");
    }
    groups
        .into_iter()
        .map(|(category, counts)| CategorySummary::from_counts(category, counts))
        .collect()
}
