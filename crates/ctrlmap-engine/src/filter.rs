//! # Record Filtering
//!
//! Narrows a record list to selected source categories and a search term,
//! the way a reviewer drills into one part of the mapping. Coverage and
//! category summaries are then recomputed over the filtered records.

use std::collections::BTreeSet;

use ctrlmap_core::{ControlSet, MatchRecord};
use serde::{Deserialize, Serialize};

/// Category selection plus case-insensitive search in the source requirement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Source categories to keep. `None` keeps every category; an empty set
    /// keeps nothing.
    #[serde(default)]
    pub categories: Option<BTreeSet<String>>,
    /// Substring that must appear in the source requirement.
    #[serde(default)]
    pub search: Option<String>,
}

impl RecordFilter {
    /// A filter that keeps everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to the given categories.
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    /// Require a search term. Blank terms are ignored.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = if search.trim().is_empty() {
            None
        } else {
            Some(search)
        };
        self
    }

    /// Whether this filter keeps every record.
    pub fn is_unrestricted(&self) -> bool {
        self.categories.is_none() && self.search.is_none()
    }

    /// Whether `record` passes. The category comes from `reference`; a
    /// record missing from it fails any category restriction.
    pub fn matches(&self, record: &MatchRecord, reference: &ControlSet) -> bool {
        if let Some(categories) = &self.categories {
            let in_category = reference
                .find(&record.source_id)
                .is_some_and(|c| categories.contains(&c.category));
            if !in_category {
                return false;
            }
        }
        match &self.search {
            Some(term) => record
                .source_requirement
                .to_lowercase()
                .contains(&term.trim().to_lowercase()),
            None => true,
        }
    }

    /// Records passing the filter, in their original order.
    pub fn apply<'a>(&self, records: &'a [MatchRecord], reference: &ControlSet) -> Vec<&'a MatchRecord> {
        records
            .iter()
            .filter(|r| self.matches(r, reference))
            .collect()
    }
}
