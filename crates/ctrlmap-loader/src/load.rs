//! # Control Set Loading
//!
//! Normalizes a [`RawTable`] into a [`ControlSet`].
//!
//! ## Processing Order
//!
//! 1. Normalize column names (trim, lowercase). The first column with a
//!    given normalized name wins.
//! 2. Fail with [`SchemaError::MissingColumns`] if any of
//!    [`REQUIRED_COLUMNS`] is absent.
//! 3. Drop rows with a null `control_id` or `control_requirement`.
//! 4. Drop rows whose requirement is trivial (length <= 3).
//! 5. Deduplicate by `control_id`, keeping the first occurrence.
//!
//! Steps 3-5 drop rows silently. Null categories load as empty strings.

use ctrlmap_core::{is_substantive, Control, ControlSet, SchemaError};
use serde::Serialize;

use crate::table::RawTable;

/// Columns every control file must carry, in canonical order.
pub const REQUIRED_COLUMNS: [&str; 4] = [
    "control_id",
    "control_category",
    "control_subcategory",
    "control_requirement",
];

/// Row accounting for one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// Data rows in the input table.
    pub rows_read: usize,
    /// Rows with a null id or requirement.
    pub dropped_null: usize,
    /// Rows whose requirement was too short.
    pub dropped_short: usize,
    /// Rows whose id repeated an earlier row.
    pub dropped_duplicate: usize,
}

impl LoadStats {
    /// Total rows discarded.
    pub fn dropped(&self) -> usize {
        self.dropped_null + self.dropped_short + self.dropped_duplicate
    }
}

/// Load a control set from a raw table.
pub fn load(table: &RawTable) -> Result<ControlSet, SchemaError> {
    load_report(table).map(|(set, _)| set)
}

/// Load a control set and report how many rows each rule discarded.
pub fn load_report(table: &RawTable) -> Result<(ControlSet, LoadStats), SchemaError> {
    let columns = resolve_columns(table.headers())?;
    let [id_col, category_col, subcategory_col, requirement_col] = columns;

    let mut stats = LoadStats {
        rows_read: table.len(),
        ..LoadStats::default()
    };
    let mut set = ControlSet::new();

    for row in table.rows() {
        let (Some(id), Some(requirement)) = (&row[id_col], &row[requirement_col]) else {
            stats.dropped_null += 1;
            continue;
        };
        if !is_substantive(requirement) {
            stats.dropped_short += 1;
            continue;
        }
        let category = row[category_col].clone().unwrap_or_default();
        let subcategory = row[subcategory_col].clone().unwrap_or_default();
        let control = match Control::new(id, category, subcategory, requirement) {
            Ok(control) => control,
            Err(_) => {
                stats.dropped_null += 1;
                continue;
            }
        };
        if !set.push(control) {
            stats.dropped_duplicate += 1;
        }
    }

    if stats.dropped() > 0 {
        tracing::debug!(
            dropped_null = stats.dropped_null,
            dropped_short = stats.dropped_short,
            dropped_duplicate = stats.dropped_duplicate,
            "discarded invalid control rows"
        );
    }

    Ok((set, stats))
}

/// Map each required column to its index in the header row.
fn resolve_columns(headers: &[String]) -> Result<[usize; 4], SchemaError> {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
    let mut indices = [0usize; 4];
    let mut missing = Vec::new();
    for (slot, required) in REQUIRED_COLUMNS.iter().enumerate() {
        match normalized.iter().position(|h| h == required) {
            Some(i) => indices[slot] = i,
            None => missing.push((*required).to_string()),
        }
    }
    if missing.is_empty() {
        Ok(indices)
    } else {
        Err(SchemaError::MissingColumns { missing })
    }
}

fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}
