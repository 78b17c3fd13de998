//! # ctrlmap-loader — Control Loader
//!
//! Turns an input file into a canonical [`ControlSet`](ctrlmap_core::ControlSet)
//! in two steps:
//!
//! 1. **Read** (`reader.rs`): parse CSV, JSON, or YAML into a [`RawTable`]
//!    of optional string cells. Readers know nothing about controls.
//! 2. **Load** (`load.rs`): normalize column names, check the required
//!    columns, discard null and trivial rows, and deduplicate ids.
//!
//! Rows failing validation are dropped silently; only a missing required
//! column is an error.

pub mod error;
pub mod load;
pub mod reader;
pub mod table;

pub use error::{LoadError, LoadResult};
pub use load::{load, load_report, LoadStats, REQUIRED_COLUMNS};
pub use reader::{read_csv, read_csv_path, read_json_records, read_path, read_yaml_records};
pub use table::RawTable;

use std::path::Path;

use ctrlmap_core::ControlSet;

/// Read and load a control file in one call.
pub fn load_path(path: &Path) -> LoadResult<ControlSet> {
    let table = read_path(path)?;
    let (set, stats) = load_report(&table)?;
    tracing::info!(
        path = %path.display(),
        rows = stats.rows_read,
        controls = set.len(),
        dropped = stats.dropped(),
        "loaded control file"
    );
    Ok(set)
}
