//! # ctrlmap-report — Mapping Table and Coverage Report
//!
//! - `table.rs`: the seven-column mapping export (CSV or JSON).
//! - `report.rs`: the coverage report document (Markdown or JSON).

pub mod error;
pub mod report;
pub mod table;

pub use error::ReportError;
pub use report::{report_file_stem, CoverageReport, REPORT_TITLE};
pub use table::{mapping_rows, write_mapping_csv, write_mapping_json, MappingRow, COLUMNS, NO_TARGET};
