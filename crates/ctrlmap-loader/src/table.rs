//! # Raw Tables
//!
//! A `RawTable` is the format-neutral result of reading an input file: a
//! header row and data rows of optional string cells. A cell that is empty
//! after trimming is `None`, the same way a blank spreadsheet cell reads
//! as null.

use serde_json::{Map, Value};

use crate::error::{LoadError, LoadResult};

/// Header row plus rows of nullable cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    /// Build a table, padding short rows with nulls and normalizing blank
    /// cells to `None`. Cells beyond the header width are discarded.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|row| {
                let mut row: Vec<Option<String>> =
                    row.into_iter().take(width).map(normalize_cell).collect();
                row.resize(width, None);
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Build a table from string rows, treating blank strings as null.
    pub fn from_strings<H, R, C>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let headers = headers.into_iter().map(Into::into).collect();
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|c| Some(c.into())).collect())
            .collect();
        Self::new(headers, rows)
    }

    /// Build a table from a sequence of flat JSON objects.
    ///
    /// Headers are the union of keys in first-seen order. Strings are kept,
    /// numbers and booleans are rendered as text, `null` is a null cell.
    /// Nested arrays or objects are rejected.
    pub fn from_records(records: &[Map<String, Value>]) -> LoadResult<Self> {
        let mut headers: Vec<String> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !headers.iter().any(|h| h == key) {
                    headers.push(key.clone());
                }
            }
        }
        let mut rows = Vec::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            let mut row = Vec::with_capacity(headers.len());
            for header in &headers {
                let cell = match record.get(header) {
                    None | Some(Value::Null) => None,
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(Value::Number(n)) => Some(n.to_string()),
                    Some(Value::Bool(b)) => Some(b.to_string()),
                    Some(Value::Array(_)) | Some(Value::Object(_)) => {
                        return Err(LoadError::InvalidRecords(format!(
                            "record {} field {header:?} is not a scalar",
                            i + 1
                        )))
                    }
                };
                row.push(cell);
            }
            rows.push(row);
        }
        Ok(Self::new(headers, rows))
    }

    /// Header names as read.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows.
    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn normalize_cell(cell: Option<String>) -> Option<String> {
    cell.filter(|c| !c.trim().is_empty())
}
