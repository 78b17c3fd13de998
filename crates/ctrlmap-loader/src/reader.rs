//! # Tabular Readers
//!
//! Parse input files into a [`RawTable`]. CSV is the primary interchange
//! format for spreadsheet exports; JSON and YAML record lists are accepted
//! for programmatic callers (the HTTP API posts JSON records).

use std::io::Read;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{LoadError, LoadResult};
use crate::table::RawTable;

/// Read CSV with a header row. Rows may have differing lengths.
pub fn read_csv<R: Read>(reader: R) -> LoadResult<RawTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::None)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        rows.push(record.iter().map(|c| Some(c.to_string())).collect());
    }
    Ok(RawTable::new(headers, rows))
}

/// Read a CSV file from disk.
pub fn read_csv_path(path: &Path) -> LoadResult<RawTable> {
    let file = open(path)?;
    read_csv(std::io::BufReader::new(file))
}

/// Read a JSON array of flat objects.
pub fn read_json_records(content: &str) -> LoadResult<RawTable> {
    let value: Value = serde_json::from_str(content)?;
    records_from_value(value)
}

/// Read a YAML sequence of flat mappings.
pub fn read_yaml_records(content: &str) -> LoadResult<RawTable> {
    let value: Value = serde_yaml::from_str(content)?;
    records_from_value(value)
}

/// Read a control file, choosing the parser from the file extension.
pub fn read_path(path: &Path) -> LoadResult<RawTable> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "csv" => read_csv_path(path),
        "json" => read_json_records(&read_to_string(path)?),
        "yaml" | "yml" => read_yaml_records(&read_to_string(path)?),
        _ => Err(LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension,
        }),
    }
}

fn records_from_value(value: Value) -> LoadResult<RawTable> {
    let Value::Array(items) = value else {
        return Err(LoadError::InvalidRecords(
            "expected a top-level sequence of records".into(),
        ));
    };
    let records = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map),
            _ => Err(LoadError::InvalidRecords(format!(
                "record {} is not a mapping",
                i + 1
            ))),
        })
        .collect::<LoadResult<Vec<Map<String, Value>>>>()?;
    RawTable::from_records(&records)
}

fn open(path: &Path) -> LoadResult<std::fs::File> {
    std::fs::File::open(path).map_err(|e| not_found_or_io(path, e))
}

fn read_to_string(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path).map_err(|e| not_found_or_io(path, e))
}

fn not_found_or_io(path: &Path, e: std::io::Error) -> LoadError {
    if e.kind() == std::io::ErrorKind::NotFound {
        LoadError::FileNotFound {
            path: path.to_path_buf(),
        }
    } else {
        LoadError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "control_id,control_category,control_subcategory,control_requirement\n\
                       S1,Access Control,Auth,Enforce MFA for privileged accounts\n\
                       S2,Logging,,Retain audit logs for one year\n";

    #[test]
    fn csv_reads_headers_and_rows() {
        let t = read_csv(CSV.as_bytes()).unwrap();
        assert_eq!(t.headers()[0], "control_id");
        assert_eq!(t.len(), 2);
        assert_eq!(t.rows()[1][2], None);
    }

    #[test]
    fn csv_strips_bom() {
        let with_bom = format!("\u{feff}{CSV}");
        let t = read_csv(with_bom.as_bytes()).unwrap();
        assert_eq!(t.headers()[0], "control_id");
    }

    #[test]
    fn csv_handles_quoted_commas() {
        let data = "control_id,control_requirement\nS1,\"Encrypt data at rest, in transit\"\n";
        let t = read_csv(data.as_bytes()).unwrap();
        assert_eq!(
            t.rows()[0][1].as_deref(),
            Some("Encrypt data at rest, in transit")
        );
    }

    #[test]
    fn json_records() {
        let t = read_json_records(
            r#"[{"control_id":"S1","control_requirement":"Enforce MFA"}]"#,
        )
        .unwrap();
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn json_rejects_non_array() {
        assert!(matches!(
            read_json_records(r#"{"control_id":"S1"}"#),
            Err(LoadError::InvalidRecords(_))
        ));
    }

    #[test]
    fn yaml_records() {
        let t = read_yaml_records(
            "- control_id: S1\n  control_requirement: Enforce MFA\n- control_id: 2\n  control_requirement: Rotate keys\n",
        )
        .unwrap();
        assert_eq!(t.len(), 2);
        let id_col = t.headers().iter().position(|h| h == "control_id").unwrap();
        assert_eq!(t.rows()[1][id_col].as_deref(), Some("2"));
    }

    #[test]
    fn read_path_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("source.CSV");
        std::fs::write(&csv_path, CSV).unwrap();
        assert_eq!(read_path(&csv_path).unwrap().len(), 2);

        let json_path = dir.path().join("target.json");
        std::fs::write(&json_path, r#"[{"control_id":"T1"}]"#).unwrap();
        assert_eq!(read_path(&json_path).unwrap().len(), 1);
    }

    #[test]
    fn read_path_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("controls.xlsx");
        std::fs::write(&path, b"PK").unwrap();
        assert!(matches!(
            read_path(&path),
            Err(LoadError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn read_path_missing_file() {
        let err = read_path(Path::new("/nonexistent/controls.csv")).unwrap_err();
        assert!(matches!(err, LoadError::FileNotFound { .. }));
    }
}
