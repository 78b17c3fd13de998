//! # Mapping Table
//!
//! One row per match record with the seven export columns. Multi-target
//! cells are joined into a single string; no-match rows show `—`.

use std::io::Write;

use ctrlmap_core::MatchRecord;
use serde::{Deserialize, Serialize};

use crate::error::ReportError;

/// Placeholder for empty target cells.
pub const NO_TARGET: &str = "—";

/// Export row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRow {
    #[serde(rename = "Source - Control ID")]
    pub source_id: String,
    #[serde(rename = "Source - Requirement")]
    pub source_requirement: String,
    #[serde(rename = "Target - Control ID(s)")]
    pub target_ids: String,
    #[serde(rename = "Target - Requirement(s)")]
    pub target_requirements: String,
    #[serde(rename = "Similarity Score")]
    pub similarity_score: f64,
    #[serde(rename = "Match Type")]
    pub match_type: String,
    #[serde(rename = "Justification")]
    pub justification: String,
}

impl From<&MatchRecord> for MappingRow {
    fn from(r: &MatchRecord) -> Self {
        let target_ids = if r.target_ids.is_empty() {
            NO_TARGET.to_string()
        } else {
            r.target_ids
                .iter()
                .map(|id| id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let target_requirements = if r.target_requirements.is_empty() {
            NO_TARGET.to_string()
        } else {
            r.target_requirements.join("; ")
        };
        Self {
            source_id: r.source_id.to_string(),
            source_requirement: r.source_requirement.clone(),
            target_ids,
            target_requirements,
            similarity_score: r.average_score,
            match_type: r.match_type.label().to_string(),
            justification: r.justification.text().to_string(),
        }
    }
}

/// Convert records to export rows, preserving order.
pub fn mapping_rows<'a>(records: impl IntoIterator<Item = &'a MatchRecord>) -> Vec<MappingRow> {
    records.into_iter().map(MappingRow::from).collect()
}

/// Write rows as CSV with a header line.
pub fn write_mapping_csv<W: Write>(writer: W, rows: &[MappingRow]) -> Result<(), ReportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        wtr.write_record(COLUMNS)?;
    }
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write rows as a pretty-printed JSON array.
pub fn write_mapping_json<W: Write>(mut writer: W, rows: &[MappingRow]) -> Result<(), ReportError> {
    serde_json::to_writer_pretty(&mut writer, rows)?;
    writer.flush()?;
    Ok(())
}

/// Export column headers in order.
pub const COLUMNS: [&str; 7] = [
    "Source - Control ID",
    "Source - Requirement",
    "Target - Control ID(s)",
    "Target - Requirement(s)",
    "Similarity Score",
    "Match Type",
    "Justification",
];

#[cfg(test)]
mod tests {
    use super::*;
    use ctrlmap_core::{ControlId, Justification, MatchType, NO_MATCH_JUSTIFICATION};

    fn full_record() -> MatchRecord {
        MatchRecord {
            source_id: ControlId::new("S1").unwrap(),
            source_requirement: "Enforce MFA".into(),
            target_ids: vec![ControlId::new("T1").unwrap(), ControlId::new("T7").unwrap()],
            target_requirements: vec!["MFA for admins".into(), "Strong auth".into()],
            target_scores: vec![91.0, 86.5],
            average_score: 88.75,
            match_type: MatchType::Full,
            justification: Justification::Generated("Both require MFA.".into()),
        }
    }

    #[test]
    fn joins_targets() {
        let row = MappingRow::from(&full_record());
        assert_eq!(row.target_ids, "T1, T7");
        assert_eq!(row.target_requirements, "MFA for admins; Strong auth");
        assert_eq!(row.match_type, "Full Match");
        assert_eq!(row.similarity_score, 88.75);
        assert_eq!(row.justification, "Both require MFA.");
    }

    #[test]
    fn no_match_row_uses_placeholders() {
        let record = MatchRecord::unmatched(ControlId::new("S2").unwrap(), "Encrypt data");
        let row = MappingRow::from(&record);
        assert_eq!(row.target_ids, "—");
        assert_eq!(row.target_requirements, "—");
        assert_eq!(row.match_type, "No Match");
        assert_eq!(row.justification, NO_MATCH_JUSTIFICATION);
    }

    #[test]
    fn csv_has_header_and_rows() {
        let rows = mapping_rows(&[full_record()]);
        let mut out = Vec::new();
        write_mapping_csv(&mut out, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Source - Control ID,Source - Requirement,Target - Control ID(s),Target - Requirement(s),Similarity Score,Match Type,Justification"
        );
        assert_eq!(
            lines.next().unwrap(),
            "S1,Enforce MFA,\"T1, T7\",MFA for admins; Strong auth,88.75,Full Match,Both require MFA."
        );
    }

    #[test]
    fn empty_csv_still_has_header() {
        let mut out = Vec::new();
        write_mapping_csv(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    #[test]
    fn json_uses_column_names() {
        let mut out = Vec::new();
        write_mapping_json(&mut out, &mapping_rows(&[full_record()])).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["Target - Control ID(s)"], "T1, T7");
        assert_eq!(value[0]["Similarity Score"], 88.75);
    }
}
