//! # Controls and Control Sets
//!
//! A `Control` is one requirement statement from a security framework,
//! identified by its `control_id`. A `ControlSet` is the ordered sequence of
//! controls loaded from one input file.
//!
//! ## Invariants
//!
//! - `requirement` is non-empty and longer than [`MIN_REQUIREMENT_LEN`]
//!   characters after trimming.
//! - Within one `ControlSet`, ids are unique. Later duplicates are dropped
//!   at construction, keeping the first occurrence.
//! - Order is preserved. Row `i` of a similarity matrix is `set[i]`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Requirements of this many characters or fewer are treated as trivial.
pub const MIN_REQUIREMENT_LEN: usize = 3;

/// Identifier of a control within its set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControlId(String);

impl ControlId {
    /// Create a control id from a raw cell, trimming surrounding whitespace.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, SchemaError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(SchemaError::InvalidControl(
                "control_id must not be empty".into(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Access the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ControlId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ControlId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A single security-control requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ControlFields")]
pub struct Control {
    /// Unique id within the owning set.
    pub id: ControlId,
    /// Top-level grouping used for coverage statistics. May be empty.
    pub category: String,
    /// Second-level grouping. May be empty.
    pub subcategory: String,
    /// The requirement text that gets embedded.
    pub requirement: String,
}

impl Control {
    /// Build a control, enforcing the non-trivial requirement invariant.
    pub fn new(
        id: impl AsRef<str>,
        category: impl Into<String>,
        subcategory: impl Into<String>,
        requirement: impl AsRef<str>,
    ) -> Result<Self, SchemaError> {
        let id = ControlId::new(id)?;
        let requirement = requirement.as_ref().trim();
        if !is_substantive(requirement) {
            return Err(SchemaError::InvalidControl(format!(
                "control {id}: requirement must be longer than {MIN_REQUIREMENT_LEN} characters"
            )));
        }
        Ok(Self {
            id,
            category: category.into().trim().to_string(),
            subcategory: subcategory.into().trim().to_string(),
            requirement: requirement.to_string(),
        })
    }
}

/// Whether a trimmed requirement text clears the triviality bar.
pub fn is_substantive(requirement: &str) -> bool {
    requirement.trim().chars().count() > MIN_REQUIREMENT_LEN
}

#[derive(Deserialize)]
struct ControlFields {
    id: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    subcategory: String,
    requirement: String,
}

impl TryFrom<ControlFields> for Control {
    type Error = SchemaError;

    fn try_from(f: ControlFields) -> Result<Self, Self::Error> {
        Control::new(f.id, f.category, f.subcategory, f.requirement)
    }
}

/// An ordered set of controls with unique ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Control>", into = "Vec<Control>")]
pub struct ControlSet {
    controls: Vec<Control>,
    index: HashMap<ControlId, usize>,
}

impl ControlSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from controls in order, dropping later duplicate ids.
    pub fn from_controls(controls: impl IntoIterator<Item = Control>) -> Self {
        let mut set = Self::new();
        for control in controls {
            set.push(control);
        }
        set
    }

    /// Append a control. Returns `false` (and drops the control) when the id
    /// is already present.
    pub fn push(&mut self, control: Control) -> bool {
        if self.index.contains_key(&control.id) {
            return false;
        }
        self.index.insert(control.id.clone(), self.controls.len());
        self.controls.push(control);
        true
    }

    /// Number of controls.
    pub fn len(&self) -> usize {
        self.controls.len()
    }

    /// Whether the set holds no controls.
    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// Control at matrix index `i`.
    pub fn get(&self, i: usize) -> Option<&Control> {
        self.controls.get(i)
    }

    /// Look up a control by id.
    pub fn find(&self, id: &ControlId) -> Option<&Control> {
        self.index.get(id).map(|&i| &self.controls[i])
    }

    /// Look up a control by raw id string.
    pub fn find_str(&self, id: &str) -> Option<&Control> {
        ControlId::new(id).ok().and_then(|id| self.find(&id))
    }

    /// Iterate in set order.
    pub fn iter(&self) -> std::slice::Iter<'_, Control> {
        self.controls.iter()
    }

    /// The controls as a slice, in set order.
    pub fn as_slice(&self) -> &[Control] {
        &self.controls
    }

    /// Requirement texts in set order (the embedding input).
    pub fn requirements(&self) -> Vec<String> {
        self.controls.iter().map(|c| c.requirement.clone()).collect()
    }

    /// Distinct non-empty categories in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.controls
            .iter()
            .filter(|c| !c.category.is_empty())
            .filter(|c| seen.insert(c.category.as_str()))
            .map(|c| c.category.clone())
            .collect()
    }
}

impl From<Vec<Control>> for ControlSet {
    fn from(controls: Vec<Control>) -> Self {
        Self::from_controls(controls)
    }
}

impl From<ControlSet> for Vec<Control> {
    fn from(set: ControlSet) -> Self {
        set.controls
    }
}

impl<'a> IntoIterator for &'a ControlSet {
    type Item = &'a Control;
    type IntoIter = std::slice::Iter<'a, Control>;

    fn into_iter(self) -> Self::IntoIter {
        self.controls.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control(id: &str, req: &str) -> Control {
        Control::new(id, "Access Control", "Authentication", req).unwrap()
    }

    #[test]
    fn control_id_trims_whitespace() {
        let id = ControlId::new("  AC-1 ").unwrap();
        assert_eq!(id.as_str(), "AC-1");
    }

    #[test]
    fn control_id_rejects_blank() {
        assert!(ControlId::new("   ").is_err());
    }

    #[test]
    fn control_rejects_trivial_requirement() {
        assert!(Control::new("A", "c", "s", "abc").is_err());
        assert!(Control::new("A", "c", "s", "  abc  ").is_err());
        assert!(Control::new("A", "c", "s", "abcd").is_ok());
    }

    #[test]
    fn requirement_length_counts_characters_not_bytes() {
        // Four characters, eight bytes.
        assert!(Control::new("A", "c", "s", "éééé").is_ok());
        assert!(!is_substantive("ééé"));
    }

    #[test]
    fn set_keeps_first_duplicate() {
        let set = ControlSet::from_controls(vec![
            control("S1", "first requirement"),
            control("S2", "second requirement"),
            control("S1", "duplicate requirement"),
        ]);
        assert_eq!(set.len(), 2);
        let s1 = set.find_str("S1").unwrap();
        assert_eq!(s1.requirement, "first requirement");
    }

    #[test]
    fn set_preserves_order() {
        let set = ControlSet::from_controls(vec![
            control("B", "bravo requirement"),
            control("A", "alpha requirement"),
        ]);
        let ids: Vec<_> = set.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
        assert_eq!(set.requirements()[0], "bravo requirement");
    }

    #[test]
    fn categories_are_distinct_and_skip_empty() {
        let set = ControlSet::from_controls(vec![
            Control::new("1", "Access Control", "", "requirement one").unwrap(),
            Control::new("2", "", "", "requirement two").unwrap(),
            Control::new("3", "Logging", "", "requirement three").unwrap(),
            Control::new("4", "Access Control", "", "requirement four").unwrap(),
        ]);
        assert_eq!(set.categories(), vec!["Access Control", "Logging"]);
    }

    #[test]
    fn deserialize_validates_controls() {
        let ok: Result<ControlSet, _> = serde_json::from_str(
            r#"[{"id":"S1","category":"AC","subcategory":"","requirement":"Enforce MFA"}]"#,
        );
        assert_eq!(ok.unwrap().len(), 1);

        let bad: Result<ControlSet, _> =
            serde_json::from_str(r#"[{"id":"S1","requirement":"no"}]"#);
        assert!(bad.is_err());
    }

    #[test]
    fn serialize_is_plain_sequence() {
        let set = ControlSet::from_controls(vec![control("S1", "Enforce MFA")]);
        let json = serde_json::to_value(&set).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["id"], "S1");
    }
}
