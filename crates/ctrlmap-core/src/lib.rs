//! # ctrlmap-core — Foundational Types for Control Mapping
//!
//! This crate defines the data model shared by every stage of the mapping
//! pipeline. Every other `ctrlmap-*` crate depends on it; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype identifiers.** `ControlId` wraps the trimmed `control_id`
//!    cell. Source and target ids never travel as bare strings through the
//!    matcher.
//!
//! 2. **Validated construction.** A `Control` cannot exist with a trivial
//!    requirement, and `Thresholds` cannot exist with `partial > full`.
//!
//! 3. **Single `MatchType` enum.** One definition of Full/Partial/None used
//!    by the matcher, the aggregator, the export table, and the API.
//!
//! 4. **Content-addressed keys.** `TextDigest` is the only way the embedding
//!    cache names a vector, so two sessions share a vector only when they
//!    embedded byte-identical text under the same model.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `ctrlmap-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod control;
pub mod digest;
pub mod error;
pub mod mapping;
pub mod thresholds;

// Re-export primary types for ergonomic imports.
pub use control::{is_substantive, Control, ControlId, ControlSet, MIN_REQUIREMENT_LEN};
pub use digest::TextDigest;
pub use error::{CtrlmapError, EmbeddingError, SchemaError, ThresholdError};
pub use mapping::{
    round2, CategorySummary, Justification, MatchCounts, MatchRecord, MatchType,
    MAX_TARGETS_PER_RECORD, NO_MATCH_JUSTIFICATION, PENDING_JUSTIFICATION,
};
pub use thresholds::Thresholds;
