//! # ctrlmap-engine — Similarity, Matching, Aggregation
//!
//! The part of ctrlmap that turns two control sets into a thresholded
//! correspondence and coverage statistics.
//!
//! ```text
//! ControlSet ─┐
//!             ├─ SimilarityMatrix ─ match_controls ─ summarize ─ Analysis
//! ControlSet ─┘
//! ```
//!
//! Every stage is a pure function of its inputs except the embedding call
//! inside [`SimilarityMatrix::compute`], which goes through the injected
//! [`EmbeddingProvider`](ctrlmap_embed::EmbeddingProvider) and its cache.

pub mod aggregate;
pub mod filter;
pub mod matcher;
pub mod pipeline;
pub mod similarity;

pub use aggregate::summarize;
pub use filter::RecordFilter;
pub use matcher::{match_controls, match_row, MatchOutcome};
pub use pipeline::{Analysis, AnalysisOverview, AnalysisView, MappingEngine};
pub use similarity::SimilarityMatrix;
