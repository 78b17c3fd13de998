//! # API Route Modules
//!
//! All analysis routes live under `/v1/analyses`.

pub mod analyses;
