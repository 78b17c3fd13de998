//! # ctrlmap-cli — Control Mapping Command-Line Interface
//!
//! ## Subcommands
//!
//! - `validate` — check control files against the loader schema
//! - `map` — run an analysis and write the mapping table and report
//!
//! ## Crate Policy
//!
//! - Argument structs live next to their handlers; `main.rs` only parses
//!   and dispatches.
//! - Handlers return an exit code; errors carry `anyhow` context naming the
//!   file or step that failed.

pub mod config;
pub mod map;
pub mod validate;
