//! # Validate Subcommand
//!
//! Loads each control file, reports how many rows survived each rule, and
//! previews the first five controls. A file that cannot be read or lacks a
//! required column fails the command; the remaining files are still checked.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use ctrlmap_core::ControlSet;
use ctrlmap_loader::{load_report, read_path, LoadStats};

/// Rows shown in the preview.
const PREVIEW_ROWS: usize = 5;

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Control files to check (.csv, .json, .yaml, .yml).
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Execute the validate subcommand.
pub fn run_validate(args: &ValidateArgs) -> Result<u8> {
    let mut failures = 0usize;
    for path in &args.files {
        match validate_file(path) {
            Ok((set, stats)) => print_summary(path, &set, &stats),
            Err(e) => {
                failures += 1;
                eprintln!("{}: INVALID", path.display());
                eprintln!("  {e:#}");
            }
        }
    }
    if failures > 0 {
        eprintln!("{failures} of {} file(s) failed validation", args.files.len());
        Ok(1)
    } else {
        Ok(0)
    }
}

/// Read and load one file.
pub fn validate_file(path: &Path) -> Result<(ControlSet, LoadStats)> {
    let table = read_path(path).with_context(|| format!("reading {}", path.display()))?;
    load_report(&table).with_context(|| format!("validating {}", path.display()))
}

fn print_summary(path: &Path, set: &ControlSet, stats: &LoadStats) {
    println!("{}: VALID", path.display());
    println!("  rows read:          {}", stats.rows_read);
    println!("  controls loaded:    {}", set.len());
    println!("  dropped (null):     {}", stats.dropped_null);
    println!("  dropped (trivial):  {}", stats.dropped_short);
    println!("  dropped (duplicate): {}", stats.dropped_duplicate);
    println!("  categories:         {}", set.categories().len());
    for control in set.iter().take(PREVIEW_ROWS) {
        println!(
            "    {} | {} | {} | {}",
            control.id, control.category, control.subcategory, control.requirement
        );
    }
}
