//! # ctrlmap CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber, loads
//! the optional config file, and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ctrlmap_cli::config::CtrlmapConfig;
use ctrlmap_cli::map::{run_map, MapArgs};
use ctrlmap_cli::validate::{run_validate, ValidateArgs};

/// ctrlmap — map security controls between frameworks by semantic similarity.
#[derive(Parser, Debug)]
#[command(name = "ctrlmap", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output directory for generated files.
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check control files for required columns and report dropped rows.
    Validate(ValidateArgs),

    /// Map source controls onto target controls and write the results.
    Map(MapArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "ctrlmap CLI starting");

    let output_dir = cli.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));

    let result = match &cli.command {
        Commands::Validate(args) => run_validate(args),
        Commands::Map(args) => CtrlmapConfig::load(cli.config.as_deref())
            .and_then(|config| run_map(args, &config, &output_dir)),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctrlmap_cli::map::OutputFormat;
    use ctrlmap_embed::BackendKind;

    #[test]
    fn cli_parse_validate_files() {
        let cli = Cli::try_parse_from(["ctrlmap", "validate", "a.csv", "b.yaml"]).unwrap();
        if let Commands::Validate(args) = cli.command {
            assert_eq!(args.files, vec![PathBuf::from("a.csv"), PathBuf::from("b.yaml")]);
        } else {
            panic!("expected validate");
        }
    }

    #[test]
    fn cli_parse_validate_requires_file() {
        assert!(Cli::try_parse_from(["ctrlmap", "validate"]).is_err());
    }

    #[test]
    fn cli_parse_map_minimal() {
        let cli = Cli::try_parse_from([
            "ctrlmap", "map", "--source", "src.csv", "--target", "tgt.csv",
        ])
        .unwrap();
        if let Commands::Map(args) = cli.command {
            assert_eq!(args.source, PathBuf::from("src.csv"));
            assert_eq!(args.target, PathBuf::from("tgt.csv"));
            assert!(args.full.is_none());
            assert!(args.backend.is_none());
            assert!(args.categories.is_empty());
            assert!(!args.justify);
            assert_eq!(args.format, OutputFormat::Csv);
        } else {
            panic!("expected map");
        }
    }

    #[test]
    fn cli_parse_map_all_flags() {
        let cli = Cli::try_parse_from([
            "ctrlmap",
            "-vv",
            "--output-dir",
            "out",
            "map",
            "--source",
            "src.csv",
            "--target",
            "tgt.json",
            "--full",
            "0.9",
            "--partial",
            "0.7",
            "--backend",
            "ollama",
            "--category",
            "Access Control",
            "--category",
            "Logging",
            "--search",
            "mfa",
            "--justify",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
        if let Commands::Map(args) = cli.command {
            assert_eq!(args.full, Some(0.9));
            assert_eq!(args.partial, Some(0.7));
            assert_eq!(args.backend, Some(BackendKind::Ollama));
            assert_eq!(args.categories, vec!["Access Control", "Logging"]);
            assert_eq!(args.search.as_deref(), Some("mfa"));
            assert!(args.justify);
            assert_eq!(args.format, OutputFormat::Json);
        } else {
            panic!("expected map");
        }
    }

    #[test]
    fn cli_parse_map_rejects_unknown_backend() {
        assert!(Cli::try_parse_from([
            "ctrlmap", "map", "--source", "s.csv", "--target", "t.csv", "--backend", "openai",
        ])
        .is_err());
    }

    #[test]
    fn cli_parse_global_config_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ctrlmap", "map", "--source", "s.csv", "--target", "t.csv", "--config", "c.yaml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.yaml")));
    }
}
