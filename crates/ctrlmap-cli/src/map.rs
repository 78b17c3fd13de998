//! # Map Subcommand
//!
//! Runs one analysis end to end:
//!
//! 1. Load the source and target control files.
//! 2. Embed, compare, match, and aggregate.
//! 3. Optionally generate a justification for every matched record.
//! 4. Apply `--category`/`--search` filters.
//! 5. Write `mapping_results.{csv,json}` and the coverage report
//!    (`mapping_report_<timestamp>.md` and `.json`) to the output directory.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, ValueEnum};
use ctrlmap_core::MatchType;
use ctrlmap_embed::{build_backend, BackendKind, EmbeddingConfig, EmbeddingProvider};
use ctrlmap_engine::{Analysis, AnalysisOverview, MappingEngine, RecordFilter};
use ctrlmap_justify::{justify_record, GeneratorConfig, JustificationGenerator, OllamaGenerator};
use ctrlmap_loader::load_path;
use ctrlmap_report::{
    mapping_rows, report_file_stem, write_mapping_csv, write_mapping_json, CoverageReport,
};

use crate::config::CtrlmapConfig;

/// Mapping table file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// Arguments for the map subcommand.
#[derive(Args, Debug)]
pub struct MapArgs {
    /// Source framework control file.
    #[arg(long)]
    pub source: PathBuf,

    /// Target framework control file.
    #[arg(long)]
    pub target: PathBuf,

    /// Full-match threshold in [0, 1].
    #[arg(long)]
    pub full: Option<f32>,

    /// Partial-match threshold in [0, 1], not above --full.
    #[arg(long)]
    pub partial: Option<f32>,

    /// Embedding backend (hashing or ollama).
    #[arg(long)]
    pub backend: Option<BackendKind>,

    /// Keep only these source categories. Repeatable.
    #[arg(long = "category")]
    pub categories: Vec<String>,

    /// Keep only records whose source requirement contains this text.
    #[arg(long)]
    pub search: Option<String>,

    /// Generate justifications for matched records.
    #[arg(long)]
    pub justify: bool,

    /// Mapping table format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,
}

impl MapArgs {
    fn filter(&self) -> RecordFilter {
        let mut filter = RecordFilter::all();
        if !self.categories.is_empty() {
            filter = filter.with_categories(self.categories.iter().cloned());
        }
        if let Some(search) = &self.search {
            filter = filter.with_search(search.clone());
        }
        filter
    }
}

/// Files written by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapOutputs {
    pub mapping: PathBuf,
    pub report_markdown: PathBuf,
    pub report_json: PathBuf,
}

/// Execute the map subcommand.
pub fn run_map(args: &MapArgs, config: &CtrlmapConfig, output_dir: &Path) -> Result<u8> {
    let mut embedding = config.embedding(EmbeddingConfig::from_env()?);
    if let Some(backend) = args.backend {
        embedding.backend = backend;
    }
    let generator: Option<Arc<dyn JustificationGenerator>> = if args.justify {
        let settings = config.generator(GeneratorConfig::from_env()?);
        Some(Arc::new(
            OllamaGenerator::new(&settings).context("configuring justification generator")?,
        ))
    } else {
        None
    };

    let outputs = execute(args, config, &embedding, generator.as_deref(), output_dir)?;
    println!("  wrote: {}", outputs.mapping.display());
    println!("  wrote: {}", outputs.report_markdown.display());
    println!("  wrote: {}", outputs.report_json.display());
    Ok(0)
}

/// Run the analysis with explicit backend settings and an optional generator.
pub fn execute(
    args: &MapArgs,
    config: &CtrlmapConfig,
    embedding: &EmbeddingConfig,
    generator: Option<&dyn JustificationGenerator>,
    output_dir: &Path,
) -> Result<MapOutputs> {
    let thresholds = config.thresholds(args.full, args.partial)?;
    let source = load_path(&args.source)
        .with_context(|| format!("loading source controls: {}", args.source.display()))?;
    let target = load_path(&args.target)
        .with_context(|| format!("loading target controls: {}", args.target.display()))?;

    let backend = build_backend(embedding).context("configuring embedding backend")?;
    let engine = MappingEngine::new(EmbeddingProvider::new(backend));
    let mut analysis = engine
        .analyze(source, target, thresholds)
        .context("running analysis")?;

    let filter = args.filter();
    if let Some(generator) = generator {
        justify_all(&mut analysis, generator, &filter)?;
    }

    let view = analysis.view(&filter);
    print_overview(&view.overview);

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output directory: {}", output_dir.display()))?;

    let rows = mapping_rows(&view.records);
    let mapping = output_dir.join(format!("mapping_results.{}", args.format.extension()));
    let file = BufWriter::new(
        File::create(&mapping).with_context(|| format!("creating {}", mapping.display()))?,
    );
    let written = match args.format {
        OutputFormat::Csv => write_mapping_csv(file, &rows),
        OutputFormat::Json => write_mapping_json(file, &rows),
    };
    written.with_context(|| format!("writing {}", mapping.display()))?;

    let now = Utc::now();
    let report = CoverageReport::from_view(&view, now);
    let stem = report_file_stem(now);
    let report_markdown = output_dir.join(format!("{stem}.md"));
    std::fs::write(&report_markdown, report.render_markdown())
        .with_context(|| format!("writing {}", report_markdown.display()))?;
    let report_json = output_dir.join(format!("{stem}.json"));
    std::fs::write(&report_json, serde_json::to_vec_pretty(&report)?)
        .with_context(|| format!("writing {}", report_json.display()))?;

    Ok(MapOutputs {
        mapping,
        report_markdown,
        report_json,
    })
}

fn justify_all(
    analysis: &mut Analysis,
    generator: &dyn JustificationGenerator,
    filter: &RecordFilter,
) -> Result<()> {
    let pending: Vec<_> = filter
        .apply(analysis.records(), analysis.source())
        .into_iter()
        .filter(|r| r.match_type != MatchType::None)
        .cloned()
        .collect();
    tracing::info!(records = pending.len(), "generating justifications");
    for record in &pending {
        let justification = justify_record(generator, record);
        analysis.set_justification(&record.source_id, justification)?;
    }
    Ok(())
}

fn print_overview(o: &AnalysisOverview) {
    println!("Mapping overview");
    println!("  total controls:   {}", o.total_controls);
    println!("  full matches:     {}", o.full_matches);
    println!("  partial matches:  {}", o.partial_matches);
    println!("  no match:         {}", o.no_matches);
    println!("  coverage:         {:.2}%", o.coverage_percent);
}
