//! # Coverage Report
//!
//! The summary document handed to reviewers: title, generation time,
//! overall coverage, and the per-category breakdown sorted by coverage
//! descending.
//!
//! Rendered as Markdown for humans and serialized as JSON for tooling.

use std::cmp::Ordering;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use ctrlmap_core::{round2, CategorySummary};
use ctrlmap_engine::{Analysis, AnalysisOverview, AnalysisView};
use serde::{Deserialize, Serialize};

/// Report title.
pub const REPORT_TITLE: &str = "Cybersecurity Mapping Report";

/// Coverage report document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    /// Document title.
    pub title: String,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// Overall coverage, 2 decimals.
    pub overall_coverage: f64,
    /// Headline totals.
    pub overview: AnalysisOverview,
    /// Categories, coverage descending then name ascending.
    pub categories: Vec<CategorySummary>,
}

impl CoverageReport {
    /// Build a report from totals and a category summary.
    pub fn new(
        overview: AnalysisOverview,
        mut categories: Vec<CategorySummary>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        categories.sort_by(|a, b| {
            b.coverage_percent
                .partial_cmp(&a.coverage_percent)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.category.cmp(&b.category))
        });
        Self {
            title: REPORT_TITLE.to_string(),
            generated_at,
            overall_coverage: round2(overview.coverage_percent),
            overview,
            categories,
        }
    }

    /// Report over a whole analysis.
    pub fn from_analysis(analysis: &Analysis, generated_at: DateTime<Utc>) -> Self {
        Self::new(analysis.overview(), analysis.categories().to_vec(), generated_at)
    }

    /// Report over a filtered view.
    pub fn from_view(view: &AnalysisView, generated_at: DateTime<Utc>) -> Self {
        Self::new(view.overview, view.categories.clone(), generated_at)
    }

    /// Render as a Markdown document.
    pub fn render_markdown(&self) -> String {
        let mut out = String::new();
        let o = &self.overview;
        // Writing to a String cannot fail.
        let _ = writeln!(out, "# {}\n", self.title);
        let _ = writeln!(out, "Generated on {}\n", self.generated_at.format("%Y-%m-%d %H:%M"));
        let _ = writeln!(out, "## Coverage Summary\n");
        let _ = writeln!(out, "**Total coverage:** {:.2}%\n", self.overall_coverage);
        let _ = writeln!(out, "- Total controls: {}", o.total_controls);
        let _ = writeln!(out, "- Full matches: {}", o.full_matches);
        let _ = writeln!(out, "- Partial matches: {}", o.partial_matches);
        let _ = writeln!(out, "- No match: {}\n", o.no_matches);
        let _ = writeln!(out, "## Category Breakdown\n");
        let _ = writeln!(
            out,
            "| Category | Coverage % | Full Match | Partial Match | No Match | Total |"
        );
        let _ = writeln!(out, "|---|---:|---:|---:|---:|---:|");
        for c in &self.categories {
            let _ = writeln!(
                out,
                "| {} | {:.1}% | {} | {} | {} | {} |",
                escape_cell(&c.category),
                c.coverage_percent,
                c.full_count,
                c.partial_count,
                c.none_count,
                c.total
            );
        }
        out
    }
}

/// File stem for a report generated at `ts`: `mapping_report_YYYYMMDD_HHMMSS`.
pub fn report_file_stem(ts: DateTime<Utc>) -> String {
    format!("mapping_report_{}", ts.format("%Y%m%d_%H%M%S"))
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
