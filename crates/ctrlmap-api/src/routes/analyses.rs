//! # Analysis Sessions API
//!
//! Submit a source and target control table, run the mapping pipeline, and
//! drill into the result: filtered coverage, per-record justifications, the
//! coverage report, and the mapping table as CSV.
//!
//! Embedding and justification calls block, so they run on Tokio's blocking
//! pool. The store lock is never held across those calls.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use ctrlmap_core::{CategorySummary, ControlId, ControlSet, MatchRecord, Thresholds};
use ctrlmap_engine::{AnalysisOverview, RecordFilter};
use ctrlmap_justify::justify_record;
use ctrlmap_loader::{load_report, RawTable};
use ctrlmap_report::{mapping_rows, write_mapping_csv, CoverageReport};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::{AnalysisRecord, AppState};

const MAX_ROWS_PER_TABLE: usize = 50_000;
const MAX_NAME_LEN: usize = 255;

// ── Request DTOs ────────────────────────────────────────────────────────────

/// One control framework as flat records.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ControlTableInput {
    /// Display label for the framework.
    #[serde(default)]
    pub name: Option<String>,
    /// Records carrying `control_id`, `control_category`,
    /// `control_subcategory` and `control_requirement` (header names are
    /// trimmed and matched case-insensitively).
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<Map<String, Value>>,
}

/// Threshold overrides. Missing values take the defaults (0.85 / 0.65).
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ThresholdsInput {
    #[serde(default)]
    pub full: Option<f32>,
    #[serde(default)]
    pub partial: Option<f32>,
}

impl ThresholdsInput {
    fn resolve(&self) -> Result<Thresholds, AppError> {
        let defaults = Thresholds::default();
        Ok(Thresholds::new(
            self.full.unwrap_or(defaults.full()),
            self.partial.unwrap_or(defaults.partial()),
        )?)
    }
}

/// Create-analysis request.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateAnalysisRequest {
    pub source: ControlTableInput,
    pub target: ControlTableInput,
    #[serde(default)]
    pub thresholds: Option<ThresholdsInput>,
}

impl Validate for CreateAnalysisRequest {
    fn violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        for (side, table) in [("source", &self.source), ("target", &self.target)] {
            if table.rows.len() > MAX_ROWS_PER_TABLE {
                violations.push(format!(
                    "{side} has {} rows; at most {MAX_ROWS_PER_TABLE} are accepted",
                    table.rows.len()
                ));
            }
            if table.name.as_ref().is_some_and(|n| n.len() > MAX_NAME_LEN) {
                violations.push(format!("{side} name must not exceed {MAX_NAME_LEN} characters"));
            }
        }
        violations
    }
}

/// Category and search narrowing, shared by summary, report and export.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    /// Comma-separated source categories.
    #[serde(default)]
    pub categories: Option<String>,
    /// Case-insensitive substring of the source requirement.
    #[serde(default)]
    pub search: Option<String>,
}

impl FilterQuery {
    fn to_filter(&self) -> RecordFilter {
        let mut filter = RecordFilter::all();
        if let Some(raw) = &self.categories {
            let selected: Vec<&str> = raw
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .collect();
            if !selected.is_empty() {
                filter = filter.with_categories(selected);
            }
        }
        if let Some(search) = &self.search {
            filter = filter.with_search(search.as_str());
        }
        filter
    }
}

/// Report rendering.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Markdown,
}

/// Query string for the report endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub categories: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub format: ReportFormat,
}

// ── Response DTOs ───────────────────────────────────────────────────────────

/// A stored analysis with every record.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnalysisResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub source_name: Option<String>,
    pub target_name: Option<String>,
    /// Embedding model that produced the similarities.
    pub model_id: String,
    #[schema(value_type = Object)]
    pub thresholds: Thresholds,
    #[schema(value_type = Object)]
    pub overview: AnalysisOverview,
    #[schema(value_type = Vec<Object>)]
    pub records: Vec<MatchRecord>,
    /// Per-category coverage, category ascending.
    #[schema(value_type = Vec<Object>)]
    pub categories: Vec<CategorySummary>,
}

impl From<&AnalysisRecord> for AnalysisResponse {
    fn from(record: &AnalysisRecord) -> Self {
        let analysis = &record.analysis;
        Self {
            id: record.id,
            created_at: record.created_at,
            source_name: record.source_name.clone(),
            target_name: record.target_name.clone(),
            model_id: analysis.model_id().to_string(),
            thresholds: analysis.thresholds(),
            overview: analysis.overview(),
            records: analysis.records().to_vec(),
            categories: analysis.categories().to_vec(),
        }
    }
}

/// One entry in the analysis listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnalysisListItem {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub source_name: Option<String>,
    pub target_name: Option<String>,
    pub model_id: String,
    #[schema(value_type = Object)]
    pub overview: AnalysisOverview,
}

/// Filtered records with totals recomputed over them.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnalysisSummaryResponse {
    pub id: Uuid,
    /// Every non-empty source category, first-seen order.
    pub available_categories: Vec<String>,
    #[schema(value_type = Object)]
    pub overview: AnalysisOverview,
    #[schema(value_type = Vec<Object>)]
    pub records: Vec<MatchRecord>,
    #[schema(value_type = Vec<Object>)]
    pub categories: Vec<CategorySummary>,
}

/// A record after its justification was regenerated.
#[derive(Debug, Serialize, ToSchema)]
pub struct JustificationResponse {
    pub analysis_id: Uuid,
    #[schema(value_type = Object)]
    pub record: MatchRecord,
}

// ── Router ──────────────────────────────────────────────────────────────────

/// Build the analyses router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/analyses", post(create_analysis).get(list_analyses))
        .route("/v1/analyses/:id", get(get_analysis).delete(delete_analysis))
        .route("/v1/analyses/:id/summary", get(analysis_summary))
        .route(
            "/v1/analyses/:id/records/:source_id/justification",
            post(generate_justification),
        )
        .route("/v1/analyses/:id/report", get(analysis_report))
        .route("/v1/analyses/:id/export", get(export_mapping))
}

fn analysis_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("analysis {id}"))
}

fn load_table(side: &str, input: &ControlTableInput) -> Result<ControlSet, AppError> {
    let table = RawTable::from_records(&input.rows)?;
    let (controls, stats) = load_report(&table)?;
    if stats.dropped() > 0 {
        tracing::info!(
            side,
            rows = stats.rows_read,
            dropped_null = stats.dropped_null,
            dropped_short = stats.dropped_short,
            dropped_duplicate = stats.dropped_duplicate,
            "dropped control rows"
        );
    }
    Ok(controls)
}

// ── Handlers ────────────────────────────────────────────────────────────────

/// POST /v1/analyses — Load both tables and run the mapping pipeline.
#[utoipa::path(
    post,
    path = "/v1/analyses",
    request_body = CreateAnalysisRequest,
    responses(
        (status = 201, description = "Analysis completed", body = AnalysisResponse),
        (status = 400, description = "Malformed request body", body = crate::error::ErrorBody),
        (status = 422, description = "Missing columns or invalid thresholds", body = crate::error::ErrorBody),
        (status = 502, description = "Embedding backend failed", body = crate::error::ErrorBody),
    ),
    tag = "analyses"
)]
async fn create_analysis(
    State(state): State<AppState>,
    body: Result<Json<CreateAnalysisRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AnalysisResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let thresholds = req.thresholds.unwrap_or_default().resolve()?;
    let source = load_table("source", &req.source)?;
    let target = load_table("target", &req.target)?;

    let engine = Arc::clone(&state.engine);
    let analysis = tokio::task::spawn_blocking(move || engine.analyze(source, target, thresholds))
        .await
        .map_err(|e| AppError::Internal(format!("analysis task failed: {e}")))??;

    let record = AnalysisRecord {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        source_name: req.source.name,
        target_name: req.target.name,
        analysis,
    };
    let response = AnalysisResponse::from(&record);
    tracing::info!(
        analysis_id = %record.id,
        coverage = record.analysis.coverage_percent(),
        "analysis stored"
    );
    state.analyses.insert(record.id, record);
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /v1/analyses — List stored analyses, oldest first.
#[utoipa::path(
    get,
    path = "/v1/analyses",
    responses(
        (status = 200, description = "Stored analyses", body = Vec<AnalysisListItem>),
    ),
    tag = "analyses"
)]
async fn list_analyses(State(state): State<AppState>) -> Json<Vec<AnalysisListItem>> {
    let mut items: Vec<AnalysisListItem> = state
        .analyses
        .list()
        .into_iter()
        .map(|r| AnalysisListItem {
            id: r.id,
            created_at: r.created_at,
            model_id: r.analysis.model_id().to_string(),
            overview: r.analysis.overview(),
            source_name: r.source_name,
            target_name: r.target_name,
        })
        .collect();
    items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    Json(items)
}

/// GET /v1/analyses/{id} — Full analysis.
#[utoipa::path(
    get,
    path = "/v1/analyses/{id}",
    params(("id" = Uuid, Path, description = "Analysis ID")),
    responses(
        (status = 200, description = "Analysis", body = AnalysisResponse),
        (status = 404, description = "Unknown analysis", body = crate::error::ErrorBody),
    ),
    tag = "analyses"
)]
async fn get_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnalysisResponse>, AppError> {
    state
        .analyses
        .with(&id, |r| AnalysisResponse::from(r))
        .map(Json)
        .ok_or_else(|| analysis_not_found(id))
}

/// DELETE /v1/analyses/{id} — Drop a stored analysis.
#[utoipa::path(
    delete,
    path = "/v1/analyses/{id}",
    params(("id" = Uuid, Path, description = "Analysis ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Unknown analysis", body = crate::error::ErrorBody),
    ),
    tag = "analyses"
)]
async fn delete_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .analyses
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| analysis_not_found(id))
}

/// GET /v1/analyses/{id}/summary — Filtered records and recomputed totals.
#[utoipa::path(
    get,
    path = "/v1/analyses/{id}/summary",
    params(
        ("id" = Uuid, Path, description = "Analysis ID"),
        ("categories" = Option<String>, Query, description = "Comma-separated source categories"),
        ("search" = Option<String>, Query, description = "Case-insensitive requirement substring"),
    ),
    responses(
        (status = 200, description = "Filtered view", body = AnalysisSummaryResponse),
        (status = 404, description = "Unknown analysis", body = crate::error::ErrorBody),
    ),
    tag = "analyses"
)]
async fn analysis_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<AnalysisSummaryResponse>, AppError> {
    let filter = query.to_filter();
    state
        .analyses
        .with(&id, |r| {
            let view = r.analysis.view(&filter);
            AnalysisSummaryResponse {
                id,
                available_categories: r.analysis.source_categories(),
                overview: view.overview,
                records: view.records,
                categories: view.categories,
            }
        })
        .map(Json)
        .ok_or_else(|| analysis_not_found(id))
}

/// POST /v1/analyses/{id}/records/{source_id}/justification — Generate and
/// store the justification for one record.
#[utoipa::path(
    post,
    path = "/v1/analyses/{id}/records/{source_id}/justification",
    params(
        ("id" = Uuid, Path, description = "Analysis ID"),
        ("source_id" = String, Path, description = "Source control ID"),
    ),
    responses(
        (status = 200, description = "Updated record", body = JustificationResponse),
        (status = 404, description = "Unknown analysis or control", body = crate::error::ErrorBody),
        (status = 503, description = "No justification generator configured", body = crate::error::ErrorBody),
    ),
    tag = "analyses"
)]
async fn generate_justification(
    State(state): State<AppState>,
    Path((id, source_id)): Path<(Uuid, String)>,
) -> Result<Json<JustificationResponse>, AppError> {
    let generator = state.generator.clone().ok_or_else(|| {
        AppError::ServiceUnavailable("justification generator is not configured".into())
    })?;
    let control_id =
        ControlId::new(&source_id).map_err(|_| AppError::NotFound(format!("control {source_id:?}")))?;

    let record = state
        .analyses
        .with(&id, |r| r.analysis.record(control_id.as_str()).cloned())
        .ok_or_else(|| analysis_not_found(id))?
        .ok_or_else(|| AppError::NotFound(format!("control {control_id}")))?;

    let justification =
        tokio::task::spawn_blocking(move || justify_record(generator.as_ref(), &record))
            .await
            .map_err(|e| AppError::Internal(format!("justification task failed: {e}")))?;

    let updated = state
        .analyses
        .try_update(&id, |r| {
            r.analysis
                .set_justification(&control_id, justification)
                .cloned()
        })
        .ok_or_else(|| analysis_not_found(id))??;
    Ok(Json(JustificationResponse {
        analysis_id: id,
        record: updated,
    }))
}

/// GET /v1/analyses/{id}/report — Coverage report over the (filtered) records.
#[utoipa::path(
    get,
    path = "/v1/analyses/{id}/report",
    params(
        ("id" = Uuid, Path, description = "Analysis ID"),
        ("categories" = Option<String>, Query, description = "Comma-separated source categories"),
        ("search" = Option<String>, Query, description = "Case-insensitive requirement substring"),
        ("format" = Option<String>, Query, description = "`json` (default) or `markdown`"),
    ),
    responses(
        (status = 200, description = "Coverage report, JSON or Markdown"),
        (status = 404, description = "Unknown analysis", body = crate::error::ErrorBody),
    ),
    tag = "analyses"
)]
async fn analysis_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    let filter = FilterQuery {
        categories: query.categories,
        search: query.search,
    }
    .to_filter();
    let now = Utc::now();
    let report = state
        .analyses
        .with(&id, |r| {
            if filter.is_unrestricted() {
                CoverageReport::from_analysis(&r.analysis, now)
            } else {
                CoverageReport::from_view(&r.analysis.view(&filter), now)
            }
        })
        .ok_or_else(|| analysis_not_found(id))?;

    Ok(match query.format {
        ReportFormat::Json => Json(report).into_response(),
        ReportFormat::Markdown => (
            [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
            report.render_markdown(),
        )
            .into_response(),
    })
}

/// GET /v1/analyses/{id}/export — Mapping table as CSV.
#[utoipa::path(
    get,
    path = "/v1/analyses/{id}/export",
    params(
        ("id" = Uuid, Path, description = "Analysis ID"),
        ("categories" = Option<String>, Query, description = "Comma-separated source categories"),
        ("search" = Option<String>, Query, description = "Case-insensitive requirement substring"),
    ),
    responses(
        (status = 200, description = "CSV mapping table", content_type = "text/csv", body = String),
        (status = 404, description = "Unknown analysis", body = crate::error::ErrorBody),
    ),
    tag = "analyses"
)]
async fn export_mapping(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<FilterQuery>,
) -> Result<Response, AppError> {
    let filter = query.to_filter();
    let rows = state
        .analyses
        .with(&id, |r| {
            mapping_rows(filter.apply(r.analysis.records(), r.analysis.source()))
        })
        .ok_or_else(|| analysis_not_found(id))?;

    let mut csv = Vec::new();
    write_mapping_csv(&mut csv, &rows)
        .map_err(|e| AppError::Internal(format!("csv export failed: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"mapping_results.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_query_splits_categories() {
        let filter = FilterQuery {
            categories: Some(" Access Control, ,Logging ".into()),
            search: None,
        }
        .to_filter();
        let selected = filter.categories.unwrap();
        assert_eq!(selected.len(), 2);
        assert!(selected.contains("Access Control"));
        assert!(selected.contains("Logging"));
    }

    #[test]
    fn blank_filter_query_is_unrestricted() {
        let filter = FilterQuery {
            categories: Some(" , ".into()),
            search: Some("   ".into()),
        }
        .to_filter();
        assert!(filter.is_unrestricted());
    }

    #[test]
    fn thresholds_input_fills_defaults() {
        let t = ThresholdsInput {
            full: Some(0.9),
            partial: None,
        }
        .resolve()
        .unwrap();
        assert_eq!(t.full(), 0.9);
        assert_eq!(t.partial(), Thresholds::default().partial());
    }

    #[test]
    fn inverted_thresholds_rejected() {
        let err = ThresholdsInput {
            full: Some(0.5),
            partial: Some(0.7),
        }
        .resolve()
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn oversized_table_and_long_name_both_reported() {
        let req = CreateAnalysisRequest {
            source: ControlTableInput {
                name: None,
                rows: vec![Map::new(); MAX_ROWS_PER_TABLE + 1],
            },
            target: ControlTableInput {
                name: Some("x".repeat(MAX_NAME_LEN + 1)),
                rows: Vec::new(),
            },
            thresholds: None,
        };
        let violations = req.violations();
        assert_eq!(violations.len(), 2);
        assert!(violations[0].starts_with("source has"));
        assert!(violations[1].starts_with("target name"));
    }
}
