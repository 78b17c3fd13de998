//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into one OpenAPI spec, served at
//! `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "ctrlmap API",
        version = "0.1.0",
        description = "Map the controls of one security framework onto another by semantic similarity, and report coverage per category."
    ),
    paths(
        crate::routes::analyses::create_analysis,
        crate::routes::analyses::list_analyses,
        crate::routes::analyses::get_analysis,
        crate::routes::analyses::delete_analysis,
        crate::routes::analyses::analysis_summary,
        crate::routes::analyses::generate_justification,
        crate::routes::analyses::analysis_report,
        crate::routes::analyses::export_mapping,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::analyses::ControlTableInput,
        crate::routes::analyses::ThresholdsInput,
        crate::routes::analyses::CreateAnalysisRequest,
        crate::routes::analyses::AnalysisResponse,
        crate::routes::analyses::AnalysisListItem,
        crate::routes::analyses::AnalysisSummaryResponse,
        crate::routes::analyses::JustificationResponse,
    )),
    tags(
        (name = "analyses", description = "Control mapping analyses"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lists_analysis_paths() {
        let spec = ApiDoc::openapi();
        let paths: Vec<&String> = spec.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| p.as_str() == "/v1/analyses"));
        assert!(paths.iter().any(|p| p.as_str() == "/v1/analyses/{id}/summary"));
        assert!(paths
            .iter()
            .any(|p| p.as_str() == "/v1/analyses/{id}/records/{source_id}/justification"));
    }
}
