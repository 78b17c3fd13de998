//! # Integration Tests for ctrlmap-api
//!
//! Drives the full router through `oneshot`: analysis creation and
//! validation, drill-down filtering, justification with and without a
//! generator, report and CSV export, authentication, and the OpenAPI document.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use ctrlmap_api::state::{AppConfig, AppState};
use ctrlmap_embed::{EmbeddingProvider, HashingEmbedder};
use ctrlmap_engine::MappingEngine;
use ctrlmap_justify::{JustificationError, JustificationGenerator};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Answers every prompt with a fixed sentence and counts calls.
#[derive(Default)]
struct CannedGenerator {
    calls: AtomicUsize,
}

impl JustificationGenerator for CannedGenerator {
    fn generate(
        &self,
        source_requirement: &str,
        _target_requirements: &[String],
    ) -> Result<String, JustificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("Both require: {source_requirement}"))
    }
}

fn engine() -> MappingEngine {
    MappingEngine::new(EmbeddingProvider::new(Arc::new(
        HashingEmbedder::new(256).unwrap(),
    )))
}

/// Helper: build the test app with auth disabled and no generator.
fn test_app() -> Router {
    ctrlmap_api::app(AppState::new(engine()))
}

fn test_app_with_generator(generator: Arc<CannedGenerator>) -> Router {
    let state = AppState::with_config(AppConfig::default(), engine(), Some(generator));
    ctrlmap_api::app(state)
}

/// Helper: build the test app with auth enabled.
fn test_app_with_auth(token: &str) -> Router {
    let config = AppConfig {
        auth_token: Some(token.to_string()),
        ..AppConfig::default()
    };
    ctrlmap_api::app(AppState::with_config(config, engine(), None))
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::http::Response<Body>) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Two exact matches and one control with nothing comparable. The tight
/// thresholds keep the hashing embedder's incidental overlap out of the
/// matched bands.
fn analysis_request() -> Value {
    json!({
        "source": {
            "name": "Internal Policy",
            "rows": [
                {"Control_ID": "S1", " control_category ": "Access Control", "CONTROL_SUBCATEGORY": "MFA",
                 "Control_Requirement": "Enforce multi-factor authentication for administrators"},
                {"Control_ID": "S2", " control_category ": "Logging", "CONTROL_SUBCATEGORY": "",
                 "Control_Requirement": "Retain audit logs for one year"},
                {"Control_ID": "S3", " control_category ": "Physical", "CONTROL_SUBCATEGORY": "",
                 "Control_Requirement": "Zebra xylophone quartz"}
            ]
        },
        "target": {
            "name": "Baseline",
            "rows": [
                {"control_id": "T1", "control_category": "IAM", "control_subcategory": "",
                 "control_requirement": "Enforce multi-factor authentication for administrators"},
                {"control_id": "T2", "control_category": "Monitoring", "control_subcategory": "",
                 "control_requirement": "Retain audit logs for one year"}
            ]
        },
        "thresholds": {"full": 0.99, "partial": 0.9}
    })
}

/// Create the fixture analysis and return its id.
async fn create_fixture(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(post_json("/v1/analyses", &analysis_request()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    body["id"].as_str().unwrap().to_string()
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let response = test_app().oneshot(get("/health/liveness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_probe() {
    let response = test_app().oneshot(get("/health/readiness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

// -- Analysis Creation --------------------------------------------------------

#[tokio::test]
async fn test_create_analysis_returns_records_and_overview() {
    let app = test_app();
    let response = app
        .oneshot(post_json("/v1/analyses", &analysis_request()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;

    assert_eq!(body["source_name"], "Internal Policy");
    assert_eq!(body["model_id"], "hashing-256");
    assert_eq!(body["overview"]["total_controls"], 3);
    assert_eq!(body["overview"]["full_matches"], 2);
    assert_eq!(body["overview"]["no_matches"], 1);
    assert_eq!(body["overview"]["coverage_percent"], 66.67);

    let records = body["records"].as_array().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["source_id"], "S1");
    assert_eq!(records[0]["target_ids"][0], "T1");
    assert_eq!(records[0]["match_type"], "full");
    assert_eq!(records[0]["justification"]["status"], "pending");
    assert_eq!(records[2]["match_type"], "none");
    assert_eq!(records[2]["justification"]["status"], "not_applicable");

    let categories: Vec<&str> = body["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["category"].as_str().unwrap())
        .collect();
    assert_eq!(categories, vec!["Access Control", "Logging", "Physical"]);
}

#[tokio::test]
async fn test_create_analysis_missing_columns_is_422() {
    let body = json!({
        "source": {"rows": [{"control_id": "S1", "control_requirement": "Enforce MFA everywhere"}]},
        "target": {"rows": [{"control_id": "T1", "control_requirement": "Enforce MFA everywhere"}]}
    });
    let response = test_app()
        .oneshot(post_json("/v1/analyses", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("control_category"));
    assert!(message.contains("control_subcategory"));
}

#[tokio::test]
async fn test_create_analysis_inverted_thresholds_is_422() {
    let mut body = analysis_request();
    body["thresholds"] = json!({"full": 0.5, "partial": 0.8});
    let response = test_app()
        .oneshot(post_json("/v1/analyses", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_create_analysis_malformed_json_is_400() {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/analyses")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"source\": "))
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_nested_cell_is_422() {
    let body = json!({
        "source": {"rows": [{"control_id": ["S1"], "control_category": "A",
                             "control_subcategory": "", "control_requirement": "Enforce MFA"}]},
        "target": {"rows": []}
    });
    let response = test_app()
        .oneshot(post_json("/v1/analyses", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// -- Retrieval ----------------------------------------------------------------

#[tokio::test]
async fn test_list_and_get_analysis() {
    let app = test_app();
    let id = create_fixture(&app).await;

    let response = app.clone().oneshot(get("/v1/analyses")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let list = body_json(response).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["id"], id.as_str());
    assert_eq!(list[0]["target_name"], "Baseline");

    let response = app
        .oneshot(get(&format!("/v1/analyses/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["records"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_get_unknown_analysis_is_404() {
    let uri = format!("/v1/analyses/{}", uuid::Uuid::new_v4());
    let response = test_app().oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_delete_analysis() {
    let app = test_app();
    let id = create_fixture(&app).await;
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/analyses/{id}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(get(&format!("/v1/analyses/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// -- Drill-down ---------------------------------------------------------------

#[tokio::test]
async fn test_summary_filters_by_category() {
    let app = test_app();
    let id = create_fixture(&app).await;
    let response = app
        .oneshot(get(&format!("/v1/analyses/{id}/summary?categories=Logging,Physical")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["overview"]["total_controls"], 2);
    assert_eq!(body["overview"]["coverage_percent"], 50.0);
    assert_eq!(body["records"].as_array().unwrap().len(), 2);
    assert_eq!(
        body["available_categories"],
        json!(["Access Control", "Logging", "Physical"])
    );
}

#[tokio::test]
async fn test_summary_search_is_case_insensitive() {
    let app = test_app();
    let id = create_fixture(&app).await;
    let response = app
        .oneshot(get(&format!("/v1/analyses/{id}/summary?search=AUDIT")))
        .await
        .unwrap();
    let body = body_json(response).await;
    let records = body["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["source_id"], "S2");
    assert_eq!(body["overview"]["coverage_percent"], 100.0);
}

#[tokio::test]
async fn test_summary_without_filter_matches_full_analysis() {
    let app = test_app();
    let id = create_fixture(&app).await;
    let response = app
        .oneshot(get(&format!("/v1/analyses/{id}/summary")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["overview"]["total_controls"], 3);
    assert_eq!(body["overview"]["coverage_percent"], 66.67);
}

// -- Justification ------------------------------------------------------------

#[tokio::test]
async fn test_justification_without_generator_is_503() {
    let app = test_app();
    let id = create_fixture(&app).await;
    let response = app
        .oneshot(post_empty(&format!("/v1/analyses/{id}/records/S1/justification")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_justification_is_generated_and_stored() {
    let generator = Arc::new(CannedGenerator::default());
    let app = test_app_with_generator(Arc::clone(&generator));
    let id = create_fixture(&app).await;

    let response = app
        .clone()
        .oneshot(post_empty(&format!("/v1/analyses/{id}/records/S1/justification")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["record"]["justification"]["status"], "generated");
    assert_eq!(
        body["record"]["justification"]["text"],
        "Both require: Enforce multi-factor authentication for administrators"
    );
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

    // Stored on the analysis, other records untouched.
    let response = app
        .oneshot(get(&format!("/v1/analyses/{id}")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["records"][0]["justification"]["status"], "generated");
    assert_eq!(body["records"][1]["justification"]["status"], "pending");
}

#[tokio::test]
async fn test_justification_skipped_for_unmatched_record() {
    let generator = Arc::new(CannedGenerator::default());
    let app = test_app_with_generator(Arc::clone(&generator));
    let id = create_fixture(&app).await;

    let response = app
        .oneshot(post_empty(&format!("/v1/analyses/{id}/records/S3/justification")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["record"]["justification"]["status"], "not_applicable");
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_justification_unknown_control_is_404() {
    let app = test_app_with_generator(Arc::new(CannedGenerator::default()));
    let id = create_fixture(&app).await;
    let response = app
        .oneshot(post_empty(&format!("/v1/analyses/{id}/records/NOPE/justification")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// -- Report & Export ----------------------------------------------------------

#[tokio::test]
async fn test_report_json() {
    let app = test_app();
    let id = create_fixture(&app).await;
    let response = app
        .oneshot(get(&format!("/v1/analyses/{id}/report")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["title"], "Cybersecurity Mapping Report");
    assert_eq!(body["overall_coverage"], 66.67);
    // Coverage descending, then name.
    assert_eq!(body["categories"][0]["category"], "Access Control");
    assert_eq!(body["categories"][1]["category"], "Logging");
    assert_eq!(body["categories"][2]["category"], "Physical");
}

#[tokio::test]
async fn test_report_markdown_with_filter() {
    let app = test_app();
    let id = create_fixture(&app).await;
    let response = app
        .oneshot(get(&format!(
            "/v1/analyses/{id}/report?format=markdown&categories=Physical"
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/markdown"));
    let body = body_string(response).await;
    assert!(body.starts_with("# Cybersecurity Mapping Report"));
    assert!(body.contains("**Total coverage:** 0.00%"));
    assert!(body.contains("| Physical |"));
    assert!(!body.contains("| Logging |"));
}

#[tokio::test]
async fn test_export_csv() {
    let app = test_app();
    let id = create_fixture(&app).await;
    let response = app
        .oneshot(get(&format!("/v1/analyses/{id}/export")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/csv"));
    let body = body_string(response).await;
    let mut lines = body.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Source - Control ID,Source - Requirement,Target - Control ID(s),Target - Requirement(s),Similarity Score,Match Type,Justification"
    );
    assert_eq!(body.lines().count(), 4);
    assert!(body.contains("S3,Zebra xylophone quartz,—,—,"));
}

// -- Authentication -----------------------------------------------------------

#[tokio::test]
async fn test_auth_required_for_api_routes() {
    let app = test_app_with_auth("s3cret");
    let response = app.clone().oneshot(get("/v1/analyses")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/v1/analyses")
        .header(header::AUTHORIZATION, "Bearer s3cret")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_bypasses_auth() {
    let app = test_app_with_auth("s3cret");
    let response = app.oneshot(get("/health/liveness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// -- OpenAPI ------------------------------------------------------------------

#[tokio::test]
async fn test_openapi_spec_served() {
    let response = test_app().oneshot(get("/openapi.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["paths"]["/v1/analyses"].is_object());
    assert!(body["paths"]["/v1/analyses/{id}/export"].is_object());
}
