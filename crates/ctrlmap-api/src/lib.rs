//! # ctrlmap-api — HTTP Service
//!
//! Hosts mapping analyses as sessions: clients post a source and a target
//! control table, the service runs the mapping pipeline and keeps the result
//! in memory for drill-down, justification and export.
//!
//! ## Architecture
//!
//! - Every analysis shares one [`MappingEngine`](ctrlmap_engine::MappingEngine)
//!   and therefore one embedding cache.
//! - Embedding and justification calls run on the blocking pool; handlers
//!   never hold the store lock across them.
//! - Health probes sit outside the bearer-token middleware.

pub mod auth;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Request body ceiling. Control tables travel as JSON rows.
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Build the complete application router.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    // Authenticated API routes.
    let api = Router::new()
        .merge(routes::analyses::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(axum::Extension(auth_config))
        .with_state(state);

    // Unauthenticated health probes.
    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}
