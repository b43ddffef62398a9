//! Health check endpoints

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::ApiState;

/// Liveness response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Liveness probe - is the service running?
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build health router (liveness only, no state needed)
pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

/// Upstream reachability report
#[derive(Serialize)]
pub struct UpstreamHealth {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub model: String,
}

/// Report whether the upstream can serve completions
///
/// Checks credentials first (no I/O), then attempts a minimal probe call.
/// Always answers 200; unavailability is data, not an error.
async fn health_groq(State(state): State<Arc<ApiState>>) -> Json<UpstreamHealth> {
    let model = state.backend.model().to_string();

    let report = match state.backend.probe().await {
        Ok(()) => UpstreamHealth {
            available: true,
            reason: None,
            model,
        },
        Err(e) => UpstreamHealth {
            available: false,
            reason: Some(e.to_string()),
            model,
        },
    };

    Json(report)
}

/// Build upstream health router (needs state for the probe)
pub fn upstream_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health_groq", get(health_groq))
        .with_state(state)
}
