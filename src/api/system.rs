//! System API endpoints.

use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiResponse, AppState, SystemStatus};
use crate::config::Config;

#[derive(Debug, Serialize)]
pub struct HealthLiveResponse {
    pub status: &'static str,
}

/// `GET /api/system/health/live`
pub async fn health_live() -> impl IntoResponse {
    Json(ApiResponse::success(HealthLiveResponse { status: "alive" }))
}

/// Returns process information and the state of the latest run.
///
/// # Endpoint
/// `GET /api/system/status`
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<ApiResponse<SystemStatus>> {
    let supervisor = state.supervisor();
    let tmdb_configured = state.config().read().await.tmdb.has_api_key();

    let status = SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        sources: supervisor.source_count(),
        tmdb_configured,
        list_configured: supervisor.has_list(),
        phase: supervisor.phase().await,
        search: supervisor.status().await,
    };

    Json(ApiResponse::success(status))
}

/// Returns the loaded configuration with secrets masked.
///
/// # Endpoint
/// `GET /api/system/config`
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Config>> {
    let config = state.config().read().await.redacted();
    Json(ApiResponse::success(config))
}
