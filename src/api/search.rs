//! Search lifecycle endpoints.

use axum::{Json, extract::State, http::StatusCode};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::models::Movie;
use crate::services::RunStatus;

/// `POST /api/search`
///
/// Starts a run in the background and answers immediately. Progress is
/// streamed over `/api/events`.
pub async fn start_search(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<ApiResponse<RunStatus>>), ApiError> {
    let started = state.supervisor().start().await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::success(started.handle.status())),
    ))
}

/// `POST /api/search/cancel`
pub async fn cancel_search(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<RunStatus>>, ApiError> {
    let handle = state.supervisor().cancel().await?;
    Ok(Json(ApiResponse::success(handle.status())))
}

/// `GET /api/search/status`
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<RunStatus>>, ApiError> {
    let status = state
        .supervisor()
        .status()
        .await
        .ok_or_else(|| ApiError::NotFound("No search has been started".to_string()))?;
    Ok(Json(ApiResponse::success(status)))
}

/// `GET /api/search/recommended`
///
/// Recommendations of the latest run, partial while it is still going.
pub async fn get_recommended(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Vec<Movie>>> {
    Json(ApiResponse::success(state.supervisor().recommended().await))
}
