use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::services::output::read_rss;

/// `GET /rss`
///
/// Serves the feed written by the last run.
pub async fn get_feed(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let output = state.config().read().await.output.clone();

    let feed = read_rss(&output)
        .await?
        .ok_or_else(|| ApiError::not_found("Feed", output.rss_path().display()))?;

    Ok((
        [(header::CONTENT_TYPE, "application/rss+xml; charset=utf-8")],
        feed,
    )
        .into_response())
}
