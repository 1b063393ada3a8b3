use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, LibraryDto};
use crate::clients::plex::PlexClient;

/// `GET /api/libraries`
///
/// Movie sections of the configured Plex server. The listing URLs are
/// returned without the token.
pub async fn list_libraries(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<LibraryDto>>>, ApiError> {
    let plex = state.config().read().await.plex.clone();

    let (Some(server_url), Some(token)) = (plex.server_url.as_deref(), plex.token.as_deref())
    else {
        return Err(ApiError::validation(
            "plex.server_url and plex.token must be set to list libraries",
        ));
    };

    let client = PlexClient::new(plex.connect_timeout(), plex.read_timeout())?;
    let libraries = client
        .movie_libraries(server_url, token)
        .await
        .map_err(|e| ApiError::plex_error(e.to_string()))?;

    let server = server_url.trim_end_matches('/');
    let dtos = libraries
        .into_iter()
        .map(|lib| LibraryDto {
            url: format!("{server}/library/sections/{}/all/", lib.key),
            key: lib.key,
            title: lib.title,
        })
        .collect();

    Ok(Json(ApiResponse::success(dtos)))
}
