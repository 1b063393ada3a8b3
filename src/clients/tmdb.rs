use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::TmdbConfig;
use crate::domain::{CollectionId, TmdbId};
use crate::models::{CollectionDetails, MovieDetails, MovieHit};
use crate::services::metadata::{MetadataError, MetadataService};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<MovieHit>,
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(default)]
    movie_results: Vec<MovieHit>,
}

#[derive(Debug, Deserialize)]
struct RequestTokenResponse {
    #[serde(default)]
    success: bool,
    request_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct SessionRequest<'a> {
    request_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(default)]
    success: bool,
    session_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct AddItemRequest {
    media_id: u64,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    status_code: i32,
    #[serde(default)]
    status_message: String,
}

/// TMDB v3 API client.
#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &TmdbConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .user_agent(concat!("Gaps/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, MetadataError> {
        let mut url = Url::parse(&format!("{}{path}", self.base_url))
            .map_err(|e| MetadataError::Transport(format!("Invalid TMDB URL: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("api_key", &self.api_key);
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, MetadataError> {
        let url = self.url(path, query)?;
        debug!(path, "TMDB GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MetadataError::Transport(e.without_url().to_string()))?;

        decode(response).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<T, MetadataError> {
        let url = self.url(path, query)?;
        debug!(path, "TMDB POST");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| MetadataError::Transport(e.without_url().to_string()))?;

        decode(response).await
    }

    /// Step one of the session exchange: a token the user has to approve.
    pub async fn request_token(&self) -> Result<String, MetadataError> {
        let response: RequestTokenResponse =
            self.get_json("/authentication/token/new", &[]).await?;

        match response.request_token {
            Some(token) if response.success => Ok(token),
            _ => Err(MetadataError::Decode("no request token issued".to_string())),
        }
    }

    /// Step two: trade an approved request token for a session id.
    pub async fn create_session(&self, request_token: &str) -> Result<String, MetadataError> {
        let response: SessionResponse = self
            .post_json(
                "/authentication/session/new",
                &[],
                &SessionRequest { request_token },
            )
            .await?;

        match response.session_id {
            Some(id) if response.success => Ok(id),
            _ => Err(MetadataError::Unauthorized),
        }
    }

    pub async fn add_list_item(
        &self,
        list_id: &str,
        session_id: &str,
        movie: TmdbId,
    ) -> Result<(), MetadataError> {
        let path = format!("/list/{}/add_item", urlencoding::encode(list_id));
        let response: StatusResponse = self
            .post_json(
                &path,
                &[("session_id", session_id.to_string())],
                &AddItemRequest {
                    media_id: movie.value(),
                },
            )
            .await?;

        // 12 = item updated, 1 = success
        if matches!(response.status_code, 1 | 12) {
            Ok(())
        } else {
            Err(MetadataError::Status {
                status: 200,
                body: response.status_message,
            })
        }
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, MetadataError> {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
        return Err(MetadataError::Unauthorized);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(MetadataError::NotFound);
    }

    let body = response
        .text()
        .await
        .map_err(|e| MetadataError::Transport(e.without_url().to_string()))?;

    if !status.is_success() {
        return Err(MetadataError::Status {
            status: status.as_u16(),
            body,
        });
    }

    if body.trim().is_empty() {
        return Err(MetadataError::Decode("empty body".to_string()));
    }

    serde_json::from_str(&body).map_err(|e| MetadataError::Decode(e.to_string()))
}

#[async_trait]
impl MetadataService for TmdbClient {
    async fn search_movie(&self, title: &str, year: i32) -> Result<Vec<MovieHit>, MetadataError> {
        let mut query = vec![("query", title.to_string())];
        if year > 0 {
            query.push(("year", year.to_string()));
        }

        let response: SearchResponse = self.get_json("/search/movie", &query).await?;
        Ok(response.results)
    }

    async fn find_by_imdb(&self, imdb_id: &str) -> Result<Vec<MovieHit>, MetadataError> {
        let path = format!("/find/{}", urlencoding::encode(imdb_id));
        let response: FindResponse = self
            .get_json(&path, &[("external_source", "imdb_id".to_string())])
            .await?;
        Ok(response.movie_results)
    }

    async fn movie_details(&self, id: TmdbId) -> Result<MovieDetails, MetadataError> {
        self.get_json(&format!("/movie/{id}"), &[]).await
    }

    async fn collection(&self, id: CollectionId) -> Result<CollectionDetails, MetadataError> {
        self.get_json(&format!("/collection/{id}"), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_urls_with_api_key() {
        let config = TmdbConfig {
            api_key: "k".to_string(),
            base_url: "https://api.themoviedb.org/3/".to_string(),
            ..TmdbConfig::default()
        };
        let client = TmdbClient::new(&config).unwrap();

        let url = client
            .url("/search/movie", &[("query", "Alien Covenant".to_string())])
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://api.themoviedb.org/3/search/movie?api_key=k&query=Alien+Covenant"
        );
    }
}
