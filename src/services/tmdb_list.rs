//! Pushing recommendations to a user-curated TMDB list.

use async_trait::async_trait;
use serde::Serialize;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::metadata::MetadataError;
use super::throttle::{CallWeight, Throttle};
use crate::clients::tmdb::TmdbClient;
use crate::domain::TmdbId;
use crate::domain::events::{EventPublisher, NotificationEvent};
use crate::models::Movie;

/// A remote list movies can be added to.
#[async_trait]
pub trait ExternalList: Send + Sync {
    fn list_id(&self) -> &str;

    async fn add_movie(&self, id: TmdbId) -> Result<(), MetadataError>;
}

/// Aggregate result of one population pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListReport {
    pub list_id: String,
    pub added: usize,
    pub failed: usize,
    /// Movies without a TMDB id.
    pub skipped: usize,
}

/// Adds every movie to `list`. Per-item failures are counted, never fatal.
pub async fn populate(
    list: &dyn ExternalList,
    movies: &[Movie],
    throttle: &Throttle,
    events: &dyn EventPublisher,
) -> ListReport {
    let mut report = ListReport {
        list_id: list.list_id().to_string(),
        ..ListReport::default()
    };
    let never = CancellationToken::new();

    for movie in movies {
        let Some(id) = movie.tmdb_id else {
            report.skipped += 1;
            continue;
        };

        if throttle.acquire(CallWeight::Detail, &never).await.is_err() {
            break;
        }

        match list.add_movie(id).await {
            Ok(()) => report.added += 1,
            Err(e) => {
                warn!(movie = %movie, error = %e, "Failed to add movie to list");
                report.failed += 1;
            }
        }
    }

    info!(
        event = "list_updated",
        list_id = %report.list_id,
        added = report.added,
        failed = report.failed,
        url = %format!("https://www.themoviedb.org/list/{}", report.list_id),
        "TMDB list updated"
    );
    events.publish(NotificationEvent::ListUpdated {
        list_id: report.list_id.clone(),
        added: report.added,
        failed: report.failed,
    });

    report
}

/// A TMDB list bound to an authorized session.
pub struct TmdbList {
    client: TmdbClient,
    list_id: String,
    session_id: String,
}

impl TmdbList {
    /// Runs the request-token, approval, session exchange.
    ///
    /// `approve` receives the URL the user has to open and resolves once they
    /// are done (or gave up waiting).
    pub async fn authorize<F, Fut>(
        client: TmdbClient,
        list_id: String,
        approve: F,
    ) -> Result<Self, MetadataError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = ()>,
    {
        let token = client.request_token().await?;
        approve(format!("https://www.themoviedb.org/authenticate/{token}")).await;
        let session_id = client.create_session(&token).await?;

        info!(list_id = %list_id, "TMDB session established");
        Ok(Self {
            client,
            list_id,
            session_id,
        })
    }
}

#[async_trait]
impl ExternalList for TmdbList {
    fn list_id(&self) -> &str {
        &self.list_id
    }

    async fn add_movie(&self, id: TmdbId) -> Result<(), MetadataError> {
        self.client
            .add_list_item(&self.list_id, &self.session_id, id)
            .await
    }
}
