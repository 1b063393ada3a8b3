use tracing::{debug, info};

use super::{Interrupt, Reconciler};
use crate::domain::{CollectionId, TmdbId};
use crate::services::registry::MovieIdx;
use crate::services::throttle::CallWeight;
use crate::models::MovieFields;

/// Where resolving an owned movie led.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Collection {
        id: CollectionId,
        name: Option<String>,
    },
    /// Resolved, but the movie stands alone.
    NoCollection,
    /// No metadata record could be found this run.
    Unresolved,
}

impl Reconciler {
    /// Maps an owned movie to its collection, cheapest strategy first:
    /// known collection, known TMDB id, IMDb lookup, title search.
    pub(super) async fn resolve(&mut self, idx: MovieIdx) -> Result<Resolution, Interrupt> {
        let movie = self.registry.get(idx).clone();

        if let (Some(_), Some(id)) = (movie.tmdb_id, movie.collection_id) {
            debug!(movie = %movie, collection = %id, "Collection already known");
            return Ok(Resolution::Collection {
                id,
                name: movie.collection_name,
            });
        }

        if let Some(tmdb_id) = movie.tmdb_id {
            return self.resolve_details(idx, tmdb_id).await;
        }

        let hits = if let Some(imdb_id) = movie.imdb_id.as_deref() {
            self.guarded(
                CallWeight::Search,
                "find",
                self.deps.metadata.find_by_imdb(imdb_id),
            )
            .await?
        } else {
            self.guarded(
                CallWeight::Search,
                "search",
                self.deps.metadata.search_movie(&movie.title, movie.year),
            )
            .await?
        };

        let Some(hits) = hits else {
            return Ok(Resolution::Unresolved);
        };

        let Some(first) = hits.first() else {
            info!(movie = %movie, imdb_id = ?movie.imdb_id, "No metadata match, leaving unresolved");
            return Ok(Resolution::Unresolved);
        };

        if hits.len() > 1 {
            debug!(
                movie = %movie,
                matches = hits.len(),
                picked = %first.id,
                "Several matches, using the first"
            );
        }

        let tmdb_id = first.id;
        self.registry.merge(idx, MovieFields::tmdb(tmdb_id));
        self.resolve_details(idx, tmdb_id).await
    }

    async fn resolve_details(
        &mut self,
        idx: MovieIdx,
        tmdb_id: TmdbId,
    ) -> Result<Resolution, Interrupt> {
        let details = self
            .guarded(
                CallWeight::Detail,
                "movie details",
                self.deps.metadata.movie_details(tmdb_id),
            )
            .await?;

        let Some(details) = details else {
            return Ok(Resolution::Unresolved);
        };

        let poster_url = self.poster_url(details.poster_path.as_deref());
        self.registry.merge(
            idx,
            MovieFields {
                imdb_id: details.imdb_id.filter(|id| !id.is_empty()),
                poster_url,
                ..MovieFields::default()
            },
        );

        match details.collection {
            Some(collection) => {
                self.registry.merge(
                    idx,
                    MovieFields::collection(collection.id, collection.name.clone()),
                );
                Ok(Resolution::Collection {
                    id: collection.id,
                    name: collection.name,
                })
            }
            None => Ok(Resolution::NoCollection),
        }
    }

    pub(super) fn poster_url(&self, path: Option<&str>) -> Option<String> {
        let path = path?.trim();
        if path.is_empty() {
            return None;
        }
        Some(format!(
            "{}{path}",
            self.options.image_base_url.trim_end_matches('/')
        ))
    }
}
