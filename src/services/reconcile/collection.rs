use tracing::{debug, info, warn};

use super::{Interrupt, Reconciler};
use crate::domain::CollectionId;
use crate::models::{CollectionPart, Movie, MovieFields};
use crate::services::registry::MovieIdx;
use crate::services::throttle::CallWeight;

impl Reconciler {
    /// Diffs a collection against owned and searched movies, recommending
    /// every released member that is neither.
    ///
    /// `parent` is marked searched whatever happens to the collection call.
    pub(super) async fn expand(
        &mut self,
        parent: MovieIdx,
        id: CollectionId,
        name: Option<String>,
    ) -> Result<(), Interrupt> {
        let parent_key = self.registry.key(parent);
        self.registry
            .merge(parent, MovieFields::collection(id, name.clone()));

        if self.expanded.contains(&id) {
            debug!(movie = %parent_key, collection = %id, "Collection already expanded");
            self.searched.insert(parent_key);
            self.publish_progress(None);
            return Ok(());
        }

        let collection = self
            .guarded(
                CallWeight::Detail,
                "collection",
                self.deps.metadata.collection(id),
            )
            .await?;

        match collection {
            Some(collection) => {
                self.expanded.insert(id);
                let name = collection.name.clone().or(name);
                if name.is_some() {
                    self.registry
                        .merge(parent, MovieFields::collection(id, name.clone()));
                }

                debug!(
                    collection = %id,
                    name = name.as_deref().unwrap_or("-"),
                    members = collection.parts.len(),
                    "Expanding collection"
                );

                for part in &collection.parts {
                    self.diff_member(part, id, name.as_deref()).await?;
                }
            }
            None => {
                warn!(movie = %parent_key, collection = %id, "Collection lookup failed");
            }
        }

        self.searched.insert(parent_key);
        Ok(())
    }

    async fn diff_member(
        &mut self,
        part: &CollectionPart,
        collection_id: CollectionId,
        collection_name: Option<&str>,
    ) -> Result<(), Interrupt> {
        let Some(year) = part.release_year() else {
            warn!(
                title = %part.title,
                release_date = ?part.release_date,
                "Collection member has no usable release date, skipping"
            );
            return Ok(());
        };

        let idx = self.registry.resolve_or_create(&part.title, year);
        let poster_url = self.poster_url(part.poster_path.as_deref());
        self.registry.merge(
            idx,
            MovieFields {
                tmdb_id: Some(part.id),
                poster_url,
                collection_id: Some(collection_id),
                collection_name: collection_name.map(ToString::to_string),
                ..MovieFields::default()
            },
        );
        let key = self.registry.key(idx);

        if self.owned.contains(&key) {
            self.searched.insert(key);
            self.publish_progress(None);
            return Ok(());
        }

        if self.searched.contains(&key) || year >= self.options.current_year {
            self.publish_progress(None);
            return Ok(());
        }

        let details = self
            .guarded(
                CallWeight::Detail,
                "member details",
                self.deps.metadata.movie_details(part.id),
            )
            .await?;

        let Some(details) = details else {
            warn!(title = %part.title, "Skipping member without details");
            return Ok(());
        };

        let canonical = Some(details.title).filter(|t| !t.trim().is_empty());
        self.registry.merge(
            idx,
            MovieFields {
                title: canonical.clone(),
                imdb_id: details.imdb_id.filter(|id| !id.is_empty()),
                ..MovieFields::default()
            },
        );

        // The registry keeps the part title when the canonical one would
        // change its key; the recommendation always shows the canonical one.
        let record = self.registry.get(idx).clone();
        let recommendation = Movie {
            title: canonical.unwrap_or_else(|| record.title.clone()),
            collection_id: Some(collection_id),
            collection_name: collection_name.map(ToString::to_string),
            ..record
        };

        info!(
            event = "recommendation_found",
            movie = %recommendation,
            collection = collection_name.unwrap_or("-"),
            "Missing movie found"
        );

        self.recommended.push(recommendation.clone());
        self.handle.push_recommended(recommendation.clone());
        self.searched.insert(key);

        if let Err(e) = self.deps.sink.persist_partial(&self.recommended).await {
            warn!(error = %e, "Failed to write partial recommendations");
        }

        self.publish_progress(Some(recommendation));
        Ok(())
    }
}
