use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::registry::{MovieIdx, MovieRegistry};
use crate::domain::MovieKey;
use crate::library::{LibraryEntry, LibrarySource, ProviderId};
use crate::models::MovieFields;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error("No library source configured")]
    NoSources,

    #[error("All {0} library sources failed")]
    AllSourcesFailed(usize),
}

/// Movies the user already owns, in the order the sources listed them.
#[derive(Debug, Default)]
pub struct OwnedSet {
    order: Vec<MovieIdx>,
    keys: HashSet<MovieKey>,
}

impl OwnedSet {
    #[must_use]
    pub fn contains(&self, key: &MovieKey) -> bool {
        self.keys.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = MovieIdx> + '_ {
        self.order.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Adds one library entry. Returns `true` when it introduced a new owned
    /// identity.
    pub fn add_entry(&mut self, entry: &LibraryEntry, registry: &mut MovieRegistry) -> bool {
        let Some(year) = entry.year else {
            warn!(title = %entry.title, "Owned movie has no year, skipping");
            return false;
        };

        let idx = registry.resolve_or_create(&entry.title, year);

        let ids = entry.provider_ids();
        if ids.is_empty() && !entry.guids.is_empty() {
            debug!(title = %entry.title, guids = ?entry.guids, "Cannot handle guid, falling back to title search");
        }
        for id in ids {
            let fields = match id {
                ProviderId::Tmdb(tmdb_id) => MovieFields::tmdb(tmdb_id),
                ProviderId::Imdb(imdb_id) => MovieFields {
                    imdb_id: Some(imdb_id),
                    ..MovieFields::default()
                },
            };
            registry.merge(idx, fields);
        }

        let key = registry.key(idx);
        if self.keys.insert(key) {
            self.order.push(idx);
            true
        } else {
            false
        }
    }
}

/// Builds the owned set from every source.
///
/// A failing or empty source is logged and skipped. `total` is bumped once per
/// new owned identity so progress readers see the inventory grow.
pub async fn build_owned(
    sources: &[Arc<dyn LibrarySource>],
    registry: &mut MovieRegistry,
    total: &AtomicUsize,
) -> Result<OwnedSet, InventoryError> {
    if sources.is_empty() {
        return Err(InventoryError::NoSources);
    }

    let mut owned = OwnedSet::default();
    let mut failed = 0usize;

    for source in sources {
        let name = source.name();
        let entries = match source.list_movies().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(source = %name, error = %e, "Library source failed, skipping");
                failed += 1;
                continue;
            }
        };

        if entries.is_empty() {
            warn!(source = %name, "Library source returned no movies");
            continue;
        }

        let mut added = 0usize;
        for entry in &entries {
            if owned.add_entry(entry, registry) {
                total.fetch_add(1, Ordering::Relaxed);
                added += 1;
            }
        }

        info!(
            event = "library_source_loaded",
            source = %name,
            entries = entries.len(),
            new_movies = added,
            "Loaded library source"
        );
    }

    if failed == sources.len() {
        return Err(InventoryError::AllSourcesFailed(failed));
    }

    Ok(owned)
}
