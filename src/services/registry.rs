//! Movie identity registry.
//!
//! Every movie seen during a run lives exactly once in an arena keyed by its
//! normalized `(title, year)`. Lookups hand out [`MovieIdx`] handles and all
//! enrichment goes through [`MovieRegistry::merge`].

use std::collections::HashMap;
use tracing::debug;

use crate::domain::MovieKey;
use crate::models::{Movie, MovieFields};

/// Handle to a record in a [`MovieRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MovieIdx(usize);

#[derive(Debug, Default)]
pub struct MovieRegistry {
    movies: Vec<Movie>,
    index: HashMap<MovieKey, MovieIdx>,
}

impl MovieRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record for this identity, registering a placeholder if
    /// none exists yet.
    pub fn resolve_or_create(&mut self, title: &str, year: i32) -> MovieIdx {
        let key = MovieKey::new(title, year);
        if let Some(idx) = self.index.get(&key) {
            return *idx;
        }

        let idx = MovieIdx(self.movies.len());
        self.movies.push(Movie::new(title.trim(), year));
        self.index.insert(key, idx);
        idx
    }

    /// Applies the present fields of `fields` to the record.
    ///
    /// A replacement title that would change the identity is dropped.
    pub fn merge(&mut self, idx: MovieIdx, mut fields: MovieFields) {
        let movie = &mut self.movies[idx.0];

        if let Some(title) = &fields.title
            && MovieKey::new(title, movie.year) != movie.key()
        {
            debug!(
                current = %movie.title,
                proposed = %title,
                "Ignoring title that changes movie identity"
            );
            fields.title = None;
        }

        movie.apply(fields);
    }

    #[must_use]
    pub fn get(&self, idx: MovieIdx) -> &Movie {
        &self.movies[idx.0]
    }

    #[must_use]
    pub fn key(&self, idx: MovieIdx) -> MovieKey {
        self.movies[idx.0].key()
    }

    /// Registers previously known movies, merging into existing records.
    pub fn seed(&mut self, movies: impl IntoIterator<Item = Movie>) {
        for movie in movies {
            let idx = self.resolve_or_create(&movie.title, movie.year);
            self.merge(idx, MovieFields::from(&movie));
        }
    }

    /// Copies of every record in registration order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Movie> {
        self.movies.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.movies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CollectionId, TmdbId};

    #[test]
    fn same_identity_same_record() {
        let mut registry = MovieRegistry::new();
        let a = registry.resolve_or_create("Mission: Impossible", 1996);
        let b = registry.resolve_or_create("Mission Impossible", 1996);
        let c = registry.resolve_or_create("Mission Impossible", 2023);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn merge_is_monotonic() {
        let mut registry = MovieRegistry::new();
        let idx = registry.resolve_or_create("Alien", 1979);

        registry.merge(idx, MovieFields::tmdb(TmdbId::new(348)));
        registry.merge(
            idx,
            MovieFields::collection(CollectionId::new(8091), Some("Alien Collection".into())),
        );
        registry.merge(idx, MovieFields::default());

        let movie = registry.get(idx);
        assert_eq!(movie.tmdb_id, Some(TmdbId::new(348)));
        assert_eq!(movie.collection_id, Some(CollectionId::new(8091)));
    }

    #[test]
    fn merge_keeps_identity_stable() {
        let mut registry = MovieRegistry::new();
        let idx = registry.resolve_or_create("Alien", 1979);

        registry.merge(
            idx,
            MovieFields {
                title: Some("Aliens".to_string()),
                ..MovieFields::default()
            },
        );
        assert_eq!(registry.get(idx).title, "Alien");

        registry.merge(
            idx,
            MovieFields {
                title: Some("Alien ".to_string()),
                ..MovieFields::default()
            },
        );
        assert_eq!(registry.resolve_or_create("Alien", 1979), idx);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn seed_merges_known_movies() {
        let mut registry = MovieRegistry::new();
        let owned = registry.resolve_or_create("Alien", 1979);

        let mut known = Movie::new("Alien", 1979);
        known.tmdb_id = Some(TmdbId::new(348));
        registry.seed([known, Movie::new("Aliens", 1986)]);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(owned).tmdb_id, Some(TmdbId::new(348)));
        assert_eq!(registry.snapshot()[1].title, "Aliens");
    }
}
