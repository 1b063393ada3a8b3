use serde::{Deserialize, Serialize};

use crate::domain::{CollectionId, MovieKey, TmdbId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Movie {
    pub title: String,

    /// Release year, 0 when unknown.
    pub year: i32,

    pub tmdb_id: Option<TmdbId>,

    pub imdb_id: Option<String>,

    pub collection_id: Option<CollectionId>,

    pub collection_name: Option<String>,

    pub poster_url: Option<String>,
}

impl Movie {
    #[must_use]
    pub fn new(title: impl Into<String>, year: i32) -> Self {
        Self {
            title: title.into(),
            year,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn key(&self) -> MovieKey {
        MovieKey::new(&self.title, self.year)
    }

    /// Overwrites every field that `fields` carries. Absent fields never
    /// clear what is already known.
    pub fn apply(&mut self, fields: MovieFields) {
        let MovieFields {
            title,
            tmdb_id,
            imdb_id,
            collection_id,
            collection_name,
            poster_url,
        } = fields;

        if let Some(title) = title {
            self.title = title;
        }
        if tmdb_id.is_some() {
            self.tmdb_id = tmdb_id;
        }
        if imdb_id.is_some() {
            self.imdb_id = imdb_id;
        }
        if collection_id.is_some() {
            self.collection_id = collection_id;
        }
        if collection_name.is_some() {
            self.collection_name = collection_name;
        }
        if poster_url.is_some() {
            self.poster_url = poster_url;
        }
    }

    #[must_use]
    pub fn imdb_url(&self) -> Option<String> {
        self.imdb_id
            .as_deref()
            .map(|id| format!("https://www.imdb.com/title/{id}/"))
    }

    #[must_use]
    pub fn tmdb_url(&self) -> Option<String> {
        self.tmdb_id
            .map(|id| format!("https://www.themoviedb.org/movie/{id}"))
    }
}

impl std::fmt::Display for Movie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.title, self.year)
    }
}

/// Partial set of movie fields discovered by one lookup.
///
/// Title and year are not mergeable identity fields; `title` only replaces the
/// display title with a canonical one and must normalize to the same key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieFields {
    pub title: Option<String>,
    pub tmdb_id: Option<TmdbId>,
    pub imdb_id: Option<String>,
    pub collection_id: Option<CollectionId>,
    pub collection_name: Option<String>,
    pub poster_url: Option<String>,
}

impl MovieFields {
    #[must_use]
    pub fn tmdb(id: TmdbId) -> Self {
        Self {
            tmdb_id: Some(id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn collection(id: CollectionId, name: Option<String>) -> Self {
        Self {
            collection_id: Some(id),
            collection_name: name,
            ..Self::default()
        }
    }
}

impl From<&Movie> for MovieFields {
    fn from(movie: &Movie) -> Self {
        Self {
            title: None,
            tmdb_id: movie.tmdb_id,
            imdb_id: movie.imdb_id.clone(),
            collection_id: movie.collection_id,
            collection_name: movie.collection_name.clone(),
            poster_url: movie.poster_url.clone(),
        }
    }
}
