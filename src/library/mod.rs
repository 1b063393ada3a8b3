//! Library sources: where the owned-movie inventory comes from.

pub mod folder;
pub mod plex;

use async_trait::async_trait;
use std::fmt;

use crate::constants::guid;
use crate::domain::TmdbId;

pub use folder::FolderSource;
pub use plex::PlexSource;

/// One movie as reported by a library source, before reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryEntry {
    pub title: String,
    pub year: Option<i32>,
    /// Raw provider identifiers, e.g. `com.plexapp.agents.imdb://tt0133093?lang=en`.
    pub guids: Vec<String>,
}

impl LibraryEntry {
    #[must_use]
    pub fn new(title: impl Into<String>, year: Option<i32>) -> Self {
        Self {
            title: title.into(),
            year,
            guids: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guids.push(guid.into());
        self
    }

    /// Every identifier this entry carries that could be classified.
    #[must_use]
    pub fn provider_ids(&self) -> Vec<ProviderId> {
        self.guids
            .iter()
            .filter_map(|g| classify_guid(g))
            .collect()
    }
}

/// A classified provider identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderId {
    Tmdb(TmdbId),
    Imdb(String),
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tmdb(id) => write!(f, "tmdb:{id}"),
            Self::Imdb(id) => write!(f, "imdb:{id}"),
        }
    }
}

/// Classifies a provider identifier string by its prefix.
///
/// Returns `None` for anything that carries no usable id (new Plex agent
/// guids, `local://`, malformed numbers). Query strings such as `?lang=en` are
/// ignored.
#[must_use]
pub fn classify_guid(raw: &str) -> Option<ProviderId> {
    let raw = raw.trim();

    let tmdb = raw
        .strip_prefix(guid::PLEX_TMDB_AGENT)
        .or_else(|| raw.strip_prefix(guid::TMDB_SCHEME));
    if let Some(rest) = tmdb {
        return strip_query(rest)
            .parse::<u64>()
            .ok()
            .map(|id| ProviderId::Tmdb(TmdbId::new(id)));
    }

    let imdb = raw
        .strip_prefix(guid::PLEX_IMDB_AGENT)
        .or_else(|| raw.strip_prefix(guid::IMDB_SCHEME));
    if let Some(rest) = imdb {
        let id = strip_query(rest);
        if id.starts_with("tt") && id.len() > 2 {
            return Some(ProviderId::Imdb(id.to_string()));
        }
        return None;
    }

    None
}

fn strip_query(s: &str) -> &str {
    s.split(['?', '/']).next().unwrap_or(s)
}

/// Anything that can list owned movies.
#[async_trait]
pub trait LibrarySource: Send + Sync {
    /// Human readable name used in logs.
    fn name(&self) -> String;

    /// Lists every movie in this source. An empty listing is not an error.
    async fn list_movies(&self) -> anyhow::Result<Vec<LibraryEntry>>;
}
