//! Metadata service seam.
//!
//! This module provides the [`MetadataService`] trait consumed by the
//! reconciliation loop. The production implementation is
//! [`crate::clients::tmdb::TmdbClient`]; tests plug in in-memory fakes.

use crate::domain::{CollectionId, TmdbId};
use crate::models::{CollectionDetails, MovieDetails, MovieHit};
use thiserror::Error;

/// Errors returned by a metadata service call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MetadataError {
    #[error("Metadata service rejected the API key")]
    Unauthorized,

    #[error("Not found")]
    NotFound,

    #[error("Metadata service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl MetadataError {
    /// Whether a run can not possibly continue after this error.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Movie metadata lookups used during reconciliation.
#[async_trait::async_trait]
pub trait MetadataService: Send + Sync {
    /// Free-text search by title, narrowed by release year when non-zero.
    async fn search_movie(&self, title: &str, year: i32) -> Result<Vec<MovieHit>, MetadataError>;

    /// Looks a movie up by its IMDb id.
    async fn find_by_imdb(&self, imdb_id: &str) -> Result<Vec<MovieHit>, MetadataError>;

    /// Full record, including the parent collection if any.
    async fn movie_details(&self, id: TmdbId) -> Result<MovieDetails, MetadataError>;

    /// Collection membership.
    async fn collection(&self, id: CollectionId) -> Result<CollectionDetails, MetadataError>;
}
