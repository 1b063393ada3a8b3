use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{CollectionId, TmdbId};

/// One entry of a search or find response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MovieHit {
    pub id: TmdbId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MovieDetails {
    pub id: TmdbId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default, rename = "belongs_to_collection")]
    pub collection: Option<CollectionRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionRef {
    pub id: CollectionId,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionDetails {
    pub id: CollectionId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parts: Vec<CollectionPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionPart {
    pub id: TmdbId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

impl CollectionPart {
    /// Year of a `YYYY-MM-DD` release date. `None` for missing, empty or
    /// malformed dates.
    #[must_use]
    pub fn release_year(&self) -> Option<i32> {
        release_year(self.release_date.as_deref())
    }
}

#[must_use]
pub fn release_year(date: Option<&str>) -> Option<i32> {
    use chrono::Datelike;

    let date = date?.trim();
    if date.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .map(|d| d.year())
}
