use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::library::LibraryEntry;

#[derive(Debug, Deserialize)]
struct MediaContainer {
    #[serde(rename = "Video", default)]
    videos: Vec<PlexVideo>,

    #[serde(rename = "Directory", default)]
    directories: Vec<PlexDirectory>,
}

#[derive(Debug, Deserialize)]
struct PlexVideo {
    #[serde(rename = "@title")]
    title: Option<String>,

    #[serde(rename = "@year")]
    year: Option<String>,

    #[serde(rename = "@guid")]
    guid: Option<String>,

    #[serde(rename = "Guid", default)]
    guids: Vec<PlexGuid>,
}

#[derive(Debug, Deserialize)]
struct PlexGuid {
    #[serde(rename = "@id")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct PlexDirectory {
    #[serde(rename = "@key")]
    key: String,

    #[serde(rename = "@type")]
    kind: Option<String>,

    #[serde(rename = "@title")]
    title: Option<String>,
}

/// A Plex library section holding movies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlexLibrary {
    pub key: String,
    pub title: String,
}

#[derive(Clone)]
pub struct PlexClient {
    client: Client,
}

impl PlexClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(read_timeout)
            .user_agent(concat!("Gaps/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        Ok(Self { client })
    }

    /// Fetches and parses one library section listing.
    pub async fn fetch_library(&self, url: &str) -> Result<Vec<LibraryEntry>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Plex request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(anyhow::anyhow!("Plex API error: {status}"));
        }

        let body = response.text().await?;
        parse_library(&body)
    }

    /// Lists the movie sections of a Plex server.
    pub async fn movie_libraries(&self, server_url: &str, token: &str) -> Result<Vec<PlexLibrary>> {
        let url = format!(
            "{}/library/sections?X-Plex-Token={}",
            server_url.trim_end_matches('/'),
            urlencoding::encode(token)
        );

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(anyhow::anyhow!("Plex API error: {status}"));
        }

        let body = response.text().await?;
        parse_sections(&body)
    }
}

/// Parses a `/library/sections/{key}/all` response.
pub fn parse_library(xml: &str) -> Result<Vec<LibraryEntry>> {
    if xml.trim().is_empty() {
        anyhow::bail!("Plex returned an empty body");
    }

    let container: MediaContainer =
        quick_xml::de::from_str(xml).context("Failed to parse Plex library XML")?;

    let mut entries = Vec::with_capacity(container.videos.len());
    for video in container.videos {
        let Some(title) = video.title.filter(|t| !t.trim().is_empty()) else {
            warn!(guid = ?video.guid, "Plex entry has no title, skipping");
            continue;
        };

        let year = video.year.as_deref().and_then(|y| y.trim().parse::<i32>().ok());

        let mut entry = LibraryEntry::new(title, year);
        if let Some(guid) = video.guid {
            entry.guids.push(guid);
        }
        entry.guids.extend(video.guids.into_iter().map(|g| g.id));

        entries.push(entry);
    }

    debug!(count = entries.len(), "Parsed Plex library");
    Ok(entries)
}

/// Parses a `/library/sections` response, keeping movie sections only.
pub fn parse_sections(xml: &str) -> Result<Vec<PlexLibrary>> {
    let container: MediaContainer =
        quick_xml::de::from_str(xml).context("Failed to parse Plex sections XML")?;

    Ok(container
        .directories
        .into_iter()
        .filter(|d| d.kind.as_deref() == Some("movie"))
        .map(|d| PlexLibrary {
            title: d.title.unwrap_or_else(|| d.key.clone()),
            key: d.key,
        })
        .collect())
}
