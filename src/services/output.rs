//! Result persistence: the recommendation feed and the known-movie cache.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::OutputConfig;
use crate::models::Movie;

/// Where a run's results end up.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Called after every new recommendation.
    async fn persist_partial(&self, movies: &[Movie]) -> Result<()>;

    /// Called once when the run ends, including after cancellation.
    async fn persist_final(&self, movies: &[Movie]) -> Result<()>;

    /// Movie identities remembered from earlier runs.
    async fn load_known(&self) -> Result<Vec<Movie>>;

    async fn persist_known(&self, movies: &[Movie]) -> Result<()>;
}

/// Writes `recommended.json`, `recommended.rss` and the known-movie cache.
pub struct FileOutput {
    config: OutputConfig,
}

impl FileOutput {
    #[must_use]
    pub const fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    async fn write_recommended(&self, movies: &[Movie]) -> Result<()> {
        if !self.config.write_to_file {
            return Ok(());
        }

        let json = serde_json::to_vec_pretty(movies)?;
        write_atomic(&self.config.json_path(), &json).await?;

        let rss = render_rss(movies)?;
        write_atomic(&self.config.rss_path(), rss.as_bytes()).await?;

        Ok(())
    }
}

#[async_trait]
impl ResultSink for FileOutput {
    async fn persist_partial(&self, movies: &[Movie]) -> Result<()> {
        debug!(count = movies.len(), "Writing partial recommendations");
        self.write_recommended(movies).await
    }

    async fn persist_final(&self, movies: &[Movie]) -> Result<()> {
        self.write_recommended(movies).await?;
        if self.config.write_to_file {
            info!(
                count = movies.len(),
                path = %self.config.json_path().display(),
                "Recommendations written"
            );
        }
        Ok(())
    }

    async fn load_known(&self) -> Result<Vec<Movie>> {
        let path = self.config.known_movies_path();
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };

        serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    async fn persist_known(&self, movies: &[Movie]) -> Result<()> {
        let json = serde_json::to_vec_pretty(movies)?;
        write_atomic(&self.config.known_movies_path(), &json).await
    }
}

/// Reads the RSS feed written by the last run.
pub async fn read_rss(config: &OutputConfig) -> Result<Option<String>> {
    match tokio::fs::read_to_string(config.rss_path()).await {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let tmp = tmp_path(path);

    tokio::fs::write(&tmp, bytes)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;

    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        warn!(path = %path.display(), error = %e, "Rename failed, writing in place");
        tokio::fs::write(path, bytes).await?;
        let _ = tokio::fs::remove_file(&tmp).await;
    }

    Ok(())
}

/// `recommended.json` becomes `recommended.json.tmp`.
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[derive(Serialize)]
struct Rss<'a> {
    #[serde(rename = "@version")]
    version: &'static str,
    channel: Channel<'a>,
}

#[derive(Serialize)]
struct Channel<'a> {
    title: &'static str,
    link: &'static str,
    description: &'static str,
    #[serde(rename = "item")]
    items: Vec<Item<'a>>,
}

#[derive(Serialize)]
struct Item<'a> {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<String>,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    guid: Option<String>,
}

/// Renders recommendations as an RSS 2.0 document.
pub fn render_rss(movies: &[Movie]) -> Result<String> {
    let items = movies
        .iter()
        .map(|m| {
            let collection = m.collection_name.as_deref();
            Item {
                title: m.to_string(),
                link: m.imdb_url().or_else(|| m.tmdb_url()),
                description: collection.map_or_else(
                    || format!("{m} is missing from your library"),
                    |c| format!("{m} from {c} is missing from your library"),
                ),
                category: collection,
                guid: m.tmdb_id.map(|id| format!("tmdb-{id}")),
            }
        })
        .collect();

    let rss = Rss {
        version: "2.0",
        channel: Channel {
            title: "Gaps",
            link: "https://www.themoviedb.org",
            description: "Movies missing from your collections",
            items,
        },
    };

    let body = quick_xml::se::to_string_with_root("rss", &rss).context("Failed to render RSS")?;
    Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{body}"))
}
