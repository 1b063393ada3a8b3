use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::{LibraryEntry, LibrarySource};
use crate::config::FolderConfig;

/// Movies stored as files named like `Title (1999).mkv`.
pub struct FolderSource {
    root: PathBuf,
    recursive: bool,
    extensions: Vec<String>,
    year_pattern: Regex,
}

impl FolderSource {
    pub fn new(root: impl Into<PathBuf>, config: &FolderConfig) -> Result<Self> {
        let year_pattern = Regex::new(&config.year_regex)
            .with_context(|| format!("Invalid folder year regex: {}", config.year_regex))?;

        Ok(Self {
            root: root.into(),
            recursive: config.recursive,
            extensions: config
                .movie_formats
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            year_pattern,
        })
    }

    /// Builds an entry from a file name. `None` when the year cannot be found.
    #[must_use]
    pub fn parse_file_name(&self, path: &Path) -> Option<LibraryEntry> {
        let stem = path.file_stem()?.to_str()?;

        let year = self
            .year_pattern
            .captures(stem)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<i32>().ok())?;

        let title = stem.split(" (").next().unwrap_or(stem).trim();
        if title.is_empty() {
            return None;
        }

        Some(LibraryEntry::new(title, Some(year)))
    }

    fn has_movie_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .is_some_and(|ext| self.extensions.contains(&ext))
    }
}

#[async_trait]
impl LibrarySource for FolderSource {
    fn name(&self) -> String {
        format!("folder {}", self.root.display())
    }

    async fn list_movies(&self) -> Result<Vec<LibraryEntry>> {
        if !self.root.is_dir() {
            anyhow::bail!("Not a directory: {}", self.root.display());
        }

        let root = self.root.clone();
        let max_depth = if self.recursive { usize::MAX } else { 1 };

        let files = tokio::task::spawn_blocking(move || {
            walkdir::WalkDir::new(&root)
                .max_depth(max_depth)
                .follow_links(true)
                .into_iter()
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().is_file())
                .map(walkdir::DirEntry::into_path)
                .collect::<Vec<_>>()
        })
        .await
        .context("Folder walk panicked")?;

        let mut entries = Vec::new();
        for path in files {
            if !self.has_movie_extension(&path) {
                continue;
            }

            match self.parse_file_name(&path) {
                Some(entry) => entries.push(entry),
                None => warn!(path = %path.display(), "No year in file name, skipping"),
            }
        }

        Ok(entries)
    }
}
