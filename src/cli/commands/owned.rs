use std::sync::atomic::AtomicUsize;

use crate::config::Config;
use crate::services::{MovieRegistry, build_owned};
use crate::state::build_sources;

pub async fn cmd_owned(config: &Config) -> anyhow::Result<()> {
    let sources = build_sources(config)?;
    if sources.is_empty() {
        println!("No library source configured.");
        println!("Enable plex or folder sources in config.toml.");
        return Ok(());
    }

    let mut registry = MovieRegistry::new();
    let total = AtomicUsize::new(0);
    let owned = build_owned(&sources, &mut registry, &total).await?;

    println!("Owned Movies ({} total)", owned.len());
    println!("{:-<70}", "");

    for idx in owned.iter() {
        let movie = registry.get(idx);
        let ids = match (movie.tmdb_id, movie.imdb_id.as_deref()) {
            (Some(tmdb), Some(imdb)) => format!("tmdb {tmdb} | imdb {imdb}"),
            (Some(tmdb), None) => format!("tmdb {tmdb}"),
            (None, Some(imdb)) => format!("imdb {imdb}"),
            (None, None) => "title search".to_string(),
        };
        println!("• {movie}  [{ids}]");
    }

    Ok(())
}
