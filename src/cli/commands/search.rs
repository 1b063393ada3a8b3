use anyhow::Context;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::warn;

use crate::clients::tmdb::TmdbClient;
use crate::config::Config;
use crate::constants::intervals::LIST_APPROVAL_TIMEOUT;
use crate::domain::RunPhase;
use crate::domain::events::NotificationEvent;
use crate::services::{ExternalList, RunOutcome, TmdbList, check_preconditions};
use crate::state::{SharedState, build_sources, settings};

pub async fn cmd_search(config: Config, no_list: bool) -> anyhow::Result<()> {
    let sources = build_sources(&config)?;
    if let Err(e) = check_preconditions(sources.len(), &settings(&config)) {
        println!("Run 'gaps init' and edit config.toml to configure sources and TMDB.");
        return Err(anyhow::Error::new(e).context("Cannot start search"));
    }

    let list = if no_list {
        None
    } else {
        authorize_list(&config).await
    };

    let output = config.output.clone();
    let shared = SharedState::with_sources(config, sources, list)?;
    let mut events = shared.event_bus.subscribe();

    let started = shared
        .supervisor
        .start()
        .await
        .context("Cannot start search")?;

    println!("Searching for missing collection movies (Ctrl+C to stop)...");
    println!("{:-<60}", "");

    let handle = Arc::clone(&started.handle);
    let mut task = started.task;
    let mut cancel_requested = false;

    let report = loop {
        tokio::select! {
            result = &mut task => break result?,
            _ = tokio::signal::ctrl_c(), if !cancel_requested => {
                println!();
                println!("Stopping after the current movie...");
                handle.cancel();
                cancel_requested = true;
            }
            event = events.recv() => match event {
                Ok(event) => print_event(&event),
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!("Terminal output lagged by {} events", count);
                }
                Err(broadcast::error::RecvError::Closed) => {}
            },
        }
    };

    // Events published right before the task ended.
    while let Ok(event) = events.try_recv() {
        print_event(&event);
    }

    println!("{:-<60}", "");
    match &report.outcome {
        RunOutcome::Completed => println!(
            "✓ Searched {} of {} movies, {} recommended",
            report.searched,
            report.total,
            report.recommended.len()
        ),
        RunOutcome::Cancelled => println!(
            "Search cancelled after {} of {} movies, {} recommended so far",
            report.searched,
            report.total,
            report.recommended.len()
        ),
        RunOutcome::Failed(message) => println!("Search failed: {message}"),
    }

    if report.outcome.phase() != RunPhase::Failed && output.write_to_file {
        println!("Results written to {}", output.json_path().display());
        println!("RSS feed written to {}", output.rss_path().display());
    }

    Ok(())
}

fn print_event(event: &NotificationEvent) {
    match event {
        NotificationEvent::OwnedMoviesFound { total, .. } => {
            println!("Found {total} owned movies");
        }
        NotificationEvent::SearchProgress {
            searched,
            total,
            movie: Some(movie),
            ..
        } => {
            let collection = movie.collection_name.as_deref().unwrap_or("?");
            println!("[{searched}/{total}] + {movie}  ({collection})");
            if let Some(url) = movie.tmdb_url() {
                println!("    {url}");
            }
        }
        NotificationEvent::ListUpdated {
            list_id,
            added,
            failed,
        } => {
            println!("TMDB list {list_id}: {added} added, {failed} failed");
        }
        NotificationEvent::Error { message } => println!("Error: {message}"),
        _ => {}
    }
}

/// Walks the user through approving a TMDB session for the configured list.
///
/// Any failure is reported and the search continues without a list.
async fn authorize_list(config: &Config) -> Option<Arc<dyn ExternalList>> {
    let list_id = config.tmdb.list_id.clone()?;
    if !config.tmdb.has_api_key() {
        return None;
    }

    let client = match TmdbClient::new(&config.tmdb) {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "Cannot create TMDB client for list updates");
            return None;
        }
    };

    let shown = list_id.clone();
    let approve = move |url: String| async move {
        println!("To add the results to TMDB list {shown}, approve access at:");
        println!("  {url}");
        println!(
            "Press Enter once approved (continuing in {}s)...",
            LIST_APPROVAL_TIMEOUT.as_secs()
        );

        let mut line = String::new();
        let mut stdin = BufReader::new(tokio::io::stdin());
        if tokio::time::timeout(LIST_APPROVAL_TIMEOUT, stdin.read_line(&mut line))
            .await
            .is_err()
        {
            println!("No answer, trying anyway.");
        }
    };

    match TmdbList::authorize(client, list_id, approve).await {
        Ok(list) => Some(Arc::new(list) as Arc<dyn ExternalList>),
        Err(e) => {
            println!("TMDB list will not be updated: {e}");
            None
        }
    }
}
