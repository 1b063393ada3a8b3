//! Owns the single active reconciliation run.

use chrono::Datelike;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::reconcile::{Collaborators, Reconciler, RunOptions, RunOutcome, RunReport};
use super::run_handle::{RunHandle, RunStatus};
use super::tmdb_list::ExternalList;
use crate::domain::RunPhase;
use crate::domain::events::NotificationEvent;
use crate::library::LibrarySource;
use crate::models::Movie;

/// Errors surfaced synchronously when starting or cancelling a run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("No library source configured")]
    NoSourceConfigured,

    #[error("No TMDB API key configured")]
    MissingApiKey,

    #[error("A search is already running")]
    AlreadyRunning,

    #[error("No search is running")]
    NotRunning,
}

/// Static inputs of every run.
#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    pub has_api_key: bool,
    pub image_base_url: String,
}

/// Checks that a run could start. Touches neither the network nor the disk.
pub fn check_preconditions(
    source_count: usize,
    settings: &SupervisorSettings,
) -> Result<(), SearchError> {
    if source_count == 0 {
        return Err(SearchError::NoSourceConfigured);
    }
    if !settings.has_api_key {
        return Err(SearchError::MissingApiKey);
    }
    Ok(())
}

/// A run that was just spawned.
pub struct StartedRun {
    pub handle: Arc<RunHandle>,
    pub task: JoinHandle<RunReport>,
}

pub struct SearchSupervisor {
    deps: Collaborators,
    sources: Arc<Vec<Arc<dyn LibrarySource>>>,
    settings: SupervisorSettings,
    list: Option<Arc<dyn ExternalList>>,
    current: Arc<RwLock<Option<Arc<RunHandle>>>>,
}

impl SearchSupervisor {
    #[must_use]
    pub fn new(
        deps: Collaborators,
        sources: Vec<Arc<dyn LibrarySource>>,
        settings: SupervisorSettings,
    ) -> Self {
        Self {
            deps,
            sources: Arc::new(sources),
            settings,
            list: None,
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// Completed runs also push their recommendations to `list`. The run
    /// stays `running` until the list is updated.
    #[must_use]
    pub fn with_list(mut self, list: Arc<dyn ExternalList>) -> Self {
        self.list = Some(list);
        self
    }

    #[must_use]
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    #[must_use]
    pub const fn has_list(&self) -> bool {
        self.list.is_some()
    }

    /// Starts a run in the background.
    ///
    /// Rejected while another run is in progress; a finished run is simply
    /// replaced.
    pub async fn start(&self) -> Result<StartedRun, SearchError> {
        check_preconditions(self.sources.len(), &self.settings)?;

        let handle = {
            let mut current = self.current.write().await;
            if current.as_ref().is_some_and(|h| h.is_running()) {
                return Err(SearchError::AlreadyRunning);
            }
            let handle = Arc::new(RunHandle::new());
            *current = Some(Arc::clone(&handle));
            handle
        };

        let options = RunOptions {
            current_year: chrono::Local::now().year(),
            image_base_url: self.settings.image_base_url.clone(),
        };

        info!(
            event = "search_started",
            run_id = %handle.id(),
            sources = self.sources.len(),
            "Starting search"
        );

        let deps = self.deps.clone();
        let sources = Arc::clone(&self.sources);
        let list = self.list.clone();
        let run_handle = Arc::clone(&handle);

        let task = tokio::spawn(async move {
            let report = Reconciler::new(deps.clone(), run_handle, options)
                .with_list(list)
                .run(&sources)
                .await;

            if let RunOutcome::Failed(message) = &report.outcome {
                error!(event = "search_failed", error = %message, "Search failed");
                deps.events.publish(NotificationEvent::Error {
                    message: format!("Search failed: {message}"),
                });
            }

            report
        });

        Ok(StartedRun { handle, task })
    }

    /// Requests cooperative cancellation of the active run.
    pub async fn cancel(&self) -> Result<Arc<RunHandle>, SearchError> {
        let current = self.current.read().await;
        match current.as_ref() {
            Some(handle) if handle.is_running() => {
                info!(run_id = %handle.id(), "Cancelling search");
                handle.cancel();
                Ok(Arc::clone(handle))
            }
            _ => Err(SearchError::NotRunning),
        }
    }

    pub async fn current(&self) -> Option<Arc<RunHandle>> {
        self.current.read().await.clone()
    }

    /// `Idle` until the first run starts.
    pub async fn phase(&self) -> RunPhase {
        self.current
            .read()
            .await
            .as_ref()
            .map_or(RunPhase::Idle, |h| h.phase())
    }

    pub async fn status(&self) -> Option<RunStatus> {
        self.current.read().await.as_ref().map(|h| h.status())
    }

    /// Copy of the latest run's recommendations, possibly partial.
    pub async fn recommended(&self) -> Vec<Movie> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|h| h.recommended_snapshot())
            .unwrap_or_default()
    }
}
