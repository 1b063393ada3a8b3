//! The reconciliation loop.
//!
//! One [`Reconciler`] drives one run: it builds the owned inventory, resolves
//! every unsearched owned movie to its collection, and diffs each collection
//! against what is owned or already evaluated. All run state is owned here;
//! the shared [`RunHandle`] only receives counters and copies.

mod collection;
mod resolver;

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::inventory::{OwnedSet, build_owned};
use super::metadata::{MetadataError, MetadataService};
use super::output::ResultSink;
use super::registry::{MovieIdx, MovieRegistry};
use super::run_handle::RunHandle;
use super::throttle::{CallWeight, Cancelled, Throttle};
use super::tmdb_list::{ExternalList, populate};
use crate::constants::limits;
use crate::domain::events::{EventPublisher, NotificationEvent};
use crate::domain::{CollectionId, MovieKey, RunPhase};
use crate::library::LibrarySource;
use crate::models::Movie;

pub use resolver::Resolution;

/// Why a run stopped before exhausting the owned set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interrupt {
    Cancelled,
    Fatal(MetadataError),
}

impl From<Cancelled> for Interrupt {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

/// Terminal state of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
    Failed(String),
}

impl RunOutcome {
    #[must_use]
    pub const fn phase(&self) -> RunPhase {
        match self {
            Self::Completed => RunPhase::Completed,
            Self::Cancelled => RunPhase::Cancelled,
            Self::Failed(_) => RunPhase::Failed,
        }
    }
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub recommended: Vec<Movie>,
    pub searched: usize,
    pub total: usize,
}

/// Per-run settings.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Members released in this year or later are never recommended.
    pub current_year: i32,

    /// Prefix for TMDB poster paths.
    pub image_base_url: String,
}

/// Everything a run talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub metadata: Arc<dyn MetadataService>,
    pub throttle: Arc<Throttle>,
    pub events: Arc<dyn EventPublisher>,
    pub sink: Arc<dyn ResultSink>,
}

pub struct Reconciler {
    deps: Collaborators,
    handle: Arc<RunHandle>,
    options: RunOptions,
    list: Option<Arc<dyn ExternalList>>,
    registry: MovieRegistry,
    owned: OwnedSet,
    searched: HashSet<MovieKey>,
    expanded: HashSet<CollectionId>,
    recommended: Vec<Movie>,
}

impl Reconciler {
    #[must_use]
    pub fn new(deps: Collaborators, handle: Arc<RunHandle>, options: RunOptions) -> Self {
        Self {
            deps,
            handle,
            options,
            list: None,
            registry: MovieRegistry::new(),
            owned: OwnedSet::default(),
            searched: HashSet::new(),
            expanded: HashSet::new(),
            recommended: Vec::new(),
        }
    }

    /// A completed run pushes its recommendations to `list` before it
    /// reports the terminal phase.
    #[must_use]
    pub fn with_list(mut self, list: Option<Arc<dyn ExternalList>>) -> Self {
        self.list = list;
        self
    }

    /// Runs to a terminal state. Never returns early with an error: every
    /// failure mode ends up in [`RunReport::outcome`].
    pub async fn run(mut self, sources: &[Arc<dyn LibrarySource>]) -> RunReport {
        let run_id = self.handle.id();
        self.deps
            .events
            .publish(NotificationEvent::SearchStarted { run_id });

        self.seed_known().await;

        let outcome = match build_owned(sources, &mut self.registry, self.handle.total()).await {
            Ok(owned) => {
                self.owned = owned;
                info!(
                    event = "inventory_built",
                    run_id = %run_id,
                    owned = self.owned.len(),
                    "Owned movies found"
                );
                self.deps.events.publish(NotificationEvent::OwnedMoviesFound {
                    run_id,
                    total: self.owned.len(),
                });
                self.reconcile_owned().await
            }
            Err(e) => {
                warn!(run_id = %run_id, error = %e, "Inventory failed");
                RunOutcome::Failed(e.to_string())
            }
        };

        self.finish(outcome).await
    }

    async fn seed_known(&mut self) {
        match self.deps.sink.load_known().await {
            Ok(known) if !known.is_empty() => {
                debug!(count = known.len(), "Seeding known movie identities");
                self.registry.seed(known);
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Could not load known movies, starting empty"),
        }
    }

    async fn reconcile_owned(&mut self) -> RunOutcome {
        let order: Vec<MovieIdx> = self.owned.iter().collect();
        let total = order.len();

        for idx in order {
            if self.handle.is_cancelled() {
                return RunOutcome::Cancelled;
            }

            match self.process(idx).await {
                Ok(()) => {}
                Err(Interrupt::Cancelled) => return RunOutcome::Cancelled,
                Err(Interrupt::Fatal(e)) => {
                    warn!(error = %e, "Run cannot continue");
                    return RunOutcome::Failed(e.to_string());
                }
            }

            let searched = self.handle.searched_count();
            if searched % limits::PROGRESS_LOG_EVERY == 0 && total > 0 {
                info!(
                    searched,
                    total,
                    percent = searched * 100 / total,
                    recommended = self.recommended.len(),
                    "Search progress"
                );
            }
        }

        RunOutcome::Completed
    }

    /// One owned movie: skip, resolve, expand.
    async fn process(&mut self, idx: MovieIdx) -> Result<(), Interrupt> {
        self.handle.record_searched();
        let key = self.registry.key(idx);

        if self.searched.contains(&key) {
            debug!(movie = %key, "Already searched");
            self.publish_progress(None);
            return Ok(());
        }

        match self.resolve(idx).await? {
            Resolution::Collection { id, name } => {
                self.expand(idx, id, name).await?;
            }
            Resolution::NoCollection => {
                debug!(movie = %key, "Not part of a collection");
                self.searched.insert(key);
                self.publish_progress(None);
            }
            Resolution::Unresolved => {
                self.publish_progress(None);
            }
        }

        Ok(())
    }

    /// Waits for a call slot, then issues the call.
    ///
    /// Transient errors are logged and come back as `None`; a fatal error or
    /// cancellation interrupts the run.
    async fn guarded<T, F>(
        &self,
        weight: CallWeight,
        what: &str,
        call: F,
    ) -> Result<Option<T>, Interrupt>
    where
        F: Future<Output = Result<T, MetadataError>> + Send,
    {
        self.deps
            .throttle
            .acquire(weight, self.handle.cancel_token())
            .await?;

        match call.await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_fatal() => Err(Interrupt::Fatal(e)),
            Err(e) => {
                warn!(call = what, error = %e, "Metadata lookup failed");
                Ok(None)
            }
        }
    }

    fn publish_progress(&self, movie: Option<Movie>) {
        self.deps.events.publish(NotificationEvent::SearchProgress {
            run_id: self.handle.id(),
            searched: self.handle.searched_count(),
            total: self.handle.total_count(),
            movie,
        });
    }

    async fn finish(mut self, outcome: RunOutcome) -> RunReport {
        let run_id = self.handle.id();

        if let Err(e) = self.deps.sink.persist_final(&self.recommended).await {
            warn!(error = %e, "Failed to write recommendations");
        }
        if let Err(e) = self.deps.sink.persist_known(&self.registry.snapshot()).await {
            warn!(error = %e, "Failed to write known movies");
        }

        if outcome == RunOutcome::Cancelled {
            self.searched.clear();
        }

        if let Some(list) = &self.list
            && outcome == RunOutcome::Completed
            && !self.recommended.is_empty()
        {
            populate(
                list.as_ref(),
                &self.recommended,
                &self.deps.throttle,
                self.deps.events.as_ref(),
            )
            .await;
        }

        let error = match &outcome {
            RunOutcome::Failed(message) => Some(message.clone()),
            _ => None,
        };
        self.handle.finish(outcome.phase(), error);

        let recommended = self.recommended.len();
        let event = match &outcome {
            RunOutcome::Completed => NotificationEvent::SearchFinished { run_id, recommended },
            RunOutcome::Cancelled => NotificationEvent::SearchCancelled { run_id, recommended },
            RunOutcome::Failed(message) => NotificationEvent::SearchFailed {
                run_id,
                message: message.clone(),
            },
        };
        self.deps.events.publish(event);

        for movie in &self.recommended {
            info!(
                movie = %movie,
                collection = movie.collection_name.as_deref().unwrap_or("-"),
                "Recommended"
            );
        }
        info!(
            event = "search_finished",
            run_id = %run_id,
            phase = %outcome.phase(),
            recommended,
            searched = self.handle.searched_count(),
            total = self.handle.total_count(),
            "Search finished"
        );

        RunReport {
            outcome,
            recommended: self.recommended,
            searched: self.handle.searched_count(),
            total: self.handle.total_count(),
        }
    }
}
