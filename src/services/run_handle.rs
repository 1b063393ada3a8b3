use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::RunPhase;
use crate::models::Movie;

/// Shared view of one reconciliation run.
///
/// The run task writes, front ends read. Front ends only ever get copies of
/// the recommendation list. Cancellation is the single input going the
/// other way.
#[derive(Debug)]
pub struct RunHandle {
    id: Uuid,
    started_at: DateTime<Utc>,
    total: AtomicUsize,
    searched: AtomicUsize,
    cancel: CancellationToken,
    phase: RwLock<RunPhase>,
    finished_at: RwLock<Option<DateTime<Utc>>>,
    error: RwLock<Option<String>>,
    recommended: RwLock<Vec<Movie>>,
}

/// Point-in-time status of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunStatus {
    pub run_id: Uuid,
    pub phase: RunPhase,
    pub searched: usize,
    pub total: usize,
    pub recommended: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl Default for RunHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl RunHandle {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            total: AtomicUsize::new(0),
            searched: AtomicUsize::new(0),
            cancel: CancellationToken::new(),
            phase: RwLock::new(RunPhase::Running),
            finished_at: RwLock::new(None),
            error: RwLock::new(None),
            recommended: RwLock::new(Vec::new()),
        }
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) const fn total(&self) -> &AtomicUsize {
        &self.total
    }

    #[must_use]
    pub fn total_count(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn searched_count(&self) -> usize {
        self.searched.load(Ordering::Relaxed)
    }

    /// Bumps progress and returns the new value.
    pub fn record_searched(&self) -> usize {
        self.searched.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    #[must_use]
    pub const fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    #[must_use]
    pub fn phase(&self) -> RunPhase {
        *self.phase.read().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.phase() == RunPhase::Running
    }

    /// Moves the run into a terminal phase. Anything else is ignored.
    pub fn finish(&self, phase: RunPhase, error: Option<String>) {
        if !phase.is_terminal() {
            return;
        }
        *self.phase.write().unwrap_or_else(PoisonError::into_inner) = phase;
        *self.finished_at.write().unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());
        *self.error.write().unwrap_or_else(PoisonError::into_inner) = error;
    }

    pub fn push_recommended(&self, movie: Movie) {
        self.recommended
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(movie);
    }

    #[must_use]
    pub fn recommended_snapshot(&self) -> Vec<Movie> {
        self.recommended
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn status(&self) -> RunStatus {
        RunStatus {
            run_id: self.id,
            phase: self.phase(),
            searched: self.searched_count(),
            total: self.total_count(),
            recommended: self
                .recommended
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .len(),
            started_at: self.started_at,
            finished_at: *self.finished_at.read().unwrap_or_else(PoisonError::into_inner),
            error: self
                .error
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }
}
