//! Domain events for the application.
//!
//! These events are published on the event bus while a reconciliation run is
//! in progress and forwarded to SSE clients and the terminal front end.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::Movie;

/// Events sent to connected clients via SSE (Server-Sent Events).
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum NotificationEvent {
    SearchStarted {
        run_id: Uuid,
    },

    /// Inventory finished; `total` is the number of distinct owned movies.
    OwnedMoviesFound {
        run_id: Uuid,
        total: usize,
    },

    /// Progress tick. `movie` is set only when a new recommendation was found.
    SearchProgress {
        run_id: Uuid,
        searched: usize,
        total: usize,
        movie: Option<Movie>,
    },

    SearchFinished {
        run_id: Uuid,
        recommended: usize,
    },
    SearchCancelled {
        run_id: Uuid,
        recommended: usize,
    },
    SearchFailed {
        run_id: Uuid,
        message: String,
    },

    ListUpdated {
        list_id: String,
        added: usize,
        failed: usize,
    },

    Error {
        message: String,
    },
    Info {
        message: String,
    },
}

/// Anything that can fan events out to subscribers.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: NotificationEvent);
}

impl EventPublisher for broadcast::Sender<NotificationEvent> {
    fn publish(&self, event: NotificationEvent) {
        // No subscribers is fine.
        let _ = self.send(event);
    }
}
