#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

use gaps::domain::events::NotificationEvent;
use gaps::domain::{CollectionId, TmdbId};
use gaps::library::{LibraryEntry, LibrarySource};
use gaps::models::{
    CollectionDetails, CollectionPart, CollectionRef, Movie, MovieDetails, MovieHit,
};
use gaps::services::{
    Collaborators, MetadataError, MetadataService, ResultSink, RunHandle, Throttle,
};

/// In-memory metadata service with per-call counters.
#[derive(Default)]
pub struct FakeMetadata {
    pub search_results: HashMap<String, Vec<MovieHit>>,
    pub imdb_results: HashMap<String, Vec<MovieHit>>,
    pub details: HashMap<TmdbId, MovieDetails>,
    pub collections: HashMap<CollectionId, CollectionDetails>,
    pub unauthorized: bool,
    /// Cancelled as soon as the first collection is fetched.
    pub cancel_on_collection: Mutex<Option<Arc<RunHandle>>>,
    /// Cancelled once the details of the given movie are fetched.
    pub cancel_on_details: Mutex<Option<(TmdbId, Arc<RunHandle>)>>,

    pub search_calls: AtomicUsize,
    pub find_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub collection_calls: AtomicUsize,
}

impl FakeMetadata {
    pub fn with_search(mut self, title: &str, id: u64) -> Self {
        self.search_results.insert(
            title.to_string(),
            vec![MovieHit {
                id: TmdbId::new(id),
                title: title.to_string(),
                release_date: None,
            }],
        );
        self
    }

    pub fn with_imdb(mut self, imdb_id: &str, id: u64) -> Self {
        self.imdb_results.insert(
            imdb_id.to_string(),
            vec![MovieHit {
                id: TmdbId::new(id),
                title: String::new(),
                release_date: None,
            }],
        );
        self
    }

    pub fn with_movie(mut self, id: u64, title: &str, collection: Option<(u64, &str)>) -> Self {
        self.details.insert(
            TmdbId::new(id),
            MovieDetails {
                id: TmdbId::new(id),
                title: title.to_string(),
                imdb_id: Some(format!("tt{id:07}")),
                release_date: None,
                poster_path: Some(format!("/poster{id}.jpg")),
                collection: collection.map(|(cid, name)| CollectionRef {
                    id: CollectionId::new(cid),
                    name: Some(name.to_string()),
                }),
            },
        );
        self
    }

    pub fn with_collection(mut self, id: u64, name: &str, parts: &[(u64, &str, &str)]) -> Self {
        self.collections.insert(
            CollectionId::new(id),
            CollectionDetails {
                id: CollectionId::new(id),
                name: Some(name.to_string()),
                parts: parts
                    .iter()
                    .map(|(pid, title, date)| CollectionPart {
                        id: TmdbId::new(*pid),
                        title: (*title).to_string(),
                        release_date: Some((*date).to_string()),
                        poster_path: None,
                    })
                    .collect(),
            },
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
            + self.find_calls.load(Ordering::SeqCst)
            + self.detail_calls.load(Ordering::SeqCst)
            + self.collection_calls.load(Ordering::SeqCst)
    }

    fn check_auth(&self) -> Result<(), MetadataError> {
        if self.unauthorized {
            Err(MetadataError::Unauthorized)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MetadataService for FakeMetadata {
    async fn search_movie(&self, title: &str, _year: i32) -> Result<Vec<MovieHit>, MetadataError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.check_auth()?;
        Ok(self.search_results.get(title).cloned().unwrap_or_default())
    }

    async fn find_by_imdb(&self, imdb_id: &str) -> Result<Vec<MovieHit>, MetadataError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        self.check_auth()?;
        Ok(self.imdb_results.get(imdb_id).cloned().unwrap_or_default())
    }

    async fn movie_details(&self, id: TmdbId) -> Result<MovieDetails, MetadataError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.check_auth()?;
        {
            let mut trigger = self.cancel_on_details.lock().unwrap();
            if trigger.as_ref().is_some_and(|(target, _)| *target == id)
                && let Some((_, handle)) = trigger.take()
            {
                handle.cancel();
            }
        }
        self.details.get(&id).cloned().ok_or(MetadataError::NotFound)
    }

    async fn collection(&self, id: CollectionId) -> Result<CollectionDetails, MetadataError> {
        self.collection_calls.fetch_add(1, Ordering::SeqCst);
        self.check_auth()?;
        if let Some(handle) = self.cancel_on_collection.lock().unwrap().take() {
            handle.cancel();
        }
        self.collections.get(&id).cloned().ok_or(MetadataError::NotFound)
    }
}

pub struct StaticSource(pub Vec<LibraryEntry>);

#[async_trait]
impl LibrarySource for StaticSource {
    fn name(&self) -> String {
        "static".to_string()
    }

    async fn list_movies(&self) -> anyhow::Result<Vec<LibraryEntry>> {
        Ok(self.0.clone())
    }
}

pub struct BrokenSource;

#[async_trait]
impl LibrarySource for BrokenSource {
    fn name(&self) -> String {
        "broken".to_string()
    }

    async fn list_movies(&self) -> anyhow::Result<Vec<LibraryEntry>> {
        anyhow::bail!("connection refused")
    }
}

/// Keeps everything a run persists.
#[derive(Default)]
pub struct MemorySink {
    pub partial_writes: AtomicUsize,
    pub final_movies: Mutex<Option<Vec<Movie>>>,
    pub known: Mutex<Vec<Movie>>,
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn persist_partial(&self, _movies: &[Movie]) -> anyhow::Result<()> {
        self.partial_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn persist_final(&self, movies: &[Movie]) -> anyhow::Result<()> {
        *self.final_movies.lock().unwrap() = Some(movies.to_vec());
        Ok(())
    }

    async fn load_known(&self) -> anyhow::Result<Vec<Movie>> {
        Ok(self.known.lock().unwrap().clone())
    }

    async fn persist_known(&self, movies: &[Movie]) -> anyhow::Result<()> {
        *self.known.lock().unwrap() = movies.to_vec();
        Ok(())
    }
}

pub fn owned(title: &str, year: i32) -> LibraryEntry {
    LibraryEntry::new(title, Some(year))
}

pub fn source(entries: Vec<LibraryEntry>) -> Vec<Arc<dyn LibrarySource>> {
    vec![Arc::new(StaticSource(entries))]
}

/// Collaborators with an unthrottled call budget.
pub fn collaborators(
    metadata: Arc<FakeMetadata>,
    sink: Arc<MemorySink>,
) -> (Collaborators, broadcast::Receiver<NotificationEvent>) {
    let (events, rx) = broadcast::channel(256);
    let deps = Collaborators {
        metadata,
        throttle: Arc::new(Throttle::new(Duration::ZERO, Duration::ZERO)),
        events: Arc::new(events),
        sink,
    };
    (deps, rx)
}

pub fn drain(rx: &mut broadcast::Receiver<NotificationEvent>) -> Vec<NotificationEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
