use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tracing::info;

use crate::clients::plex::PlexClient;
use crate::clients::tmdb::TmdbClient;
use crate::config::Config;
use crate::domain::events::NotificationEvent;
use crate::library::{FolderSource, LibrarySource, PlexSource};
use crate::services::{
    Collaborators, ExternalList, FileOutput, SearchSupervisor, SupervisorSettings, Throttle,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub event_bus: broadcast::Sender<NotificationEvent>,

    pub supervisor: Arc<SearchSupervisor>,
}

impl SharedState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        Self::with_list(config, None)
    }

    /// State whose completed runs also populate `list`.
    pub fn with_list(config: Config, list: Option<Arc<dyn ExternalList>>) -> anyhow::Result<Self> {
        let sources = build_sources(&config)?;
        Self::with_sources(config, sources, list)
    }

    /// State over sources that were already built from `config`.
    pub fn with_sources(
        config: Config,
        sources: Vec<Arc<dyn LibrarySource>>,
        list: Option<Arc<dyn ExternalList>>,
    ) -> anyhow::Result<Self> {
        let (event_bus, _) = broadcast::channel(config.general.event_bus_buffer_size.max(1));
        let tmdb = TmdbClient::new(&config.tmdb)?;

        let deps = Collaborators {
            metadata: Arc::new(tmdb),
            throttle: Arc::new(Throttle::from_config(&config.tmdb)),
            events: Arc::new(event_bus.clone()),
            sink: Arc::new(FileOutput::new(config.output.clone())),
        };

        let mut supervisor = SearchSupervisor::new(deps, sources, settings(&config));
        if let Some(list) = list {
            supervisor = supervisor.with_list(list);
        }

        Ok(Self::from_parts(config, event_bus, supervisor))
    }

    /// Assembles state around an already built supervisor.
    #[must_use]
    pub fn from_parts(
        config: Config,
        event_bus: broadcast::Sender<NotificationEvent>,
        supervisor: SearchSupervisor,
    ) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            event_bus,
            supervisor: Arc::new(supervisor),
        }
    }
}

#[must_use]
pub fn settings(config: &Config) -> SupervisorSettings {
    SupervisorSettings {
        has_api_key: config.tmdb.has_api_key(),
        image_base_url: config.tmdb.image_base_url.clone(),
    }
}

/// Every enabled library source in the config.
pub fn build_sources(config: &Config) -> anyhow::Result<Vec<Arc<dyn LibrarySource>>> {
    let mut sources: Vec<Arc<dyn LibrarySource>> = Vec::new();

    if config.plex.enabled {
        let urls = config.plex.all_library_urls();
        if !urls.is_empty() {
            let client = PlexClient::new(config.plex.connect_timeout(), config.plex.read_timeout())?;
            for url in urls {
                sources.push(Arc::new(PlexSource::new(client.clone(), url)));
            }
        }
    }

    if config.folder.enabled {
        for path in &config.folder.paths {
            sources.push(Arc::new(FolderSource::new(path, &config.folder)?));
        }
    }

    info!(count = sources.len(), "Library sources configured");
    Ok(sources)
}
