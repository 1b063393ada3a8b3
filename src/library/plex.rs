use async_trait::async_trait;

use super::{LibraryEntry, LibrarySource};
use crate::clients::plex::PlexClient;

/// One Plex library section, addressed by its full listing URL.
pub struct PlexSource {
    client: PlexClient,
    url: String,
}

impl PlexSource {
    #[must_use]
    pub const fn new(client: PlexClient, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl LibrarySource for PlexSource {
    fn name(&self) -> String {
        // Never log the token.
        let base = self.url.split('?').next().unwrap_or(&self.url);
        format!("plex {base}")
    }

    async fn list_movies(&self) -> anyhow::Result<Vec<LibraryEntry>> {
        self.client.fetch_library(&self.url).await
    }
}
