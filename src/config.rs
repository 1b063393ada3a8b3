use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub plex: PlexConfig,

    pub folder: FolderConfig,

    pub tmdb: TmdbConfig,

    pub output: OutputConfig,

    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    #[serde(default)]
    pub suppress_connection_errors: bool,

    /// Emit logs as JSON lines instead of human readable text
    pub json_logs: bool,

    /// Event bus buffer size (default: 100)
    pub event_bus_buffer_size: usize,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            suppress_connection_errors: false,
            json_logs: false,
            event_bus_buffer_size: 100,
            worker_threads: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlexConfig {
    pub enabled: bool,

    /// Full library listing URLs, e.g.
    /// `http://host:32400/library/sections/1/all/?X-Plex-Token=...`
    pub library_urls: Vec<String>,

    /// Server base URL used together with `token` and `library_keys`.
    pub server_url: Option<String>,

    pub token: Option<String>,

    pub library_keys: Vec<u32>,

    pub connect_timeout_secs: u64,

    pub read_timeout_secs: u64,
}

impl Default for PlexConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            library_urls: Vec::new(),
            server_url: None,
            token: None,
            library_keys: Vec::new(),
            connect_timeout_secs: 180,
            read_timeout_secs: 180,
        }
    }
}

impl PlexConfig {
    /// Every listing URL this config points at, explicit ones first.
    #[must_use]
    pub fn all_library_urls(&self) -> Vec<String> {
        let mut urls = self.library_urls.clone();

        if let (Some(server), Some(token)) = (&self.server_url, &self.token) {
            let server = server.trim_end_matches('/');
            for key in &self.library_keys {
                urls.push(format!(
                    "{server}/library/sections/{key}/all/?X-Plex-Token={}",
                    urlencoding::encode(token)
                ));
            }
        }

        urls
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FolderConfig {
    pub enabled: bool,

    pub paths: Vec<String>,

    pub recursive: bool,

    pub movie_formats: Vec<String>,

    /// Pattern with one capture group holding the four digit year.
    pub year_regex: String,
}

impl Default for FolderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            paths: Vec::new(),
            recursive: true,
            movie_formats: crate::constants::MOVIE_EXTENSIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
            year_regex: r"\((\d{4})\)".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TmdbConfig {
    pub api_key: String,

    pub base_url: String,

    pub image_base_url: String,

    /// List that recommendations get added to after a run. Requires an
    /// interactive approval on the terminal.
    pub list_id: Option<String>,

    /// Pause after a search or find call (default: 700)
    pub search_delay_ms: u64,

    /// Pause after a details or collection call (default: 200)
    pub detail_delay_ms: u64,

    pub request_timeout_secs: u64,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.themoviedb.org/3".to_string(),
            image_base_url: "https://image.tmdb.org/t/p/w185".to_string(),
            list_id: None,
            search_delay_ms: 700,
            detail_delay_ms: 200,
            request_timeout_secs: 30,
        }
    }
}

impl TmdbConfig {
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub write_to_file: bool,

    pub directory: String,

    pub json_file: String,

    pub rss_file: String,

    /// Every movie identity seen so far, reused to skip searches next run.
    pub known_movies_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            write_to_file: true,
            directory: "data".to_string(),
            json_file: "recommended.json".to_string(),
            rss_file: "recommended.rss".to_string(),
            known_movies_file: "known_movies.json".to_string(),
        }
    }
}

impl OutputConfig {
    #[must_use]
    pub fn json_path(&self) -> PathBuf {
        Path::new(&self.directory).join(&self.json_file)
    }

    #[must_use]
    pub fn rss_path(&self) -> PathBuf {
        Path::new(&self.directory).join(&self.rss_file)
    }

    #[must_use]
    pub fn known_movies_path(&self) -> PathBuf {
        Path::new(&self.directory).join(&self.known_movies_file)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8484,
            cors_allowed_origins: vec![
                "http://localhost:8484".to_string(),
                "http://127.0.0.1:8484".to_string(),
            ],
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("TMDB_API_KEY")
            && !key.trim().is_empty()
        {
            self.tmdb.api_key = key;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("gaps").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".gaps").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.enabled && self.server.port == 0 {
            anyhow::bail!("Server port must be > 0 when the server is enabled");
        }

        if self.plex.enabled && (self.plex.connect_timeout_secs == 0 || self.plex.read_timeout_secs == 0)
        {
            anyhow::bail!("Plex timeouts must be > 0");
        }

        if self.folder.enabled {
            regex::Regex::new(&self.folder.year_regex).with_context(|| {
                format!("Invalid folder year regex: {}", self.folder.year_regex)
            })?;
        }

        Ok(())
    }

    /// Copy that is safe to hand out over the API.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.tmdb.has_api_key() {
            copy.tmdb.api_key = "********".to_string();
        }
        if copy.plex.token.is_some() {
            copy.plex.token = Some("********".to_string());
        }
        copy.plex.library_urls = copy
            .plex
            .library_urls
            .iter()
            .map(|u| mask_plex_token(u))
            .collect();
        copy
    }
}

fn mask_plex_token(url: &str) -> String {
    match url.find("X-Plex-Token=") {
        Some(pos) => {
            let start = pos + "X-Plex-Token=".len();
            let end = url[start..].find('&').map_or(url.len(), |i| start + i);
            format!("{}********{}", &url[..start], &url[end..])
        }
        None => url.to_string(),
    }
}
