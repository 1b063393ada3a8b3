pub const MOVIE_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "webm", "mov", "wmv", "m4v", "ts"];

pub mod guid {

    pub const PLEX_TMDB_AGENT: &str = "com.plexapp.agents.themoviedb://";

    pub const PLEX_IMDB_AGENT: &str = "com.plexapp.agents.imdb://";

    pub const TMDB_SCHEME: &str = "tmdb://";

    pub const IMDB_SCHEME: &str = "imdb://";
}

pub mod intervals {
    use std::time::Duration;

    pub const SSE_KEEP_ALIVE: Duration = Duration::from_secs(15);

    /// How long the terminal waits for the user to approve a TMDB request token.
    pub const LIST_APPROVAL_TIMEOUT: Duration = Duration::from_secs(60);
}

pub mod limits {

    /// Progress gets logged every this many owned movies.
    pub const PROGRESS_LOG_EVERY: usize = 10;
}
