pub mod plex;
pub mod tmdb;
