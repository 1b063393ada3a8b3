mod config;
mod daemon;
mod libraries;
mod owned;
mod search;

pub use config::cmd_show_config;
pub use daemon::cmd_daemon;
pub use libraries::cmd_libraries;
pub use owned::cmd_owned;
pub use search::cmd_search;
