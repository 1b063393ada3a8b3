//! CLI module - Command-line interface for Gaps
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Gaps - finds the missing movies of the collections you own
#[derive(Parser)]
#[command(name = "gaps")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the web API and wait for searches to be triggered
    #[command(alias = "-d", alias = "--daemon")]
    Daemon,

    /// Run one search in the terminal, printing recommendations as they appear
    #[command(alias = "s")]
    Search {
        /// Do not push the results to the configured TMDB list
        #[arg(long)]
        no_list: bool,
    },

    /// List the movies found in the configured library sources
    #[command(alias = "ls")]
    Owned,

    /// List the movie libraries of a Plex server
    Libraries {
        /// Server base URL, defaults to plex.server_url
        #[arg(long)]
        server: Option<String>,
        /// Plex token, defaults to plex.token
        #[arg(long)]
        token: Option<String>,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Print the loaded configuration with secrets masked
    Config,
}

pub use commands::*;
