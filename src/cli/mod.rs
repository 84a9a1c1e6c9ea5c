//! CLI module - command-line interface for mapparr.
//!
//! Thin clap surface over the resolver core and the cache admin operations.

mod commands;

pub use commands::{
    cmd_add_mapping, cmd_clear, cmd_init, cmd_optimize, cmd_resolve, cmd_search, cmd_stats,
};

use clap::{Parser, Subcommand};

/// mapparr - Cross-provider identifier resolution
/// Maps one media identifier to its equivalents across providers
#[derive(Parser)]
#[command(name = "mapparr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as background daemon with the maintenance scheduler
    #[command(alias = "-d", alias = "--daemon")]
    Daemon,

    /// Resolve a seed identifier into its known equivalents
    #[command(alias = "r")]
    Resolve {
        /// Media type: movie, series or anime
        #[arg(long, default_value = "series")]
        media_type: String,

        /// TMDB seed id
        #[arg(long)]
        tmdb: Option<i32>,

        /// TheTVDB seed id
        #[arg(long)]
        tvdb: Option<i32>,

        /// IMDb seed id (tt-prefixed)
        #[arg(long)]
        imdb: Option<String>,

        /// TVmaze seed id
        #[arg(long)]
        tvmaze: Option<i32>,

        /// MyAnimeList seed id
        #[arg(long)]
        mal: Option<i32>,

        /// Kitsu seed id
        #[arg(long)]
        kitsu: Option<i32>,

        /// AniDB seed id
        #[arg(long)]
        anidb: Option<i32>,

        /// AniList seed id
        #[arg(long)]
        anilist: Option<i32>,

        /// Providers that must be resolved (repeatable)
        #[arg(long = "target")]
        targets: Vec<String>,
    },

    /// Show equivalence cache statistics
    Stats,

    /// Clear cache rows
    Clear {
        /// Only remove rows older than this many days
        #[arg(long)]
        older_than: Option<i64>,

        /// Remove every row
        #[arg(long)]
        all: bool,
    },

    /// Search the cache by any identifier value
    #[command(alias = "s")]
    Search {
        /// Identifier value (numeric or tt-prefixed)
        id: String,

        /// Restrict to a content type: movie or series
        #[arg(long = "type")]
        content_type: Option<String>,

        /// Maximum rows to print
        #[arg(long, default_value = "20")]
        limit: u64,

        /// Rows to skip
        #[arg(long, default_value = "0")]
        offset: u64,
    },

    /// Insert or correct a mapping by hand
    AddMapping {
        /// Content type: movie or series
        #[arg(long = "type", default_value = "series")]
        content_type: String,

        #[arg(long)]
        tmdb: Option<i32>,

        #[arg(long)]
        tvdb: Option<i32>,

        #[arg(long)]
        imdb: Option<String>,

        #[arg(long)]
        tvmaze: Option<i32>,
    },

    /// Run one maintenance pass (expire, enforce size, housekeeping)
    Optimize,

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}
