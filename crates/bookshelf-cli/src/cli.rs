//! CLI argument parsing for the bookshelf binary.
//!
//! Flags override every other configuration source.

use clap::{Parser, Subcommand};

use bookshelf_types::SearchBackend;

/// Bookshelf
///
/// Keyword search over a book collection kept in a record store and a
/// full-text index.
#[derive(Parser, Debug)]
#[command(name = "bookshelf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/bookshelf/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override record store path
    #[arg(long, global = true)]
    pub db_path: Option<String>,

    /// Override search index root directory
    #[arg(long, global = true)]
    pub index_path: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search books by keyword
    Search {
        /// Keyword; omit to list every book
        word: Option<String>,

        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Backend to query (relational, index)
        #[arg(short, long)]
        backend: Option<SearchBackend>,
    },

    /// Add a book
    Add {
        title: String,
        contents: String,
    },

    /// Delete a book by id
    Delete {
        id: u64,
    },

    /// Rebuild the search index from the record store
    Reindex {
        /// Documents per bulk request
        #[arg(long)]
        batch_size: Option<usize>,
    },
}
