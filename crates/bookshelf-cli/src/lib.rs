//! Bookshelf CLI library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (search, add, delete, reindex)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use commands::{add, delete, init_logging, load_settings, reindex, run, search, AppContext};
