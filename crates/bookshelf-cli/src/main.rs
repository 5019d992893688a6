//! Bookshelf
//!
//! Keyword search over a book collection.
//!
//! # Usage
//!
//! ```bash
//! bookshelf search [WORD] [--page N] [--backend relational|index]
//! bookshelf add TITLE CONTENTS
//! bookshelf delete ID
//! bookshelf reindex [--batch-size N]
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/bookshelf/config.toml)
//! 3. `--config` file
//! 4. Environment variables (BOOKSHELF_*)
//! 5. CLI flags

use anyhow::Result;
use clap::Parser;

use bookshelf_cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    run(Cli::parse()).await
}
