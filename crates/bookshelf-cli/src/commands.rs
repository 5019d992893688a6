//! Command implementations for the bookshelf binary.
//!
//! Every command loads configuration, opens both stores, and runs the
//! blocking store work on the tokio blocking pool. Results go to stdout as
//! pretty JSON; logs go to stderr.

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use bookshelf_index::{IndexGateway, IndexGatewayConfig, TantivyGateway};
use bookshelf_indexing::{
    AddBookCommand, AddOutcome, DeleteBookCommand, DeleteOutcome, LoggingProgressCallback,
    ReindexConfig, ReindexPipeline, ReindexReport,
};
use bookshelf_search::Searchers;
use bookshelf_storage::Storage;
use bookshelf_types::{BookId, NewBook, SearchBackend, SearchQuery, SearchResult, Settings};

use crate::cli::{Cli, Commands};

/// Load settings and apply the global CLI overrides.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Some(db_path) = &cli.db_path {
        settings.db_path = db_path.clone();
    }
    if let Some(index_path) = &cli.index_path {
        settings.index_path = index_path.clone();
    }
    if let Some(log_level) = &cli.log_level {
        settings.log_level = log_level.clone();
    }
    Ok(settings)
}

/// Install the global tracing subscriber. `RUST_LOG` wins over `level`.
pub fn init_logging(level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Open stores shared by every command.
#[derive(Clone)]
pub struct AppContext {
    pub settings: Settings,
    pub storage: Arc<Storage>,
    pub gateway: Arc<TantivyGateway>,
}

impl AppContext {
    pub fn open(settings: Settings) -> Result<Self> {
        let db_path = settings.expanded_db_path();
        let index_path = settings.expanded_index_path();
        info!(
            db_path = ?db_path,
            index_path = ?index_path,
            index = %settings.index_name,
            "Opening stores"
        );

        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent).context("Failed to create database directory")?;
        }
        fs::create_dir_all(&index_path).context("Failed to create index directory")?;

        let storage = Storage::open(&db_path).context("Failed to open record store")?;
        let gateway = TantivyGateway::new(
            IndexGatewayConfig::new(index_path).with_memory_mb(settings.writer_memory_mb),
        );

        Ok(Self {
            settings,
            storage: Arc::new(storage),
            gateway: Arc::new(gateway),
        })
    }

    fn index_name(&self) -> String {
        self.settings.index_name.clone()
    }
}

/// Run one search page; `backend` overrides the configured backend.
pub async fn search(
    ctx: &AppContext,
    word: Option<String>,
    page: u32,
    backend: Option<SearchBackend>,
) -> Result<serde_json::Value> {
    let backend = backend.unwrap_or(ctx.settings.search.backend);
    let ctx = ctx.clone();

    let result = tokio::task::spawn_blocking(move || -> Result<SearchResult> {
        let index_missing = !ctx.gateway.index_exists(&ctx.settings.index_name)?;
        if backend == SearchBackend::Index && index_missing {
            anyhow::bail!(
                "Search index {:?} does not exist; run `bookshelf reindex` first",
                ctx.settings.index_name
            );
        }
        let searchers = Searchers::new(ctx.storage.clone(), ctx.gateway.clone(), ctx.index_name());
        let query = SearchQuery::new(word.as_deref(), page);
        searchers.search(backend, &query).map_err(|e| {
            if e.is_client_error() {
                anyhow::anyhow!("Invalid search request: {}", e)
            } else {
                anyhow::Error::new(e).context("Search failed")
            }
        })
    })
    .await
    .context("Search task panicked")??;

    Ok(result.to_json())
}

pub async fn add(ctx: &AppContext, title: String, contents: String) -> Result<AddOutcome> {
    let ctx = ctx.clone();
    tokio::task::spawn_blocking(move || {
        let command =
            AddBookCommand::new(ctx.storage.clone(), ctx.gateway.clone(), ctx.index_name());
        command
            .execute(NewBook::new(title, contents))
            .context("Failed to add book")
    })
    .await
    .context("Add task panicked")?
}

pub async fn delete(ctx: &AppContext, id: BookId) -> Result<DeleteOutcome> {
    let ctx = ctx.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let command =
            DeleteBookCommand::new(ctx.storage.clone(), ctx.gateway.clone(), ctx.index_name());
        command.execute(id).context("Failed to delete book")
    })
    .await
    .context("Delete task panicked")??;

    if let DeleteOutcome::NotFound(_) = outcome {
        warn!(id, "No such book found.");
    }
    Ok(outcome)
}

/// Rebuild the index; `batch_size` overrides the configured batch size.
pub async fn reindex(ctx: &AppContext, batch_size: Option<usize>) -> Result<ReindexReport> {
    let config = ReindexConfig::new(ctx.index_name())
        .with_batch_size(batch_size.unwrap_or(ctx.settings.reindex.batch_size));
    let ctx = ctx.clone();

    tokio::task::spawn_blocking(move || {
        let pipeline = ReindexPipeline::new(ctx.storage.clone(), ctx.gateway.clone(), config);
        pipeline
            .run(&LoggingProgressCallback::new(10))
            .context("Reindex failed")
    })
    .await
    .context("Reindex task panicked")?
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render output")?;
    println!("{}", rendered);
    Ok(())
}

/// Entry point for a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli)?;
    init_logging(&settings.log_level)?;
    let ctx = AppContext::open(settings)?;

    match cli.command {
        Commands::Search {
            word,
            page,
            backend,
        } => print_json(&search(&ctx, word, page, backend).await?),
        Commands::Add { title, contents } => print_json(&add(&ctx, title, contents).await?),
        Commands::Delete { id } => print_json(&delete(&ctx, id).await?),
        Commands::Reindex { batch_size } => print_json(&reindex(&ctx, batch_size).await?),
    }
}
