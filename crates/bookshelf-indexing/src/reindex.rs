//! Full index rebuild from the record store.
//!
//! The rebuild always starts from an empty index: the old one is dropped,
//! a fresh one is provisioned with the n-gram analysis settings and the
//! book mapping, and then every record is streamed across in bulk
//! batches. Batches are atomic on their own; a failed run leaves a
//! partially populated index and is recovered by running again.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use bookshelf_index::{
    book_index_settings, book_mapping, book_source, Acknowledged, BulkOperation, IndexError,
    IndexGateway,
};
use bookshelf_storage::{single_count, BookFilter, RecordStore};

use crate::error::IndexingError;

pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Configuration for an index rebuild.
#[derive(Debug, Clone)]
pub struct ReindexConfig {
    /// Index to rebuild
    pub index_name: String,
    /// Documents per bulk request
    pub batch_size: usize,
}

impl Default for ReindexConfig {
    fn default() -> Self {
        Self {
            index_name: "book".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl ReindexConfig {
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            ..Default::default()
        }
    }

    /// Set the number of documents per bulk request.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn validate(&self) -> Result<(), IndexingError> {
        if self.batch_size == 0 {
            return Err(IndexingError::Validation(
                "batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Progress of a running rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReindexProgress {
    /// Records in the store when the copy started
    pub total: u64,
    /// Documents acknowledged by the index so far
    pub indexed: u64,
    /// Bulk requests flushed so far
    pub batches: u64,
}

impl ReindexProgress {
    fn new(total: u64) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    fn record_batch(&mut self, documents: usize) {
        self.indexed += documents as u64;
        self.batches += 1;
    }
}

/// Summary of a finished rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReindexReport {
    pub index: String,
    pub total: u64,
    pub indexed: u64,
    pub batches: u64,
    #[serde(serialize_with = "serialize_elapsed")]
    pub elapsed: Duration,
}

fn serialize_elapsed<S: serde::Serializer>(
    elapsed: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:.3}s", elapsed.as_secs_f64()))
}

/// Trait for receiving rebuild progress updates.
pub trait ProgressCallback: Send {
    /// Called after each bulk batch is flushed.
    fn on_progress(&self, progress: &ReindexProgress);
}

/// A no-op progress callback for when progress reporting isn't needed.
pub struct NoOpProgressCallback;

impl ProgressCallback for NoOpProgressCallback {
    fn on_progress(&self, _progress: &ReindexProgress) {}
}

/// Logs progress at info level every `every` batches and on the last one.
pub struct LoggingProgressCallback {
    every: u64,
}

impl LoggingProgressCallback {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
        }
    }
}

impl ProgressCallback for LoggingProgressCallback {
    fn on_progress(&self, progress: &ReindexProgress) {
        if progress.batches % self.every == 0 || progress.indexed >= progress.total {
            info!(
                indexed = progress.indexed,
                total = progress.total,
                batches = progress.batches,
                "Reindex progress"
            );
        }
    }
}

/// Rebuilds one index from the record store.
pub struct ReindexPipeline<S, G> {
    store: Arc<S>,
    gateway: Arc<G>,
    config: ReindexConfig,
}

impl<S: RecordStore, G: IndexGateway> ReindexPipeline<S, G> {
    pub fn new(store: Arc<S>, gateway: Arc<G>, config: ReindexConfig) -> Self {
        Self {
            store,
            gateway,
            config,
        }
    }

    pub fn config(&self) -> &ReindexConfig {
        &self.config
    }

    /// Drop the index if present, then create and map it afresh.
    pub fn provision(&self) -> Result<(), IndexingError> {
        let name = self.config.index_name.as_str();

        if self
            .gateway
            .index_exists(name)
            .map_err(|e| provisioning("index_exists", e))?
        {
            let ack = self
                .gateway
                .delete_index(name)
                .map_err(|e| provisioning("delete_index", e))?;
            require_ack("delete_index", &ack)?;
            debug!(index = name, "Dropped existing index");
        }

        let ack = self
            .gateway
            .create_index(name, &book_index_settings())
            .map_err(|e| provisioning("create_index", e))?;
        require_ack("create_index", &ack)?;

        let ack = self
            .gateway
            .put_mapping(name, &book_mapping())
            .map_err(|e| provisioning("put_mapping", e))?;
        require_ack("put_mapping", &ack)?;

        info!(index = name, "Provisioned index");
        Ok(())
    }

    /// Provision the index and copy every record into it.
    pub fn run<P: ProgressCallback + ?Sized>(
        &self,
        progress_callback: &P,
    ) -> Result<ReindexReport, IndexingError> {
        self.config.validate()?;
        let start = Instant::now();

        info!(
            index = %self.config.index_name,
            batch_size = self.config.batch_size,
            "Starting reindex"
        );
        self.provision()?;

        let total = single_count(self.store.count(&BookFilter::all())?)?;
        info!(count = total, "Found records to index");

        let mut progress = ReindexProgress::new(total);
        let mut batch = Vec::with_capacity(self.config.batch_size);

        for book in self.store.stream_all()? {
            let book = book?;
            batch.push(BulkOperation::Index {
                id: book.id,
                source: book_source(&book),
            });

            if batch.len() >= self.config.batch_size {
                self.flush(&mut batch, &mut progress, progress_callback)?;
            }
        }
        if !batch.is_empty() {
            self.flush(&mut batch, &mut progress, progress_callback)?;
        }

        let report = ReindexReport {
            index: self.config.index_name.clone(),
            total: progress.total,
            indexed: progress.indexed,
            batches: progress.batches,
            elapsed: start.elapsed(),
        };
        info!(
            indexed = report.indexed,
            batches = report.batches,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Reindex complete"
        );
        Ok(report)
    }

    fn flush<P: ProgressCallback + ?Sized>(
        &self,
        batch: &mut Vec<BulkOperation>,
        progress: &mut ReindexProgress,
        progress_callback: &P,
    ) -> Result<(), IndexingError> {
        let operations = std::mem::replace(batch, Vec::with_capacity(self.config.batch_size));
        let documents = operations.len();

        let response = self.gateway.bulk(&self.config.index_name, operations)?;
        if response.errors {
            let failures: Vec<_> = response
                .failed_items()
                .map(|item| (item.id, item.error.clone().unwrap_or_default()))
                .collect();
            return Err(IndexingError::BulkIndex { failures });
        }

        progress.record_batch(documents);
        debug!(
            documents,
            batches = progress.batches,
            "Flushed bulk batch"
        );
        progress_callback.on_progress(progress);
        Ok(())
    }
}

fn provisioning(step: &'static str, err: IndexError) -> IndexingError {
    IndexingError::Provisioning {
        step,
        detail: err.to_string(),
    }
}

fn require_ack(step: &'static str, ack: &Acknowledged) -> Result<(), IndexingError> {
    if ack.acknowledged {
        return Ok(());
    }
    let detail =
        serde_json::to_string_pretty(ack).unwrap_or_else(|_| format!("{:?}", ack));
    Err(IndexingError::Provisioning { step, detail })
}
