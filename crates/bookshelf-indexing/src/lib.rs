//! Keeps the record store and the search index consistent.
//!
//! ## Key Components
//!
//! - [`ReindexPipeline`]: drops and re-provisions the index, then streams
//!   every record into it in bounded bulk batches
//! - [`AddBookCommand`] / [`DeleteBookCommand`]: mutate a record and its
//!   indexed document as one unit, rolling the record store back when the
//!   index does not acknowledge the expected result
//! - [`IndexingError`]: error types for both
//!
//! ## Example
//!
//! ```ignore
//! use bookshelf_indexing::{LoggingProgressCallback, ReindexConfig, ReindexPipeline};
//!
//! let pipeline = ReindexPipeline::new(store, gateway, ReindexConfig::new("book"));
//! let report = pipeline.run(&LoggingProgressCallback::new(10))?;
//! ```

pub mod commands;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod fault;
pub mod reindex;

#[cfg(test)]
mod testing;

pub use commands::{AddBookCommand, AddOutcome, DeleteBookCommand, DeleteOutcome};
pub use error::IndexingError;
#[cfg(any(test, feature = "test-util"))]
pub use fault::FaultyGateway;
pub use reindex::{
    LoggingProgressCallback, NoOpProgressCallback, ProgressCallback, ReindexConfig,
    ReindexPipeline, ReindexProgress, ReindexReport, DEFAULT_BATCH_SIZE,
};
