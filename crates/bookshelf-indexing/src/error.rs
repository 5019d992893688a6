//! Error types for index maintenance.

use thiserror::Error;

use bookshelf_index::IndexError;
use bookshelf_storage::{AmbiguousAggregate, StorageError};
use bookshelf_types::BookId;

/// Errors that can occur while rebuilding the index or writing through.
#[derive(Debug, Error)]
pub enum IndexingError {
    /// Index could not be dropped, created or mapped; no data was copied
    #[error("Index provisioning failed at {step}: {detail}")]
    Provisioning { step: &'static str, detail: String },

    /// The index answered a write with an unexpected result
    #[error("Index did not acknowledge the write: {payload}")]
    Acknowledgement { payload: String },

    /// One or more documents in a bulk batch were rejected
    #[error("Bulk indexing failed for {} document(s), first: {}", .failures.len(), first_failure(.failures))]
    BulkIndex { failures: Vec<(BookId, String)> },

    /// Invalid pipeline configuration
    #[error("Validation error: {0}")]
    Validation(String),

    /// A store broke an invariant it is supposed to guarantee
    #[error("Unexpected state: {0}")]
    UnexpectedState(String),

    /// Record store error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Search index error
    #[error("Index error: {0}")]
    Index(#[from] IndexError),
}

fn first_failure(failures: &[(BookId, String)]) -> String {
    failures
        .first()
        .map(|(id, reason)| format!("{} ({})", id, reason))
        .unwrap_or_default()
}

impl IndexingError {
    /// Acknowledgement failure carrying `response` as pretty JSON.
    pub fn acknowledgement<T: serde::Serialize + std::fmt::Debug>(response: &T) -> Self {
        let payload = serde_json::to_string_pretty(response)
            .unwrap_or_else(|_| format!("{:?}", response));
        IndexingError::Acknowledgement { payload }
    }
}

impl From<AmbiguousAggregate> for IndexingError {
    fn from(err: AmbiguousAggregate) -> Self {
        IndexingError::UnexpectedState(err.to_string())
    }
}
