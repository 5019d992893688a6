//! Searcher error types.

use thiserror::Error;

use bookshelf_index::IndexError;
use bookshelf_storage::{AmbiguousAggregate, StorageError};
use bookshelf_types::{BookId, BookshelfError};

/// Errors that can occur while serving a search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Bad query parameters; the caller should fix the request
    #[error("Validation error: {0}")]
    Validation(String),

    /// A store broke an invariant it is supposed to guarantee
    #[error("Unexpected state: {0}")]
    UnexpectedState(String),

    /// The index returned an id the record store does not have
    #[error("Search index is inconsistent with the record store: no record with id {id}; rebuild the index")]
    InconsistentIndex { id: BookId },

    /// Record store error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Search index error
    #[error("Index error: {0}")]
    Index(#[from] IndexError),
}

impl SearchError {
    /// Whether the failure was caused by the request rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(self, SearchError::Validation(_))
    }
}

impl From<AmbiguousAggregate> for SearchError {
    fn from(err: AmbiguousAggregate) -> Self {
        SearchError::UnexpectedState(err.to_string())
    }
}

impl From<BookshelfError> for SearchError {
    fn from(err: BookshelfError) -> Self {
        match err {
            BookshelfError::Validation(msg) => SearchError::Validation(msg),
            other => SearchError::UnexpectedState(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(SearchError::Validation("page".to_string()).is_client_error());
        assert!(!SearchError::InconsistentIndex { id: 3 }.is_client_error());
        assert!(!SearchError::from(AmbiguousAggregate { rows: 2 }).is_client_error());
    }

    #[test]
    fn test_validation_conversion() {
        let err = SearchError::from(BookshelfError::Validation("bad page".to_string()));
        assert!(matches!(err, SearchError::Validation(msg) if msg == "bad page"));
    }

    #[test]
    fn test_ambiguous_aggregate_message() {
        let err = SearchError::from(AmbiguousAggregate { rows: 2 });
        assert!(matches!(err, SearchError::UnexpectedState(_)));
        assert!(err.to_string().contains("2 rows"));
    }
}
