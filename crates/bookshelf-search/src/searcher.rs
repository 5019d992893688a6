//! The search contract shared by every backend.

use bookshelf_types::{SearchBackend, SearchQuery, SearchResult};

use crate::error::SearchError;

/// Serves one page of keyword search results.
///
/// Every implementation returns records ordered by title ascending, ties
/// broken by id ascending, in pages of [`bookshelf_types::PAGE_SIZE`].
pub trait Searcher: Send + Sync {
    /// Which backend this searcher queries.
    fn backend(&self) -> SearchBackend;

    /// Run `query`. Validation failures are reported as
    /// [`SearchError::Validation`] before any store is touched.
    fn search(&self, query: &SearchQuery) -> Result<SearchResult, SearchError>;
}
