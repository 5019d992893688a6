//! Record store gateway contract.
//!
//! Searchers, the reindex pipeline and the write-through commands only
//! see these traits, so the engine behind them can be swapped or wrapped
//! (tests wrap it to inject faults).

use thiserror::Error;

use bookshelf_types::{Book, BookId, NewBook};

use crate::error::StorageError;
use crate::filter::BookFilter;

/// Query and transaction access to the book table.
pub trait RecordStore: Send + Sync {
    /// Scoped write transaction. Dropping it uncommitted rolls it back.
    type Transaction<'a>: RecordTransaction
    where
        Self: 'a;

    /// Single-pass cursor over every row.
    type Stream<'a>: Iterator<Item = Result<Book, StorageError>>
    where
        Self: 'a;

    /// Open a write transaction.
    fn begin(&self) -> Result<Self::Transaction<'_>, StorageError>;

    /// One page of rows matching `filter`, ordered by title then id.
    fn query(
        &self,
        filter: &BookFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Book>, StorageError>;

    /// `SELECT COUNT(*)` for `filter`.
    ///
    /// Returns one row per aggregate group; an ungrouped count yields
    /// exactly one row and callers treat anything else as a broken engine.
    fn count(&self, filter: &BookFilter) -> Result<Vec<u64>, StorageError>;

    /// Fetch the rows with the given ids.
    ///
    /// Missing ids are skipped. The result order is unspecified and must
    /// not be assumed to follow `ids`.
    fn get_many(&self, ids: &[BookId]) -> Result<Vec<Book>, StorageError>;

    /// Stream every row without materializing the table.
    fn stream_all(&self) -> Result<Self::Stream<'_>, StorageError>;
}

/// Mutations executed inside a record store transaction.
pub trait RecordTransaction {
    /// Insert a row and return its store-assigned id.
    fn insert(&mut self, book: &NewBook) -> Result<BookId, StorageError>;

    /// Read a row and lock it against concurrent writers until the
    /// transaction ends.
    fn find_for_update(&mut self, id: BookId) -> Result<Option<Book>, StorageError>;

    /// Delete a row; returns false when no row had that id.
    fn delete(&mut self, id: BookId) -> Result<bool, StorageError>;

    /// Make every mutation in this transaction durable.
    fn commit(self) -> Result<(), StorageError>;

    /// Discard every mutation in this transaction.
    fn rollback(self) -> Result<(), StorageError>;
}

/// An ungrouped aggregate returned other than exactly one row.
#[derive(Debug, Error)]
#[error("Aggregate query returned {rows} rows, expected exactly one")]
pub struct AmbiguousAggregate {
    pub rows: usize,
}

/// The scalar of an ungrouped [`RecordStore::count`].
pub fn single_count(rows: Vec<u64>) -> Result<u64, AmbiguousAggregate> {
    match rows.as_slice() {
        [count] => Ok(*count),
        _ => Err(AmbiguousAggregate { rows: rows.len() }),
    }
}
