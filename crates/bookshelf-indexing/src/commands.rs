//! Write-through Add and Delete.
//!
//! Each command mutates the record store inside a transaction, mirrors the
//! mutation into the index, and commits only once the index reports the
//! expected result. Any other outcome rolls the record store back, so the
//! store never holds a change the index has not acknowledged.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use bookshelf_index::{book_source, IndexGateway, WriteResult};
use bookshelf_storage::{RecordStore, RecordTransaction};
use bookshelf_types::{Book, BookId, NewBook};

use crate::error::IndexingError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AddOutcome {
    Created(Book),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "id", rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted(BookId),
    /// No record had the id; nothing was changed
    NotFound(BookId),
}

fn discard<T: RecordTransaction>(txn: T) {
    if let Err(e) = txn.rollback() {
        warn!(error = %e, "Failed to roll back record store transaction");
    }
}

/// Inserts a book and indexes it.
pub struct AddBookCommand<S, G> {
    store: Arc<S>,
    gateway: Arc<G>,
    index_name: String,
}

impl<S: RecordStore, G: IndexGateway> AddBookCommand<S, G> {
    pub fn new(store: Arc<S>, gateway: Arc<G>, index_name: impl Into<String>) -> Self {
        Self {
            store,
            gateway,
            index_name: index_name.into(),
        }
    }

    pub fn execute(&self, new_book: NewBook) -> Result<AddOutcome, IndexingError> {
        let mut txn = self.store.begin()?;
        let id = txn.insert(&new_book)?;
        let book = Book::from_new(id, new_book);

        // An Err here drops the transaction, which rolls it back
        let response = self
            .gateway
            .index_document(&self.index_name, id, &book_source(&book))?;
        if response.result != WriteResult::Created {
            discard(txn);
            return Err(IndexingError::acknowledgement(&response));
        }

        if let Err(e) = txn.commit() {
            // Take the document back out so the index does not run ahead
            if let Err(undo) = self.gateway.delete_document(&self.index_name, id) {
                warn!(id, error = %undo, "Failed to remove document after commit failure");
            }
            return Err(e.into());
        }

        info!(id, title = %book.title, "Book added");
        Ok(AddOutcome::Created(book))
    }
}

/// Deletes a book and its indexed document.
pub struct DeleteBookCommand<S, G> {
    store: Arc<S>,
    gateway: Arc<G>,
    index_name: String,
}

impl<S: RecordStore, G: IndexGateway> DeleteBookCommand<S, G> {
    pub fn new(store: Arc<S>, gateway: Arc<G>, index_name: impl Into<String>) -> Self {
        Self {
            store,
            gateway,
            index_name: index_name.into(),
        }
    }

    pub fn execute(&self, id: BookId) -> Result<DeleteOutcome, IndexingError> {
        let mut txn = self.store.begin()?;

        if txn.find_for_update(id)?.is_none() {
            discard(txn);
            info!(id, "No such book");
            return Ok(DeleteOutcome::NotFound(id));
        }
        txn.delete(id)?;

        let response = self.gateway.delete_document(&self.index_name, id)?;
        if response.result != WriteResult::Deleted {
            discard(txn);
            return Err(IndexingError::acknowledgement(&response));
        }

        txn.commit()?;
        info!(id, "Book deleted");
        Ok(DeleteOutcome::Deleted(id))
    }
}
