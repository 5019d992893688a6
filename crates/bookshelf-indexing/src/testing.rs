//! Fixtures shared by the indexing tests.

use std::sync::Arc;

use tempfile::TempDir;

use bookshelf_index::{
    book_index_settings, book_mapping, IndexGateway, IndexGatewayConfig, TantivyGateway,
};
use bookshelf_storage::{RecordStore, RecordTransaction, Storage};
use bookshelf_types::{BookId, NewBook};

pub use crate::fault::FaultyGateway;

pub const INDEX: &str = "book";

pub fn open_storage() -> (Arc<Storage>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let storage = Storage::open(temp_dir.path()).unwrap();
    (Arc::new(storage), temp_dir)
}

/// Gateway with no indexes yet.
pub fn open_gateway() -> (Arc<TantivyGateway>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let gateway = TantivyGateway::new(IndexGatewayConfig::new(temp_dir.path()));
    (Arc::new(gateway), temp_dir)
}

/// Gateway with the book index created and mapped.
pub fn open_provisioned_gateway() -> (Arc<TantivyGateway>, TempDir) {
    let (gateway, temp_dir) = open_gateway();
    gateway.create_index(INDEX, &book_index_settings()).unwrap();
    gateway.put_mapping(INDEX, &book_mapping()).unwrap();
    (gateway, temp_dir)
}

/// Insert books straight into the store, bypassing the index.
pub fn insert_books(storage: &Storage, books: &[(&str, &str)]) -> Vec<BookId> {
    let mut txn = storage.begin().unwrap();
    let ids = books
        .iter()
        .map(|(title, contents)| txn.insert(&NewBook::new(*title, *contents)).unwrap())
        .collect();
    txn.commit().unwrap();
    ids
}
