//! Fixtures shared by the searcher tests.

use std::sync::Arc;

use tempfile::TempDir;

use bookshelf_index::{
    book_index_settings, book_mapping, book_source, IndexGateway, IndexGatewayConfig,
    TantivyGateway,
};
use bookshelf_storage::{
    BookFilter, BookStream, RecordStore, RecordTransaction, Storage, StorageError,
    StorageTransaction,
};
use bookshelf_types::{Book, BookId, NewBook};

pub const INDEX: &str = "book";

pub fn open_storage() -> (Arc<Storage>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let storage = Storage::open(temp_dir.path()).unwrap();
    (Arc::new(storage), temp_dir)
}

pub fn open_gateway() -> (Arc<TantivyGateway>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let gateway = TantivyGateway::new(IndexGatewayConfig::new(temp_dir.path()));
    gateway.create_index(INDEX, &book_index_settings()).unwrap();
    gateway.put_mapping(INDEX, &book_mapping()).unwrap();
    (Arc::new(gateway), temp_dir)
}

/// Insert books in one transaction and return their ids in input order.
pub fn insert_books(storage: &Storage, books: &[(&str, &str)]) -> Vec<BookId> {
    let mut txn = storage.begin().unwrap();
    let ids = books
        .iter()
        .map(|(title, contents)| txn.insert(&NewBook::new(*title, *contents)).unwrap())
        .collect();
    txn.commit().unwrap();
    ids
}

/// Insert books into the store and mirror them into the index.
pub fn add_books(
    storage: &Storage,
    gateway: &TantivyGateway,
    books: &[(&str, &str)],
) -> Vec<BookId> {
    let ids = insert_books(storage, books);
    for (id, (title, contents)) in ids.iter().zip(books) {
        gateway
            .index_document(INDEX, *id, &book_source(&Book::new(*id, *title, *contents)))
            .unwrap();
    }
    ids
}

/// Store whose count query reports one row per aggregate group, as an
/// engine would if the count were accidentally grouped.
pub struct AggregateGroupsStore {
    inner: Arc<Storage>,
    groups: usize,
}

impl AggregateGroupsStore {
    pub fn new(inner: Arc<Storage>, groups: usize) -> Self {
        Self { inner, groups }
    }
}

impl RecordStore for AggregateGroupsStore {
    type Transaction<'a> = StorageTransaction<'a> where Self: 'a;
    type Stream<'a> = BookStream<'a> where Self: 'a;

    fn begin(&self) -> Result<StorageTransaction<'_>, StorageError> {
        self.inner.begin()
    }

    fn query(
        &self,
        filter: &BookFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Book>, StorageError> {
        self.inner.query(filter, offset, limit)
    }

    fn count(&self, filter: &BookFilter) -> Result<Vec<u64>, StorageError> {
        let total = self.inner.count(filter)?[0];
        Ok(vec![total; self.groups])
    }

    fn get_many(&self, ids: &[BookId]) -> Result<Vec<Book>, StorageError> {
        self.inner.get_many(ids)
    }

    fn stream_all(&self) -> Result<BookStream<'_>, StorageError> {
        self.inner.stream_all()
    }
}
