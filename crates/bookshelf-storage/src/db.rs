//! RocksDB wrapper for the book record store.
//!
//! Provides:
//! - Database open with column family setup
//! - Store-assigned ids from a monotonic sequence
//! - Scoped pessimistic transactions for inserts and deletes
//! - Filtered, title-ordered page queries and counts
//! - A non-caching streaming cursor for full exports

use std::path::Path;
use std::sync::Mutex;

use rocksdb::{
    ColumnFamily, DBIteratorWithThreadMode, IteratorMode, Options, ReadOptions, Transaction,
    TransactionDB, TransactionDBOptions,
};
use tracing::{debug, info, warn};

use bookshelf_types::{Book, BookId, NewBook};

use crate::column_families::{
    build_cf_descriptors, CF_BOOKS, CF_BOOK_TITLES, CF_META, NEXT_BOOK_ID_KEY,
};
use crate::error::StorageError;
use crate::filter::BookFilter;
use crate::keys::{BookKey, TitleKey};
use crate::store::{RecordStore, RecordTransaction};

/// Readahead for full-table export scans (2MB)
const STREAM_READAHEAD_BYTES: usize = 2 * 1024 * 1024;

/// Main record store for books
pub struct Storage {
    db: TransactionDB,
    /// Next id to hand out. Persisted in `meta` before an id leaves
    /// `allocate_id`, so ids are never reused, even across restarts.
    next_id: Mutex<BookId>,
}

impl Storage {
    /// Open storage at the given path, creating if necessary
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        info!(path = ?path, "Opening record store");

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_background_jobs(4);

        let txn_db_opts = TransactionDBOptions::default();
        let db: TransactionDB = TransactionDB::open_cf_descriptors(
            &db_opts,
            &txn_db_opts,
            path,
            build_cf_descriptors(),
        )?;

        let next_id = Self::load_next_id(&db)?;
        debug!(next_id, "Loaded book id sequence");

        Ok(Self {
            db,
            next_id: Mutex::new(next_id),
        })
    }

    /// Resume the id sequence from the persisted high-water mark, or past
    /// the highest stored id when that is larger
    fn load_next_id(db: &TransactionDB) -> Result<BookId, StorageError> {
        let meta_cf = db
            .cf_handle(CF_META)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(CF_META.to_string()))?;
        let marked = match db.get_cf(meta_cf, NEXT_BOOK_ID_KEY)? {
            Some(bytes) => BookKey::from_bytes(&bytes)?.id,
            None => 1,
        };

        let books_cf = db
            .cf_handle(CF_BOOKS)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(CF_BOOKS.to_string()))?;
        let mut iter = db.iterator_cf(books_cf, IteratorMode::End);
        let stored = match iter.next() {
            Some(result) => {
                let (key, _) = result?;
                BookKey::from_bytes(&key)?.id + 1
            }
            None => 1,
        };

        Ok(marked.max(stored))
    }

    /// Hand out the next id. The advanced mark is written outside any record
    /// transaction, so a rolled-back or crashed insert still consumes its id.
    fn allocate_id(&self) -> Result<BookId, StorageError> {
        let mut next_id = self.next_id.lock().unwrap_or_else(|e| e.into_inner());
        let id = *next_id;
        let meta_cf = self.cf(CF_META)?;
        self.db.put_cf(meta_cf, NEXT_BOOK_ID_KEY, BookKey::new(id + 1).to_bytes())?;
        *next_id = id + 1;
        Ok(id)
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, StorageError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(name.to_string()))
    }

    /// Get a single book by id
    pub fn get_book(&self, id: BookId) -> Result<Option<Book>, StorageError> {
        let cf = self.cf(CF_BOOKS)?;
        match self.db.get_cf(cf, BookKey::new(id).to_bytes())? {
            Some(bytes) => Ok(Some(Book::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }
}

impl RecordStore for Storage {
    type Transaction<'a> = StorageTransaction<'a> where Self: 'a;
    type Stream<'a> = BookStream<'a> where Self: 'a;

    fn begin(&self) -> Result<StorageTransaction<'_>, StorageError> {
        Ok(StorageTransaction {
            storage: self,
            txn: Some(self.db.transaction()),
        })
    }

    fn query(
        &self,
        filter: &BookFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Book>, StorageError> {
        let mut page = Vec::with_capacity(limit.min(64));
        if limit == 0 {
            return Ok(page);
        }

        let titles_cf = self.cf(CF_BOOK_TITLES)?;
        let mut skipped = 0usize;

        for item in self.db.iterator_cf(titles_cf, IteratorMode::Start) {
            let (key, _) = item?;
            let id = TitleKey::id_from_bytes(&key)?;

            // Unfiltered pages skip rows without reading them
            if filter.is_all() && skipped < offset {
                skipped += 1;
                continue;
            }

            // Row deleted after the scan started
            let Some(book) = self.get_book(id)? else {
                continue;
            };

            if !filter.matches(&book) {
                continue;
            }
            if skipped < offset {
                skipped += 1;
                continue;
            }

            page.push(book);
            if page.len() == limit {
                break;
            }
        }

        debug!(offset, limit, returned = page.len(), "Book page query");
        Ok(page)
    }

    fn count(&self, filter: &BookFilter) -> Result<Vec<u64>, StorageError> {
        let books_cf = self.cf(CF_BOOKS)?;
        let mut count = 0u64;

        for item in self.db.iterator_cf(books_cf, IteratorMode::Start) {
            let (_, value) = item?;
            if filter.is_all() || filter.matches(&Book::from_bytes(&value)?) {
                count += 1;
            }
        }

        Ok(vec![count])
    }

    fn get_many(&self, ids: &[BookId]) -> Result<Vec<Book>, StorageError> {
        // Key order, like an IN (...) lookup over the primary key
        let mut keys: Vec<BookId> = ids.to_vec();
        keys.sort_unstable();
        keys.dedup();

        let mut books = Vec::with_capacity(keys.len());
        for id in keys {
            if let Some(book) = self.get_book(id)? {
                books.push(book);
            }
        }
        Ok(books)
    }

    fn stream_all(&self) -> Result<BookStream<'_>, StorageError> {
        let books_cf = self.cf(CF_BOOKS)?;

        // Full scans must not evict the working set from the block cache
        let mut read_opts = ReadOptions::default();
        read_opts.fill_cache(false);
        read_opts.set_readahead_size(STREAM_READAHEAD_BYTES);

        debug!("Opened streaming cursor over books");
        Ok(BookStream {
            inner: self
                .db
                .iterator_cf_opt(books_cf, read_opts, IteratorMode::Start),
        })
    }
}

/// Single-pass cursor over all books in id order.
pub struct BookStream<'a> {
    inner: DBIteratorWithThreadMode<'a, TransactionDB>,
}

impl Iterator for BookStream<'_> {
    type Item = Result<Book, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        Some(
            item.map_err(StorageError::from)
                .and_then(|(_, value)| Ok(Book::from_bytes(&value)?)),
        )
    }
}

/// A write transaction on the record store.
///
/// Rolled back on drop unless [`RecordTransaction::commit`] was called.
pub struct StorageTransaction<'a> {
    storage: &'a Storage,
    txn: Option<Transaction<'a, TransactionDB>>,
}

impl<'a> StorageTransaction<'a> {
    fn active(&self) -> Result<&Transaction<'a, TransactionDB>, StorageError> {
        self.txn.as_ref().ok_or(StorageError::TransactionFinished)
    }
}

impl RecordTransaction for StorageTransaction<'_> {
    fn insert(&mut self, book: &NewBook) -> Result<BookId, StorageError> {
        let storage = self.storage;
        let txn = self.active()?;
        let books_cf = storage.cf(CF_BOOKS)?;
        let titles_cf = storage.cf(CF_BOOK_TITLES)?;

        let id = storage.allocate_id()?;
        let row = Book::new(id, book.title.clone(), book.contents.clone());

        txn.put_cf(books_cf, BookKey::new(id).to_bytes(), row.to_bytes()?)?;
        txn.put_cf(titles_cf, TitleKey::new(row.title.as_str(), id).to_bytes(), b"")?;

        debug!(id, "Inserted book");
        Ok(id)
    }

    fn find_for_update(&mut self, id: BookId) -> Result<Option<Book>, StorageError> {
        let storage = self.storage;
        let txn = self.active()?;
        let books_cf = storage.cf(CF_BOOKS)?;

        match txn.get_for_update_cf(books_cf, BookKey::new(id).to_bytes(), true)? {
            Some(bytes) => Ok(Some(Book::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    fn delete(&mut self, id: BookId) -> Result<bool, StorageError> {
        let Some(book) = self.find_for_update(id)? else {
            return Ok(false);
        };

        let storage = self.storage;
        let txn = self.active()?;
        let books_cf = storage.cf(CF_BOOKS)?;
        let titles_cf = storage.cf(CF_BOOK_TITLES)?;

        txn.delete_cf(books_cf, BookKey::new(id).to_bytes())?;
        txn.delete_cf(titles_cf, TitleKey::new(book.title, id).to_bytes())?;

        debug!(id, "Deleted book");
        Ok(true)
    }

    fn commit(mut self) -> Result<(), StorageError> {
        let txn = self.txn.take().ok_or(StorageError::TransactionFinished)?;
        txn.commit()?;
        debug!("Committed record store transaction");
        Ok(())
    }

    fn rollback(mut self) -> Result<(), StorageError> {
        let txn = self.txn.take().ok_or(StorageError::TransactionFinished)?;
        txn.rollback()?;
        debug!("Rolled back record store transaction");
        Ok(())
    }
}

impl Drop for StorageTransaction<'_> {
    fn drop(&mut self) {
        if let Some(txn) = self.txn.take() {
            match txn.rollback() {
                Ok(()) => debug!("Rolled back uncommitted transaction on drop"),
                Err(e) => warn!(error = %e, "Failed to roll back transaction on drop"),
            }
        }
    }
}
