//! End-to-end test infrastructure for Bookshelf.
//!
//! Provides a shared TestHarness over a real record store and search index
//! in a temp directory. Failure injection comes from
//! `bookshelf_indexing::FaultyGateway`.

use std::path::PathBuf;
use std::sync::Arc;

use bookshelf_index::{
    Hit, IndexGateway, IndexGatewayConfig, IndexQuery, SearchRequest, SortClause, TantivyGateway,
};
use bookshelf_indexing::{
    AddBookCommand, AddOutcome, DeleteBookCommand, DeleteOutcome, IndexingError,
    NoOpProgressCallback, ReindexConfig, ReindexPipeline, ReindexReport,
};
use bookshelf_search::Searchers;
use bookshelf_storage::{BookFilter, RecordStore, RecordTransaction, Storage};
use bookshelf_types::{Book, BookId, NewBook, SearchBackend, SearchQuery, SearchResult};

pub const INDEX: &str = "book";

pub const BACKENDS: [SearchBackend; 2] = [SearchBackend::Relational, SearchBackend::Index];

/// Shared test harness for E2E tests.
///
/// Owns a record store and an index root in one temp directory. The book
/// index is provisioned empty on construction.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    pub storage: Arc<Storage>,
    pub gateway: Arc<TantivyGateway>,
    pub index_path: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("db");
        let index_path = temp_dir.path().join("indexes");
        std::fs::create_dir_all(&index_path).expect("Failed to create index dir");

        let storage = Arc::new(Storage::open(&db_path).expect("Failed to open test storage"));
        let gateway = Arc::new(TantivyGateway::new(IndexGatewayConfig::new(&index_path)));

        let harness = Self {
            _temp_dir: temp_dir,
            storage,
            gateway,
            index_path,
        };
        harness.reindex();
        harness
    }

    pub fn searchers(&self) -> Searchers<Storage, TantivyGateway> {
        Searchers::new(self.storage.clone(), self.gateway.clone(), INDEX)
    }

    pub fn search(&self, backend: SearchBackend, word: Option<&str>, page: u32) -> SearchResult {
        self.searchers()
            .search(backend, &SearchQuery::new(word, page))
            .unwrap_or_else(|e| panic!("{} search failed: {}", backend, e))
    }

    /// Add one book through the write-through command.
    pub fn add(&self, title: &str, contents: &str) -> Book {
        let command = AddBookCommand::new(self.storage.clone(), self.gateway.clone(), INDEX);
        match command.execute(NewBook::new(title, contents)) {
            Ok(AddOutcome::Created(book)) => book,
            Err(e) => panic!("Failed to add {:?}: {}", title, e),
        }
    }

    pub fn delete(&self, id: BookId) -> DeleteOutcome {
        DeleteBookCommand::new(self.storage.clone(), self.gateway.clone(), INDEX)
            .execute(id)
            .expect("Failed to delete book")
    }

    /// Add every book through the write-through command.
    pub fn seed(&self, books: &[(&str, &str)]) -> Vec<Book> {
        books
            .iter()
            .map(|(title, contents)| self.add(title, contents))
            .collect()
    }

    /// Insert rows into the record store only.
    pub fn insert_unindexed(&self, books: &[(&str, &str)]) -> Vec<BookId> {
        let mut txn = self.storage.begin().expect("Failed to begin transaction");
        let ids = books
            .iter()
            .map(|(title, contents)| {
                txn.insert(&NewBook::new(*title, *contents))
                    .expect("Failed to insert book")
            })
            .collect();
        txn.commit().expect("Failed to commit");
        ids
    }

    pub fn reindex(&self) -> ReindexReport {
        self.try_reindex(ReindexConfig::new(INDEX))
            .expect("Failed to reindex")
    }

    pub fn try_reindex(&self, config: ReindexConfig) -> Result<ReindexReport, IndexingError> {
        ReindexPipeline::new(self.storage.clone(), self.gateway.clone(), config)
            .run(&NoOpProgressCallback)
    }

    pub fn record_count(&self) -> u64 {
        self.storage
            .count(&BookFilter::all())
            .expect("Failed to count records")[0]
    }

    /// Every indexed document in title order, with its source.
    pub fn index_snapshot(&self) -> (u64, Vec<Hit>) {
        let request = SearchRequest::new(IndexQuery::match_all())
            .with_sort(SortClause::asc("title"))
            .with_page(0, 10_000);
        let response = self
            .gateway
            .search(INDEX, &request)
            .expect("Failed to read index");
        let count = self.gateway.count(INDEX).expect("Failed to count documents");
        (count, response.hits)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

pub fn titles(result: &SearchResult) -> Vec<&str> {
    result
        .ordered_records
        .iter()
        .map(|book| book.title.as_str())
        .collect()
}

/// `n` books titled `T00`, `T01`, ... with empty contents.
pub fn numbered_titles(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("T{:02}", i)).collect()
}
