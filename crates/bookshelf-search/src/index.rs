//! N-gram search over the search index, hydrated from the record store.
//!
//! Query shaping by word length in characters:
//! - empty: match all
//! - one character: `match` on the `unigram` sub-fields
//! - two or more: `match_phrase` on the `bigram` sub-fields, which matches
//!   exactly the documents containing the word as a substring (after
//!   width folding and lowercasing)

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use bookshelf_index::{
    IndexGateway, IndexQuery, SearchRequest, SortClause, BIGRAM_SUBFIELD, UNIGRAM_SUBFIELD,
};
use bookshelf_storage::RecordStore;
use bookshelf_types::{Book, BookId, SearchBackend, SearchQuery, SearchResult, PAGE_SIZE};

use crate::error::SearchError;
use crate::searcher::Searcher;

const SEARCHED_FIELDS: [&str; 2] = ["title", "contents"];
const SORT_FIELD: &str = "title";

/// Build the index query for `word`.
pub fn shape_query(word: &str) -> IndexQuery {
    match word.chars().count() {
        0 => IndexQuery::match_all(),
        1 => IndexQuery::should(
            SEARCHED_FIELDS
                .iter()
                .map(|field| {
                    IndexQuery::matching(&format!("{}.{}", field, UNIGRAM_SUBFIELD), word)
                })
                .collect(),
        ),
        _ => IndexQuery::should(
            SEARCHED_FIELDS
                .iter()
                .map(|field| {
                    IndexQuery::match_phrase(&format!("{}.{}", field, BIGRAM_SUBFIELD), word)
                })
                .collect(),
        ),
    }
}

/// Put records in the index's order.
///
/// `records` may come back from the store in any order; every id must be
/// present.
pub fn reorder(ids: &[BookId], records: Vec<Book>) -> Result<Vec<Book>, SearchError> {
    let mut by_id: HashMap<BookId, Book> =
        records.into_iter().map(|book| (book.id, book)).collect();

    ids.iter()
        .map(|id| {
            by_id
                .remove(id)
                .ok_or(SearchError::InconsistentIndex { id: *id })
        })
        .collect()
}

/// Searches the n-gram index and loads the matching records.
pub struct IndexSearcher<S, G> {
    store: Arc<S>,
    gateway: Arc<G>,
    index_name: String,
}

impl<S: RecordStore, G: IndexGateway> IndexSearcher<S, G> {
    pub fn new(store: Arc<S>, gateway: Arc<G>, index_name: impl Into<String>) -> Self {
        Self {
            store,
            gateway,
            index_name: index_name.into(),
        }
    }
}

impl<S: RecordStore, G: IndexGateway> Searcher for IndexSearcher<S, G> {
    fn backend(&self) -> SearchBackend {
        SearchBackend::Index
    }

    fn search(&self, query: &SearchQuery) -> Result<SearchResult, SearchError> {
        let start = Instant::now();
        query.validate()?;

        let request = SearchRequest::new(shape_query(query.word()))
            .with_sort(SortClause::asc(SORT_FIELD))
            .with_page(query.offset(), PAGE_SIZE);
        let response = self.gateway.search(&self.index_name, &request)?;

        let ids = response.ids();
        let records = self.store.get_many(&ids)?;
        debug!(hits = ids.len(), records = records.len(), "Hydrated index hits");
        let ordered_records = reorder(&ids, records)?;

        let result = SearchResult {
            query_word: query.word().to_string(),
            elapsed: start.elapsed(),
            total_count: response.total,
            page_number: query.page,
            ordered_records,
        };

        info!(
            backend = "index",
            index = %self.index_name,
            word = query.word(),
            page = query.page,
            total = result.total_count,
            took = %result.took(),
            "Search complete"
        );
        Ok(result)
    }
}
