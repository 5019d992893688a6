//! Backend selection.

use std::sync::Arc;

use bookshelf_index::IndexGateway;
use bookshelf_storage::RecordStore;
use bookshelf_types::{SearchBackend, SearchQuery, SearchResult};

use crate::error::SearchError;
use crate::index::IndexSearcher;
use crate::relational::RelationalSearcher;
use crate::searcher::Searcher;

/// Both searchers over the same pair of stores.
pub struct Searchers<S, G> {
    relational: RelationalSearcher<S>,
    index: IndexSearcher<S, G>,
}

impl<S: RecordStore, G: IndexGateway> Searchers<S, G> {
    pub fn new(store: Arc<S>, gateway: Arc<G>, index_name: impl Into<String>) -> Self {
        Self {
            relational: RelationalSearcher::new(store.clone()),
            index: IndexSearcher::new(store, gateway, index_name),
        }
    }

    /// The searcher serving `backend`.
    pub fn get(&self, backend: SearchBackend) -> &dyn Searcher {
        match backend {
            SearchBackend::Relational => &self.relational,
            SearchBackend::Index => &self.index,
        }
    }

    pub fn search(
        &self,
        backend: SearchBackend,
        query: &SearchQuery,
    ) -> Result<SearchResult, SearchError> {
        self.get(backend).search(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{add_books, open_gateway, open_storage, INDEX};

    #[test]
    fn test_get_dispatches_by_backend() {
        let (storage, _db) = open_storage();
        let (gateway, _idx) = open_gateway();
        let searchers = Searchers::new(storage, gateway, INDEX);

        assert_eq!(
            searchers.get(SearchBackend::Relational).backend(),
            SearchBackend::Relational
        );
        assert_eq!(
            searchers.get(SearchBackend::Index).backend(),
            SearchBackend::Index
        );
    }

    #[test]
    fn test_backends_agree_on_substring_queries() {
        let (storage, _db) = open_storage();
        let (gateway, _idx) = open_gateway();
        add_books(
            &storage,
            &gateway,
            &[
                ("吾輩は猫である", "名前はまだ無い"),
                ("坊っちゃん", "親譲りの無鉄砲で"),
                ("ALPHA", "test contents"),
                ("beta", "contains ALPHA too"),
            ],
        );
        let searchers = Searchers::new(storage, gateway, INDEX);

        for word in ["猫", "無い", "ALPHA", "test", "まだ無"] {
            let query = SearchQuery::new(Some(word), 1);
            let relational = searchers.search(SearchBackend::Relational, &query).unwrap();
            let index = searchers.search(SearchBackend::Index, &query).unwrap();

            assert_eq!(relational.total_count, index.total_count, "word {}", word);
            assert_eq!(
                relational.ordered_records, index.ordered_records,
                "word {}",
                word
            );
        }
    }
}
