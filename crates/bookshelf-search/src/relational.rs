//! Substring search over the record store.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use bookshelf_storage::{single_count, BookFilter, RecordStore};
use bookshelf_types::{SearchBackend, SearchQuery, SearchResult, PAGE_SIZE};

use crate::error::SearchError;
use crate::searcher::Searcher;

/// Searches titles and contents with a case-sensitive `LIKE '%word%'`.
pub struct RelationalSearcher<S> {
    store: Arc<S>,
}

impl<S: RecordStore> RelationalSearcher<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: RecordStore> Searcher for RelationalSearcher<S> {
    fn backend(&self) -> SearchBackend {
        SearchBackend::Relational
    }

    fn search(&self, query: &SearchQuery) -> Result<SearchResult, SearchError> {
        let start = Instant::now();
        query.validate()?;

        // One predicate for both the count and the page
        let filter = BookFilter::title_or_contents_containing(query.word());

        let total_count = single_count(self.store.count(&filter)?)?;
        let ordered_records = self.store.query(&filter, query.offset(), PAGE_SIZE)?;

        let result = SearchResult {
            query_word: query.word().to_string(),
            elapsed: start.elapsed(),
            total_count,
            page_number: query.page,
            ordered_records,
        };

        info!(
            backend = "relational",
            word = query.word(),
            page = query.page,
            total = result.total_count,
            took = %result.took(),
            "Search complete"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{insert_books, open_storage, AggregateGroupsStore};
    use bookshelf_types::Book;

    fn titles(result: &SearchResult) -> Vec<&str> {
        result
            .ordered_records
            .iter()
            .map(|book| book.title.as_str())
            .collect()
    }

    #[test]
    fn test_empty_word_matches_all_in_title_order() {
        let (storage, _temp) = open_storage();
        insert_books(&storage, &[("C", ""), ("A", ""), ("B", "")]);
        let searcher = RelationalSearcher::new(storage);

        let result = searcher.search(&SearchQuery::new(None, 1)).unwrap();
        assert_eq!(result.total_count, 3);
        assert_eq!(titles(&result), vec!["A", "B", "C"]);
        assert_eq!(result.query_word, "");
    }

    #[test]
    fn test_matches_title_or_contents() {
        let (storage, _temp) = open_storage();
        insert_books(
            &storage,
            &[("ALPHA", "x"), ("beta", "about ALPHA"), ("gamma", "nothing")],
        );
        let searcher = RelationalSearcher::new(storage);

        let result = searcher.search(&SearchQuery::new(Some("ALPHA"), 1)).unwrap();
        assert_eq!(result.total_count, 2);
        assert_eq!(titles(&result), vec!["ALPHA", "beta"]);
    }

    #[test]
    fn test_case_sensitive() {
        let (storage, _temp) = open_storage();
        insert_books(&storage, &[("Alpha", ""), ("alpha", "")]);
        let searcher = RelationalSearcher::new(storage);

        let result = searcher.search(&SearchQuery::new(Some("Alpha"), 1)).unwrap();
        assert_eq!(titles(&result), vec!["Alpha"]);
    }

    #[test]
    fn test_wildcards_are_literal() {
        let (storage, _temp) = open_storage();
        insert_books(&storage, &[("100% cotton", ""), ("1000 nights", "")]);
        let searcher = RelationalSearcher::new(storage);

        let result = searcher.search(&SearchQuery::new(Some("0%"), 1)).unwrap();
        assert_eq!(titles(&result), vec!["100% cotton"]);

        let result = searcher.search(&SearchQuery::new(Some("1_0"), 1)).unwrap();
        assert_eq!(result.total_count, 0);
    }

    #[test]
    fn test_pagination() {
        let (storage, _temp) = open_storage();
        let books: Vec<(String, &str)> = (0..45).map(|i| (format!("T{:02}", i), "")).collect();
        let refs: Vec<(&str, &str)> = books.iter().map(|(t, c)| (t.as_str(), *c)).collect();
        insert_books(&storage, &refs);
        let searcher = RelationalSearcher::new(storage);

        let page3 = searcher.search(&SearchQuery::new(None, 3)).unwrap();
        assert_eq!(page3.total_count, 45);
        assert_eq!(page3.page_count(), 3);
        assert_eq!(page3.ordered_records.len(), 5);
        assert_eq!(page3.ordered_records[0].title, "T40");

        let page4 = searcher.search(&SearchQuery::new(None, 4)).unwrap();
        assert_eq!(page4.total_count, 45);
        assert!(page4.ordered_records.is_empty());
    }

    #[test]
    fn test_page_zero_rejected() {
        let (storage, _temp) = open_storage();
        let searcher = RelationalSearcher::new(storage);

        let err = searcher.search(&SearchQuery::new(None, 0)).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_ambiguous_count_is_unexpected_state() {
        let (storage, _temp) = open_storage();
        insert_books(&storage, &[("A", "")]);
        let store = Arc::new(AggregateGroupsStore::new(storage, 2));
        let searcher = RelationalSearcher::new(store);

        let err = searcher.search(&SearchQuery::new(None, 1)).unwrap_err();
        assert!(matches!(err, SearchError::UnexpectedState(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_result_records_are_full_rows() {
        let (storage, _temp) = open_storage();
        let ids = insert_books(&storage, &[("ALPHA", "test contents")]);
        let searcher = RelationalSearcher::new(storage);

        let result = searcher.search(&SearchQuery::new(Some("test"), 1)).unwrap();
        assert_eq!(
            result.ordered_records,
            vec![Book::new(ids[0], "ALPHA", "test contents")]
        );
    }
}
