//! Search query and result types shared by every searcher.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::book::Book;
use crate::error::BookshelfError;

/// Records per result page, for every backend.
pub const PAGE_SIZE: usize = 20;

/// Longest accepted search word, in characters.
pub const MAX_WORD_CHARS: usize = 256;

/// A keyword search request.
///
/// An absent or empty `word` matches every book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub word: Option<String>,

    /// 1-indexed page number
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_page() -> u32 {
    1
}

impl SearchQuery {
    pub fn new(word: Option<&str>, page: u32) -> Self {
        Self {
            word: word.map(str::to_string),
            page,
        }
    }

    /// The word to search for, or `""` when matching everything.
    pub fn word(&self) -> &str {
        self.word.as_deref().unwrap_or("")
    }

    /// Row offset of the first record on this page.
    ///
    /// Callers must validate first; page 0 is clamped to offset 0.
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * PAGE_SIZE
    }

    /// Reject page numbers below 1 and malformed words.
    pub fn validate(&self) -> Result<(), BookshelfError> {
        if self.page < 1 {
            return Err(BookshelfError::Validation(format!(
                "page must be greater than or equal to 1, got {}",
                self.page
            )));
        }
        let word = self.word();
        if word.contains('\0') {
            return Err(BookshelfError::Validation(
                "word must not contain NUL characters".to_string(),
            ));
        }
        let chars = word.chars().count();
        if chars > MAX_WORD_CHARS {
            return Err(BookshelfError::Validation(format!(
                "word must be at most {} characters, got {}",
                MAX_WORD_CHARS, chars
            )));
        }
        Ok(())
    }
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            word: None,
            page: default_page(),
        }
    }
}

/// One page of search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The word that was searched (empty for match-all)
    pub query_word: String,

    /// Wall time spent serving the query
    pub elapsed: Duration,

    /// Matches before pagination, best-effort under concurrent writes
    pub total_count: u64,

    pub page_number: u32,

    /// Records in the order produced by the serving backend
    pub ordered_records: Vec<Book>,
}

impl SearchResult {
    /// Elapsed time formatted as milliseconds with two decimals.
    pub fn took(&self) -> String {
        format!("{:.2}ms", self.elapsed.as_secs_f64() * 1000.0)
    }

    /// Number of non-empty pages for the total count.
    pub fn page_count(&self) -> u64 {
        self.total_count.div_ceil(PAGE_SIZE as u64)
    }

    /// Response body for API and CLI consumers.
    ///
    /// Contents are shortened with [`Book::summary`].
    pub fn to_json(&self) -> serde_json::Value {
        let books: Vec<Book> = self.ordered_records.iter().map(Book::summary).collect();
        serde_json::json!({
            "took": self.took(),
            "word": self.query_word,
            "total": self.total_count,
            "page": self.page_number,
            "books": books,
        })
    }
}
