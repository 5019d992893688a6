//! Row filters for record store queries.
//!
//! A filter is the WHERE clause `col LIKE '%word%' OR ...` with the word's
//! metacharacters escaped, so `%`, `_` and `\` in the word only match
//! themselves. Matching is case-sensitive over Unicode scalar values
//! (binary collation).

use bookshelf_types::Book;

const ESCAPE: char = '\\';

/// Escape LIKE metacharacters so `word` only matches itself.
pub fn escape_like(word: &str) -> String {
    let mut escaped = String::with_capacity(word.len());
    for c in word.chars() {
        if matches!(c, '%' | '_' | ESCAPE) {
            escaped.push(ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// An escaped `%word%` pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikePattern {
    source: String,
    needle: String,
}

impl LikePattern {
    /// Pattern matching any text that contains `word` literally.
    pub fn containing(word: &str) -> Self {
        Self {
            source: format!("%{}%", escape_like(word)),
            needle: word.to_string(),
        }
    }

    /// The pattern as it would appear in a LIKE clause.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, text: &str) -> bool {
        text.contains(self.needle.as_str())
    }
}

/// Book columns a filter can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Title,
    Contents,
}

impl Column {
    fn value<'a>(&self, book: &'a Book) -> &'a str {
        match self {
            Column::Title => &book.title,
            Column::Contents => &book.contents,
        }
    }
}

/// LIKE tests OR-combined. No clauses matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    clauses: Vec<(Column, LikePattern)>,
}

impl BookFilter {
    /// Match every row.
    pub fn all() -> Self {
        Self::default()
    }

    /// Title or contents contains `word`; an empty word matches everything.
    pub fn title_or_contents_containing(word: &str) -> Self {
        if word.is_empty() {
            return Self::all();
        }
        let pattern = LikePattern::containing(word);
        Self {
            clauses: vec![
                (Column::Title, pattern.clone()),
                (Column::Contents, pattern),
            ],
        }
    }

    pub fn is_all(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, book: &Book) -> bool {
        self.is_all()
            || self
                .clauses
                .iter()
                .any(|(column, pattern)| pattern.matches(column.value(book)))
    }
}
