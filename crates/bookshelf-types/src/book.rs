//! Book records.
//!
//! A book is the unit of both stores: the record store keeps the
//! authoritative copy, the search index keeps a mirror addressed by the
//! same id.

use serde::{Deserialize, Serialize};

/// Store-assigned book identity.
pub type BookId = u64;

/// Display width of the contents excerpt shown by [`Book::summary`].
const SUMMARY_WIDTH: usize = 80;

const TRIM_MARKER: &str = "...";

/// Columns `c` takes on a terminal: 2 for East Asian wide and fullwidth
/// characters, 1 for everything else.
pub fn char_width(c: char) -> usize {
    match u32::from(c) {
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3040..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x20000..=0x2FFFD
        | 0x30000..=0x3FFFD => 2,
        _ => 1,
    }
}

/// Sum of [`char_width`] over `text`.
pub fn display_width(text: &str) -> usize {
    text.chars().map(char_width).sum()
}

/// A stored book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Identity assigned by the record store on insert
    pub id: BookId,

    /// Title (sort key for every search backend)
    pub title: String,

    /// Full text
    pub contents: String,
}

impl Book {
    pub fn new(id: BookId, title: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            contents: contents.into(),
        }
    }

    /// Attach an id to an insert payload.
    pub fn from_new(id: BookId, new_book: NewBook) -> Self {
        Self {
            id,
            title: new_book.title,
            contents: new_book.contents,
        }
    }

    /// Serialize to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Display copy with contents cut to 80 columns.
    ///
    /// Wide characters count as two columns. When anything is cut, `...`
    /// is appended and the result still fits in 80 columns.
    pub fn summary(&self) -> Book {
        let contents = if display_width(&self.contents) > SUMMARY_WIDTH {
            let budget = SUMMARY_WIDTH - TRIM_MARKER.len();
            let mut used = 0;
            let mut cut: String = self
                .contents
                .chars()
                .take_while(|c| {
                    used += char_width(*c);
                    used <= budget
                })
                .collect();
            cut.push_str(TRIM_MARKER);
            cut
        } else {
            self.contents.clone()
        };

        Book {
            id: self.id,
            title: self.title.clone(),
            contents,
        }
    }
}

/// Insert payload for a book that has no id yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub contents: String,
}

impl NewBook {
    pub fn new(title: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            contents: contents.into(),
        }
    }
}
