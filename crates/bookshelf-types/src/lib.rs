//! # bookshelf-types
//!
//! Shared domain types for the Bookshelf search system.
//!
//! This crate defines the data structures used throughout the workspace:
//! - Books: the records kept in the record store and mirrored in the index
//! - Search queries and results: the contract both searchers serve
//! - Settings: layered configuration
//!
//! ## Usage
//!
//! ```rust
//! use bookshelf_types::{NewBook, SearchQuery};
//!
//! let book = NewBook::new("ALPHA", "test contents");
//! let query = SearchQuery::new(Some("ALPHA"), 1);
//! assert!(query.validate().is_ok());
//! ```

pub mod book;
pub mod config;
pub mod error;
pub mod search;

pub use book::{char_width, display_width, Book, BookId, NewBook};
pub use config::{ReindexSettings, SearchBackend, SearchSettings, Settings};
pub use error::BookshelfError;
pub use search::{SearchQuery, SearchResult, MAX_WORD_CHARS, PAGE_SIZE};
