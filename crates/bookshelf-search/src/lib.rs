//! # bookshelf-search
//!
//! Keyword search for Bookshelf.
//!
//! Two backends serve one contract ([`Searcher`]):
//! - [`RelationalSearcher`]: case-sensitive substring filter over the
//!   record store
//! - [`IndexSearcher`]: n-gram queries against the search index, with
//!   records loaded from the record store in index order
//!
//! Both return pages of 20 records ordered by title, then id.
//! [`Searchers`] picks one per [`bookshelf_types::SearchBackend`].

pub mod backend;
pub mod error;
pub mod index;
pub mod relational;
pub mod searcher;

#[cfg(test)]
mod testing;

pub use backend::Searchers;
pub use error::SearchError;
pub use index::{reorder, shape_query, IndexSearcher};
pub use relational::RelationalSearcher;
pub use searcher::Searcher;
