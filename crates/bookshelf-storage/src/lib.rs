//! Record store for Bookshelf.
//!
//! Provides the system of record for books on top of a RocksDB
//! `TransactionDB`:
//! - Column family isolation for rows and the title ordering index
//! - Store-assigned monotonic ids
//! - Scoped transactions that roll back when dropped uncommitted
//! - Substring (LIKE) filtered page and count queries ordered by title
//! - A streaming full-table cursor for index rebuilds
//!
//! Consumers depend on the [`RecordStore`] trait; [`Storage`] is the
//! RocksDB implementation.

pub mod column_families;
pub mod db;
pub mod error;
pub mod filter;
pub mod keys;
pub mod store;

pub use db::{BookStream, Storage, StorageTransaction};
pub use error::StorageError;
pub use filter::{escape_like, BookFilter, Column, LikePattern};
pub use keys::{BookKey, TitleKey};
pub use store::{single_count, AmbiguousAggregate, RecordStore, RecordTransaction};
