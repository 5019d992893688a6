//! Column family definitions for RocksDB.
//!
//! - books: one row per book, keyed by id (point lookups, id-ordered scans)
//! - book_titles: empty-valued ordering index keyed by title then id
//! - meta: store bookkeeping such as the id high-water mark

use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family name for book rows
pub const CF_BOOKS: &str = "books";

/// Column family name for the title ordering index
pub const CF_BOOK_TITLES: &str = "book_titles";

/// Column family name for store bookkeeping
pub const CF_META: &str = "meta";

/// Key in `meta` holding the next id to hand out (8-byte big-endian)
pub const NEXT_BOOK_ID_KEY: &[u8] = b"next_book_id";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[CF_BOOKS, CF_BOOK_TITLES, CF_META];

/// Book rows hold unbounded text; compress them.
fn books_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Build all column family descriptors
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::new(CF_BOOKS, books_options()),
        ColumnFamilyDescriptor::new(CF_BOOK_TITLES, Options::default()),
        ColumnFamilyDescriptor::new(CF_META, Options::default()),
    ]
}
