//! # bookshelf-index
//!
//! Embedded full-text index for Bookshelf using Tantivy.
//!
//! The index is reached through [`IndexGateway`], an Elasticsearch-shaped
//! API: named indexes with analysis settings and a field mapping, a small
//! query DSL, acknowledged admin calls, per-document write results, and
//! bulk requests with per-item outcomes.
//!
//! ## Features
//! - Positional n-gram tokenizer so phrase queries over bigrams act as
//!   substring matches
//! - Width folding and lowercasing filters
//! - Keyword sub-field sorting with an id tiebreak
//! - Persistent indexes under one root directory, reopened on demand

pub mod analysis;
pub mod document;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod index;
pub mod mapping;
pub mod query;
pub mod schema;
pub mod sort;

pub use analysis::{fold_width, NgramTokenizer, WidthFolder};
pub use document::{book_from_source, book_source, DocumentId, Source};
pub use engine::TantivyGateway;
pub use error::IndexError;
pub use gateway::{
    Acknowledged, BulkItem, BulkOperation, BulkResponse, IndexGateway, WriteResponse, WriteResult,
};
pub use index::{IndexGatewayConfig, OpenIndex};
pub use mapping::{
    book_index_settings, book_mapping, AnalysisSettings, AnalyzerSettings, FieldMapping,
    FieldType, IndexMapping, IndexSettings, TokenFilterKind, TokenizerSettings, BIGRAM_ANALYZER,
    BIGRAM_SUBFIELD, UNIGRAM_ANALYZER, UNIGRAM_SUBFIELD,
};
pub use query::{
    BoolQuery, Hit, IndexQuery, MatchAllQuery, SearchRequest, SearchResponse, SortClause,
    SortOrder,
};
pub use schema::{IndexSchema, ID_FIELD};
pub use sort::{sorted_page, SortedPage};
