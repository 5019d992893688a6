//! Search index error types.

use thiserror::Error;

/// Errors that can occur in the search index gateway.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Tantivy index error
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings or mapping file could not be read or written
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Index names are ASCII alphanumerics, `_` and `-`, not starting
    /// with `_` or `-`
    #[error("Invalid index name: {0:?}")]
    InvalidIndexName(String),

    /// No index with this name
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// create_index on a name that is taken
    #[error("Index already exists: {0}")]
    IndexAlreadyExists(String),

    /// Index exists but has no mapping yet, so it cannot hold documents
    #[error("Index {0} has no mapping")]
    MappingNotDefined(String),

    /// Mapping rejected (unknown analyzer, conflicting redefinition)
    #[error("Invalid mapping: {0}")]
    InvalidMapping(String),

    /// Analysis settings rejected
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Query references a field the mapping does not define, or uses it
    /// in a way its type does not support
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Document body does not fit the mapping
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// On-disk schema does not match the stored mapping
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Writer or handle lock poisoned
    #[error("Index is locked: {0}")]
    IndexLocked(String),
}
