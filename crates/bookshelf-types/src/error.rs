//! Error types shared across the Bookshelf workspace.

use thiserror::Error;

/// Errors raised by configuration loading and input validation.
#[derive(Debug, Error)]
pub enum BookshelfError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bad query parameters (page < 1, malformed word)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
