//! Record store error types.

use thiserror::Error;

/// Errors raised by the record store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// The database was opened without a required column family
    #[error("Missing column family: {0}")]
    ColumnFamilyNotFound(String),

    /// A stored key does not decode as a book or title key
    #[error("Corrupt key: {0}")]
    Key(String),

    /// A stored row does not decode as a book
    #[error("Corrupt row: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transaction used after commit or rollback
    #[error("Transaction already finished")]
    TransactionFinished,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_row_message() {
        let err: StorageError = serde_json::from_slice::<serde_json::Value>(b"{")
            .unwrap_err()
            .into();
        assert!(err.to_string().starts_with("Corrupt row:"));
    }
}
