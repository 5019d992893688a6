//! Search index gateway contract.
//!
//! Shaped after the Elasticsearch client: admin calls return an
//! acknowledgement, document writes return a result status, and bulk
//! returns one item per operation. Callers are expected to inspect
//! these rather than rely on `Err` alone, since a write can succeed at
//! the transport level and still not have the expected result.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::document::{DocumentId, Source};
use crate::error::IndexError;
use crate::mapping::{IndexMapping, IndexSettings};
use crate::query::{SearchRequest, SearchResponse};

/// Response to index admin calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledged {
    pub acknowledged: bool,
    pub index: String,
}

impl Acknowledged {
    pub fn yes(index: &str) -> Self {
        Self {
            acknowledged: true,
            index: index.to_string(),
        }
    }
}

/// Outcome of a single-document write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteResult {
    Created,
    Updated,
    Deleted,
    NotFound,
    Noop,
}

impl WriteResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteResult::Created => "created",
            WriteResult::Updated => "updated",
            WriteResult::Deleted => "deleted",
            WriteResult::NotFound => "not_found",
            WriteResult::Noop => "noop",
        }
    }
}

impl fmt::Display for WriteResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response to `index_document` / `delete_document`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResponse {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub result: WriteResult,
}

/// One bulk action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkOperation {
    Index { id: DocumentId, source: Source },
    Delete { id: DocumentId },
}

impl BulkOperation {
    pub fn id(&self) -> DocumentId {
        match self {
            BulkOperation::Index { id, .. } | BulkOperation::Delete { id } => *id,
        }
    }
}

/// Per-operation bulk result. Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItem {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    /// HTTP-style status: 201 created, 200 updated/deleted, 404, 400
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<WriteResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BulkItem {
    pub fn ok(id: DocumentId, result: WriteResult) -> Self {
        let status = match result {
            WriteResult::Created => 201,
            WriteResult::NotFound => 404,
            _ => 200,
        };
        Self {
            id,
            status,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(id: DocumentId, error: impl Into<String>) -> Self {
        Self {
            id,
            status: 400,
            result: None,
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Response to `bulk`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkResponse {
    pub took: Duration,
    /// Set when any item failed
    pub errors: bool,
    pub items: Vec<BulkItem>,
}

impl BulkResponse {
    pub fn failed_items(&self) -> impl Iterator<Item = &BulkItem> {
        self.items.iter().filter(|item| item.is_error())
    }
}

/// Admin, query and write access to named indexes.
pub trait IndexGateway: Send + Sync {
    fn index_exists(&self, index: &str) -> Result<bool, IndexError>;

    /// Create an empty index with analysis settings. Documents can be
    /// written only after [`IndexGateway::put_mapping`].
    fn create_index(&self, index: &str, settings: &IndexSettings)
        -> Result<Acknowledged, IndexError>;

    fn delete_index(&self, index: &str) -> Result<Acknowledged, IndexError>;

    fn put_mapping(&self, index: &str, mapping: &IndexMapping)
        -> Result<Acknowledged, IndexError>;

    fn search(&self, index: &str, request: &SearchRequest) -> Result<SearchResponse, IndexError>;

    /// Create or replace a document. Visible to searches on return.
    fn index_document(
        &self,
        index: &str,
        id: DocumentId,
        source: &Source,
    ) -> Result<WriteResponse, IndexError>;

    /// Delete a document; `NotFound` when there was none.
    fn delete_document(&self, index: &str, id: DocumentId) -> Result<WriteResponse, IndexError>;

    /// Apply operations in order and commit once.
    fn bulk(&self, index: &str, operations: Vec<BulkOperation>)
        -> Result<BulkResponse, IndexError>;

    fn get_document(&self, index: &str, id: DocumentId) -> Result<Option<Source>, IndexError>;

    /// Number of live documents.
    fn count(&self, index: &str) -> Result<u64, IndexError>;
}

impl<G: IndexGateway + ?Sized> IndexGateway for Arc<G> {
    fn index_exists(&self, index: &str) -> Result<bool, IndexError> {
        (**self).index_exists(index)
    }

    fn create_index(
        &self,
        index: &str,
        settings: &IndexSettings,
    ) -> Result<Acknowledged, IndexError> {
        (**self).create_index(index, settings)
    }

    fn delete_index(&self, index: &str) -> Result<Acknowledged, IndexError> {
        (**self).delete_index(index)
    }

    fn put_mapping(
        &self,
        index: &str,
        mapping: &IndexMapping,
    ) -> Result<Acknowledged, IndexError> {
        (**self).put_mapping(index, mapping)
    }

    fn search(&self, index: &str, request: &SearchRequest) -> Result<SearchResponse, IndexError> {
        (**self).search(index, request)
    }

    fn index_document(
        &self,
        index: &str,
        id: DocumentId,
        source: &Source,
    ) -> Result<WriteResponse, IndexError> {
        (**self).index_document(index, id, source)
    }

    fn delete_document(&self, index: &str, id: DocumentId) -> Result<WriteResponse, IndexError> {
        (**self).delete_document(index, id)
    }

    fn bulk(
        &self,
        index: &str,
        operations: Vec<BulkOperation>,
    ) -> Result<BulkResponse, IndexError> {
        (**self).bulk(index, operations)
    }

    fn get_document(&self, index: &str, id: DocumentId) -> Result<Option<Source>, IndexError> {
        (**self).get_document(index, id)
    }

    fn count(&self, index: &str) -> Result<u64, IndexError> {
        (**self).count(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_result_strings() {
        assert_eq!(WriteResult::Created.to_string(), "created");
        assert_eq!(
            serde_json::to_value(WriteResult::NotFound).unwrap(),
            serde_json::json!("not_found")
        );
    }

    #[test]
    fn test_bulk_item_status() {
        assert_eq!(BulkItem::ok(1, WriteResult::Created).status, 201);
        assert_eq!(BulkItem::ok(1, WriteResult::Updated).status, 200);
        assert_eq!(BulkItem::ok(1, WriteResult::NotFound).status, 404);

        let failed = BulkItem::failed(2, "bad");
        assert_eq!(failed.status, 400);
        assert!(failed.is_error());
    }

    #[test]
    fn test_write_response_json_shape() {
        let response = WriteResponse {
            index: "book".to_string(),
            id: 5,
            result: WriteResult::Created,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["_index"], "book");
        assert_eq!(json["_id"], 5);
        assert_eq!(json["result"], "created");
    }
}
