//! Query DSL and search request/response types.
//!
//! Serialized in Elasticsearch's request body shape, e.g.
//! `{"bool": {"should": [{"match_phrase": {"title.bigram": "ab"}}]}}`.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::document::{DocumentId, Source};

/// A query over mapped fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexQuery {
    /// Every document
    MatchAll(MatchAllQuery),
    /// Any analyzed term of the text appears in the field
    Match(BTreeMap<String, String>),
    /// The analyzed terms appear in the field at consecutive positions
    MatchPhrase(BTreeMap<String, String>),
    /// Boolean combination
    Bool(BoolQuery),
}

/// Marker body for `match_all`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchAllQuery {}

/// `must` clauses all match; when there are no `must` clauses, at least
/// one `should` clause matches. No clauses at all matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoolQuery {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<IndexQuery>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<IndexQuery>,
}

impl IndexQuery {
    pub fn match_all() -> Self {
        IndexQuery::MatchAll(MatchAllQuery {})
    }

    pub fn matching(field: &str, text: &str) -> Self {
        IndexQuery::Match(single(field, text))
    }

    pub fn match_phrase(field: &str, text: &str) -> Self {
        IndexQuery::MatchPhrase(single(field, text))
    }

    pub fn should(clauses: Vec<IndexQuery>) -> Self {
        IndexQuery::Bool(BoolQuery {
            must: Vec::new(),
            should: clauses,
        })
    }
}

fn single(field: &str, text: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    map.insert(field.to_string(), text.to_string());
    map
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Sort on a keyword field or `_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortClause {
    pub field: String,
    #[serde(default)]
    pub order: SortOrder,
}

impl SortClause {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            order: SortOrder::Asc,
        }
    }
}

/// A search request body.
///
/// Hits are ordered by `sort`, then by `_id` ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: IndexQuery,
    #[serde(default)]
    pub sort: Vec<SortClause>,
    #[serde(default)]
    pub from: usize,
    #[serde(default = "default_size")]
    pub size: usize,
}

fn default_size() -> usize {
    10
}

impl SearchRequest {
    pub fn new(query: IndexQuery) -> Self {
        Self {
            query,
            sort: Vec::new(),
            from: 0,
            size: default_size(),
        }
    }

    pub fn with_sort(mut self, clause: SortClause) -> Self {
        self.sort.push(clause);
        self
    }

    pub fn with_page(mut self, from: usize, size: usize) -> Self {
        self.from = from;
        self.size = size;
        self
    }
}

/// One matching document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(rename = "_source")]
    pub source: Source,
}

/// Search response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub took: Duration,
    /// Matches before `from`/`size` were applied
    pub total: u64,
    pub hits: Vec<Hit>,
}

impl SearchResponse {
    /// Hit ids in response order.
    pub fn ids(&self) -> Vec<DocumentId> {
        self.hits.iter().map(|hit| hit.id).collect()
    }
}
