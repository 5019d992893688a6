//! Embedded Tantivy implementation of [`IndexGateway`].

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use tantivy::collector::DocSetCollector;
use tantivy::query::{AllQuery, BooleanQuery, EmptyQuery, Occur, PhraseQuery, Query, TermQuery};
use tantivy::schema::IndexRecordOption;
use tantivy::{TantivyDocument, Term};
use tracing::{debug, info, warn};

use crate::analysis::analyze;
use crate::document::{from_tantivy_doc, to_tantivy_doc, DocumentId, Source};
use crate::error::IndexError;
use crate::gateway::{
    Acknowledged, BulkItem, BulkOperation, BulkResponse, IndexGateway, WriteResponse, WriteResult,
};
use crate::index::{validate_index_name, IndexDir, IndexGatewayConfig, OpenIndex};
use crate::mapping::{FieldType, IndexMapping, IndexSettings};
use crate::query::{BoolQuery, Hit, IndexQuery, SearchRequest, SearchResponse, SortClause};
use crate::schema::{MappedField, ID_FIELD};
use crate::sort::sorted_page;

/// Index gateway over Tantivy indexes under one root directory.
///
/// Open indexes are cached; only one gateway per root may be live, since
/// each index allows a single writer.
pub struct TantivyGateway {
    config: IndexGatewayConfig,
    open: RwLock<HashMap<String, Arc<OpenIndex>>>,
}

impl TantivyGateway {
    pub fn new(config: IndexGatewayConfig) -> Self {
        info!(root = ?config.root_path, "Index gateway ready");
        Self {
            config,
            open: RwLock::new(HashMap::new()),
        }
    }

    fn dir(&self, name: &str) -> Result<IndexDir, IndexError> {
        validate_index_name(name)?;
        Ok(IndexDir::new(&self.config.root_path, name))
    }

    /// Open handle for a mapped index.
    fn handle(&self, name: &str) -> Result<Arc<OpenIndex>, IndexError> {
        {
            let open = self
                .open
                .read()
                .map_err(|e| IndexError::IndexLocked(e.to_string()))?;
            if let Some(handle) = open.get(name) {
                return Ok(handle.clone());
            }
        }

        let dir = self.dir(name)?;
        if !dir.exists() {
            return Err(IndexError::IndexNotFound(name.to_string()));
        }
        let mapping = dir
            .read_mapping()?
            .ok_or_else(|| IndexError::MappingNotDefined(name.to_string()))?;

        let mut open = self
            .open
            .write()
            .map_err(|e| IndexError::IndexLocked(e.to_string()))?;
        if let Some(handle) = open.get(name) {
            return Ok(handle.clone());
        }

        let settings = dir.read_settings()?;
        let handle = Arc::new(OpenIndex::open(
            &dir,
            &settings,
            &mapping,
            self.config.writer_memory_mb,
        )?);
        open.insert(name.to_string(), handle.clone());
        Ok(handle)
    }

    fn forget(&self, name: &str) -> Result<(), IndexError> {
        self.open
            .write()
            .map_err(|e| IndexError::IndexLocked(e.to_string()))?
            .remove(name);
        Ok(())
    }
}

impl IndexGateway for TantivyGateway {
    fn index_exists(&self, index: &str) -> Result<bool, IndexError> {
        Ok(self.dir(index)?.exists())
    }

    fn create_index(
        &self,
        index: &str,
        settings: &IndexSettings,
    ) -> Result<Acknowledged, IndexError> {
        let dir = self.dir(index)?;
        if dir.exists() {
            return Err(IndexError::IndexAlreadyExists(index.to_string()));
        }
        settings.analysis.validate()?;

        dir.write_settings(settings)?;
        info!(index, "Created index");
        Ok(Acknowledged::yes(index))
    }

    fn delete_index(&self, index: &str) -> Result<Acknowledged, IndexError> {
        let dir = self.dir(index)?;
        if !dir.exists() {
            return Err(IndexError::IndexNotFound(index.to_string()));
        }

        // Drop the cached writer first so its lock is released
        self.forget(index)?;
        dir.remove()?;
        info!(index, "Deleted index");
        Ok(Acknowledged::yes(index))
    }

    fn put_mapping(
        &self,
        index: &str,
        mapping: &IndexMapping,
    ) -> Result<Acknowledged, IndexError> {
        let dir = self.dir(index)?;
        if !dir.exists() {
            return Err(IndexError::IndexNotFound(index.to_string()));
        }
        let settings = dir.read_settings()?;
        mapping.validate(&settings.analysis)?;

        if let Some(existing) = dir.read_mapping()? {
            if &existing == mapping {
                debug!(index, "Mapping unchanged");
                return Ok(Acknowledged::yes(index));
            }
            return Err(IndexError::InvalidMapping(format!(
                "index {} already has a different mapping",
                index
            )));
        }

        let mut open = self
            .open
            .write()
            .map_err(|e| IndexError::IndexLocked(e.to_string()))?;
        let handle = OpenIndex::create(&dir, &settings, mapping, self.config.writer_memory_mb)?;
        dir.write_mapping(mapping)?;
        open.insert(index.to_string(), Arc::new(handle));

        info!(index, fields = mapping.properties.len(), "Put mapping");
        Ok(Acknowledged::yes(index))
    }

    fn search(&self, index: &str, request: &SearchRequest) -> Result<SearchResponse, IndexError> {
        let start = Instant::now();
        let handle = self.handle(index)?;
        let query = build_query(&handle, &request.query)?;
        validate_sort(&handle, &request.sort)?;

        let searcher = handle.searcher();
        let page = sorted_page(
            &searcher,
            &*query,
            &request.sort,
            request.from,
            request.size,
        )?;

        // Stored documents are read for the returned page only
        let mut hits = Vec::with_capacity(page.addresses.len());
        for address in page.addresses {
            let doc: TantivyDocument = searcher.doc(address)?;
            let (id, source) = from_tantivy_doc(handle.schema(), &doc)?;
            hits.push(Hit { id, source });
        }
        let total = page.total;

        debug!(index, total, returned = hits.len(), "Index search");
        Ok(SearchResponse {
            took: start.elapsed(),
            total,
            hits,
        })
    }

    fn index_document(
        &self,
        index: &str,
        id: DocumentId,
        source: &Source,
    ) -> Result<WriteResponse, IndexError> {
        let handle = self.handle(index)?;
        let doc = to_tantivy_doc(handle.schema(), id, source)?;

        let mut writer = handle.lock_writer()?;
        let existed = handle.contains(id)?;
        writer.delete_term(handle.id_term(id));
        writer.add_document(doc)?;
        handle.commit(&mut writer)?;

        let result = if existed {
            WriteResult::Updated
        } else {
            WriteResult::Created
        };
        debug!(index, id, %result, "Indexed document");
        Ok(WriteResponse {
            index: index.to_string(),
            id,
            result,
        })
    }

    fn delete_document(&self, index: &str, id: DocumentId) -> Result<WriteResponse, IndexError> {
        let handle = self.handle(index)?;

        let mut writer = handle.lock_writer()?;
        let result = if handle.contains(id)? {
            writer.delete_term(handle.id_term(id));
            handle.commit(&mut writer)?;
            WriteResult::Deleted
        } else {
            WriteResult::NotFound
        };

        debug!(index, id, %result, "Deleted document");
        Ok(WriteResponse {
            index: index.to_string(),
            id,
            result,
        })
    }

    fn bulk(
        &self,
        index: &str,
        operations: Vec<BulkOperation>,
    ) -> Result<BulkResponse, IndexError> {
        let start = Instant::now();
        let handle = self.handle(index)?;

        let mut writer = handle.lock_writer()?;
        // Existence as of earlier operations in this request
        let mut pending: HashMap<DocumentId, bool> = HashMap::new();
        let mut items = Vec::with_capacity(operations.len());
        let mut changed = false;

        for operation in operations {
            let id = operation.id();
            let existed = match pending.get(&id) {
                Some(exists) => *exists,
                None => handle.contains(id)?,
            };

            let item = match operation {
                BulkOperation::Index { source, .. } => {
                    match to_tantivy_doc(handle.schema(), id, &source) {
                        Ok(doc) => {
                            writer.delete_term(handle.id_term(id));
                            writer.add_document(doc)?;
                            pending.insert(id, true);
                            changed = true;
                            let result = if existed {
                                WriteResult::Updated
                            } else {
                                WriteResult::Created
                            };
                            BulkItem::ok(id, result)
                        }
                        Err(e) => BulkItem::failed(id, e.to_string()),
                    }
                }
                BulkOperation::Delete { .. } if existed => {
                    writer.delete_term(handle.id_term(id));
                    pending.insert(id, false);
                    changed = true;
                    BulkItem::ok(id, WriteResult::Deleted)
                }
                BulkOperation::Delete { .. } => BulkItem::ok(id, WriteResult::NotFound),
            };
            items.push(item);
        }

        if changed {
            handle.commit(&mut writer)?;
        }

        let errors = items.iter().any(BulkItem::is_error);
        if errors {
            warn!(index, "Bulk request had failed items");
        }
        debug!(index, items = items.len(), "Bulk request applied");

        Ok(BulkResponse {
            took: start.elapsed(),
            errors,
            items,
        })
    }

    fn get_document(&self, index: &str, id: DocumentId) -> Result<Option<Source>, IndexError> {
        let handle = self.handle(index)?;
        let searcher = handle.searcher();
        let query = TermQuery::new(handle.id_term(id), IndexRecordOption::Basic);

        let Some(address) = searcher.search(&query, &DocSetCollector)?.into_iter().next() else {
            return Ok(None);
        };
        let doc: TantivyDocument = searcher.doc(address)?;
        let (_, source) = from_tantivy_doc(handle.schema(), &doc)?;
        Ok(Some(source))
    }

    fn count(&self, index: &str) -> Result<u64, IndexError> {
        Ok(self.handle(index)?.searcher().num_docs())
    }
}

fn resolve_field<'a>(handle: &'a OpenIndex, path: &str) -> Result<&'a MappedField, IndexError> {
    handle
        .schema()
        .field(path)
        .ok_or_else(|| IndexError::InvalidQuery(format!("field {} is not mapped", path)))
}

/// The single `field: text` pair of a match clause.
fn single_clause<'q>(
    kind: &str,
    clause: &'q BTreeMap<String, String>,
) -> Result<(&'q str, &'q str), IndexError> {
    let mut entries = clause.iter();
    match (entries.next(), entries.next()) {
        (Some((field, text)), None) => Ok((field.as_str(), text.as_str())),
        _ => Err(IndexError::InvalidQuery(format!(
            "{} takes exactly one field",
            kind
        ))),
    }
}

/// Analyze `text` with the analyzer of the mapped field.
fn field_tokens(
    handle: &OpenIndex,
    mapped: &MappedField,
    text: &str,
) -> Result<Vec<(usize, String)>, IndexError> {
    let mut analyzer = handle.index().tokenizer_for_field(mapped.field)?;
    Ok(analyze(&mut analyzer, text))
}

fn term_query(term: Term) -> Box<dyn Query> {
    Box::new(TermQuery::new(term, IndexRecordOption::Basic))
}

fn build_query(handle: &OpenIndex, query: &IndexQuery) -> Result<Box<dyn Query>, IndexError> {
    match query {
        IndexQuery::MatchAll(_) => Ok(Box::new(AllQuery)),

        IndexQuery::Match(clause) => {
            let (path, text) = single_clause("match", clause)?;
            let mapped = resolve_field(handle, path)?;
            let mut tokens: Vec<String> = field_tokens(handle, mapped, text)?
                .into_iter()
                .map(|(_, token)| token)
                .collect();
            tokens.sort();
            tokens.dedup();
            let mut terms: Vec<Term> = tokens
                .iter()
                .map(|token| Term::from_field_text(mapped.field, token))
                .collect();

            Ok(match terms.len() {
                0 => Box::new(EmptyQuery),
                1 => term_query(terms.remove(0)),
                _ => Box::new(BooleanQuery::new(
                    terms
                        .into_iter()
                        .map(|term| (Occur::Should, term_query(term)))
                        .collect(),
                )),
            })
        }

        IndexQuery::MatchPhrase(clause) => {
            let (path, text) = single_clause("match_phrase", clause)?;
            let mapped = resolve_field(handle, path)?;
            let mut terms: Vec<(usize, Term)> = field_tokens(handle, mapped, text)?
                .into_iter()
                .map(|(position, token)| (position, Term::from_field_text(mapped.field, &token)))
                .collect();

            Ok(match terms.len() {
                0 => Box::new(EmptyQuery),
                1 => term_query(terms.remove(0).1),
                _ if !mapped.positions => {
                    return Err(IndexError::InvalidQuery(format!(
                        "field {} has no positions for phrase queries",
                        path
                    )))
                }
                _ => Box::new(PhraseQuery::new_with_offset(terms)),
            })
        }

        IndexQuery::Bool(BoolQuery { must, should }) => {
            if must.is_empty() && should.is_empty() {
                return Ok(Box::new(AllQuery));
            }
            let mut clauses = Vec::with_capacity(must.len() + should.len());
            for sub in must {
                clauses.push((Occur::Must, build_query(handle, sub)?));
            }
            for sub in should {
                clauses.push((Occur::Should, build_query(handle, sub)?));
            }
            Ok(Box::new(BooleanQuery::new(clauses)))
        }
    }
}

/// Sort fields must be `_id` or a stored keyword property.
fn validate_sort(handle: &OpenIndex, sort: &[SortClause]) -> Result<(), IndexError> {
    for clause in sort {
        if clause.field == ID_FIELD {
            continue;
        }
        let mapped = resolve_field(handle, &clause.field)?;
        if mapped.field_type != FieldType::Keyword || !mapped.stored {
            return Err(IndexError::InvalidQuery(format!(
                "cannot sort on {}: only keyword fields are sortable",
                clause.field
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::book_source;
    use crate::mapping::{book_index_settings, book_mapping};
    use bookshelf_types::Book;
    use serde_json::json;
    use tempfile::TempDir;

    const INDEX: &str = "book";

    fn create_gateway() -> (TantivyGateway, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let gateway = TantivyGateway::new(IndexGatewayConfig::new(temp_dir.path()));
        gateway.create_index(INDEX, &book_index_settings()).unwrap();
        gateway.put_mapping(INDEX, &book_mapping()).unwrap();
        (gateway, temp_dir)
    }

    fn put(gateway: &TantivyGateway, id: u64, title: &str, contents: &str) -> WriteResult {
        gateway
            .index_document(INDEX, id, &book_source(&Book::new(id, title, contents)))
            .unwrap()
            .result
    }

    fn search_ids(gateway: &TantivyGateway, query: IndexQuery) -> (u64, Vec<u64>) {
        let request = SearchRequest::new(query)
            .with_sort(SortClause::asc("title"))
            .with_page(0, 100);
        let response = gateway.search(INDEX, &request).unwrap();
        (response.total, response.ids())
    }

    #[test]
    fn test_index_lifecycle() {
        let temp_dir = TempDir::new().unwrap();
        let gateway = TantivyGateway::new(IndexGatewayConfig::new(temp_dir.path()));

        assert!(!gateway.index_exists(INDEX).unwrap());
        assert!(gateway
            .create_index(INDEX, &book_index_settings())
            .unwrap()
            .acknowledged);
        assert!(gateway.index_exists(INDEX).unwrap());
        assert!(matches!(
            gateway.create_index(INDEX, &book_index_settings()),
            Err(IndexError::IndexAlreadyExists(_))
        ));

        assert!(gateway.put_mapping(INDEX, &book_mapping()).unwrap().acknowledged);
        // Same mapping again is a no-op
        assert!(gateway.put_mapping(INDEX, &book_mapping()).unwrap().acknowledged);

        assert!(gateway.delete_index(INDEX).unwrap().acknowledged);
        assert!(!gateway.index_exists(INDEX).unwrap());
        assert!(matches!(
            gateway.delete_index(INDEX),
            Err(IndexError::IndexNotFound(_))
        ));
    }

    #[test]
    fn test_recreate_after_delete() {
        let (gateway, _temp) = create_gateway();
        put(&gateway, 1, "A", "a");

        gateway.delete_index(INDEX).unwrap();
        gateway.create_index(INDEX, &book_index_settings()).unwrap();
        gateway.put_mapping(INDEX, &book_mapping()).unwrap();

        assert_eq!(gateway.count(INDEX).unwrap(), 0);
    }

    #[test]
    fn test_write_before_mapping_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let gateway = TantivyGateway::new(IndexGatewayConfig::new(temp_dir.path()));
        gateway.create_index(INDEX, &book_index_settings()).unwrap();

        let result = gateway.index_document(INDEX, 1, &book_source(&Book::new(1, "T", "C")));
        assert!(matches!(result, Err(IndexError::MappingNotDefined(_))));
    }

    #[test]
    fn test_missing_index() {
        let temp_dir = TempDir::new().unwrap();
        let gateway = TantivyGateway::new(IndexGatewayConfig::new(temp_dir.path()));
        assert!(matches!(
            gateway.count("nope"),
            Err(IndexError::IndexNotFound(_))
        ));
        assert!(matches!(
            gateway.put_mapping("nope", &book_mapping()),
            Err(IndexError::IndexNotFound(_))
        ));
    }

    #[test]
    fn test_conflicting_mapping_rejected() {
        let (gateway, _temp) = create_gateway();
        let mut mapping = book_mapping();
        mapping.properties.remove("contents");
        assert!(matches!(
            gateway.put_mapping(INDEX, &mapping),
            Err(IndexError::InvalidMapping(_))
        ));
    }

    #[test]
    fn test_index_document_created_then_updated() {
        let (gateway, _temp) = create_gateway();

        assert_eq!(put(&gateway, 1, "ALPHA", "first"), WriteResult::Created);
        assert_eq!(put(&gateway, 1, "ALPHA", "second"), WriteResult::Updated);

        assert_eq!(gateway.count(INDEX).unwrap(), 1);
        let source = gateway.get_document(INDEX, 1).unwrap().unwrap();
        assert_eq!(source["contents"], json!("second"));
    }

    #[test]
    fn test_delete_document() {
        let (gateway, _temp) = create_gateway();
        put(&gateway, 1, "ALPHA", "x");

        let response = gateway.delete_document(INDEX, 1).unwrap();
        assert_eq!(response.result, WriteResult::Deleted);
        assert!(gateway.get_document(INDEX, 1).unwrap().is_none());

        let response = gateway.delete_document(INDEX, 1).unwrap();
        assert_eq!(response.result, WriteResult::NotFound);
    }

    #[test]
    fn test_match_all_sorted_by_title_then_id() {
        let (gateway, _temp) = create_gateway();
        put(&gateway, 1, "C", "");
        put(&gateway, 2, "A", "");
        put(&gateway, 3, "B", "");
        put(&gateway, 4, "A", "");

        let (total, ids) = search_ids(&gateway, IndexQuery::match_all());
        assert_eq!(total, 4);
        assert_eq!(ids, vec![2, 4, 3, 1]);
    }

    #[test]
    fn test_pagination_keeps_total() {
        let (gateway, _temp) = create_gateway();
        for id in 1..=25 {
            put(&gateway, id, &format!("T{:02}", id), "");
        }

        let request = SearchRequest::new(IndexQuery::match_all())
            .with_sort(SortClause::asc("title"))
            .with_page(20, 20);
        let response = gateway.search(INDEX, &request).unwrap();
        assert_eq!(response.total, 25);
        assert_eq!(response.ids(), vec![21, 22, 23, 24, 25]);

        let beyond = gateway
            .search(INDEX, &request.clone().with_page(40, 20))
            .unwrap();
        assert_eq!(beyond.total, 25);
        assert!(beyond.hits.is_empty());
    }

    #[test]
    fn test_pages_split_title_ties_by_id() {
        let (gateway, _temp) = create_gateway();
        for id in (1..=30).rev() {
            put(&gateway, id, if id % 2 == 0 { "even" } else { "odd" }, "");
        }

        let request = SearchRequest::new(IndexQuery::match_all())
            .with_sort(SortClause::asc("title"))
            .with_page(0, 10);
        let mut ids = Vec::new();
        for from in [0, 10, 20] {
            let response = gateway
                .search(INDEX, &request.clone().with_page(from, 10))
                .unwrap();
            assert_eq!(response.total, 30);
            assert_eq!(response.hits.len(), 10);
            ids.extend(response.ids());
        }

        let evens: Vec<u64> = (1..=15).map(|n| n * 2).collect();
        let odds: Vec<u64> = (0..15).map(|n| n * 2 + 1).collect();
        assert_eq!(ids, [evens, odds].concat());
    }

    #[test]
    fn test_page_across_segments() {
        let (gateway, _temp) = create_gateway();
        // Each single-document write commits, leaving several segments
        put(&gateway, 1, "C", "");
        put(&gateway, 2, "A", "");
        put(&gateway, 3, "B", "");

        let request = SearchRequest::new(IndexQuery::match_all())
            .with_sort(SortClause::asc("title"))
            .with_page(1, 1);
        let response = gateway.search(INDEX, &request).unwrap();
        assert_eq!(response.total, 3);
        assert_eq!(response.ids(), vec![3]);
        assert_eq!(response.hits[0].source["title"], "B");
    }

    #[test]
    fn test_zero_size_page_counts_only() {
        let (gateway, _temp) = create_gateway();
        put(&gateway, 1, "A", "");
        put(&gateway, 2, "B", "");

        let request = SearchRequest::new(IndexQuery::match_all()).with_page(0, 0);
        let response = gateway.search(INDEX, &request).unwrap();
        assert_eq!(response.total, 2);
        assert!(response.hits.is_empty());
    }

    #[test]
    fn test_match_phrase_on_bigrams_is_substring() {
        let (gateway, _temp) = create_gateway();
        put(&gateway, 1, "x", "abc");
        put(&gateway, 2, "y", "acb");
        put(&gateway, 3, "z", "zzabzz");

        let (_, ids) = search_ids(&gateway, IndexQuery::match_phrase("contents.bigram", "ab"));
        assert_eq!(ids, vec![1, 3]);

        let (_, ids) = search_ids(&gateway, IndexQuery::match_phrase("contents.bigram", "abc"));
        assert_eq!(ids, vec![1]);

        let (_, ids) = search_ids(&gateway, IndexQuery::match_phrase("contents.bigram", "cab"));
        assert!(ids.is_empty());
    }

    #[test]
    fn test_match_on_unigrams() {
        let (gateway, _temp) = create_gateway();
        put(&gateway, 1, "cat", "");
        put(&gateway, 2, "dog", "");
        put(&gateway, 3, "other", "has a");

        let query = IndexQuery::should(vec![
            IndexQuery::matching("title.unigram", "a"),
            IndexQuery::matching("contents.unigram", "a"),
        ]);
        let (total, ids) = search_ids(&gateway, query);
        assert_eq!(total, 2);
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_analysis_folds_width_and_case() {
        let (gateway, _temp) = create_gateway();
        put(&gateway, 1, "ＡＢＣ", "");

        let (_, ids) = search_ids(&gateway, IndexQuery::match_phrase("title.bigram", "abc"));
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_keyword_sort_is_binary() {
        let (gateway, _temp) = create_gateway();
        put(&gateway, 1, "b", "");
        put(&gateway, 2, "B", "");
        put(&gateway, 3, "a", "");

        let (_, ids) = search_ids(&gateway, IndexQuery::match_all());
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let (gateway, _temp) = create_gateway();
        let request = SearchRequest::new(IndexQuery::matching("author", "x"));
        assert!(matches!(
            gateway.search(INDEX, &request),
            Err(IndexError::InvalidQuery(_))
        ));

        let request =
            SearchRequest::new(IndexQuery::match_all()).with_sort(SortClause::asc("contents"));
        assert!(matches!(
            gateway.search(INDEX, &request),
            Err(IndexError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_bulk_reports_per_item() {
        let (gateway, _temp) = create_gateway();
        put(&gateway, 1, "existing", "");

        let bad = json!({"title": 5}).as_object().unwrap().clone();
        let response = gateway
            .bulk(
                INDEX,
                vec![
                    BulkOperation::Index {
                        id: 1,
                        source: book_source(&Book::new(1, "existing", "v2")),
                    },
                    BulkOperation::Index {
                        id: 2,
                        source: book_source(&Book::new(2, "new", "")),
                    },
                    BulkOperation::Index { id: 3, source: bad },
                    BulkOperation::Delete { id: 2 },
                    BulkOperation::Delete { id: 9 },
                ],
            )
            .unwrap();

        assert!(response.errors);
        let results: Vec<Option<WriteResult>> =
            response.items.iter().map(|item| item.result).collect();
        assert_eq!(
            results,
            vec![
                Some(WriteResult::Updated),
                Some(WriteResult::Created),
                None,
                Some(WriteResult::Deleted),
                Some(WriteResult::NotFound),
            ]
        );
        assert_eq!(response.failed_items().count(), 1);
        assert_eq!(gateway.count(INDEX).unwrap(), 1);
    }

    #[test]
    fn test_reopen_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        {
            let gateway = TantivyGateway::new(IndexGatewayConfig::new(temp_dir.path()));
            gateway.create_index(INDEX, &book_index_settings()).unwrap();
            gateway.put_mapping(INDEX, &book_mapping()).unwrap();
            put(&gateway, 1, "ＡＢ", "persisted");
        }

        let gateway = TantivyGateway::new(IndexGatewayConfig::new(temp_dir.path()));
        assert_eq!(gateway.count(INDEX).unwrap(), 1);
        // Analyzers are registered again on open
        let (_, ids) = search_ids(&gateway, IndexQuery::match_phrase("title.bigram", "ab"));
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_invalid_index_name() {
        let temp_dir = TempDir::new().unwrap();
        let gateway = TantivyGateway::new(IndexGatewayConfig::new(temp_dir.path()));
        assert!(matches!(
            gateway.create_index("../x", &book_index_settings()),
            Err(IndexError::InvalidIndexName(_))
        ));
    }
}
