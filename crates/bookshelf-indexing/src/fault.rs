//! Gateway wrapper that injects index failures, for tests here and in
//! downstream crates (`test-util` feature).

use std::sync::atomic::{AtomicUsize, Ordering};

use bookshelf_index::{
    Acknowledged, BulkItem, BulkOperation, BulkResponse, DocumentId, IndexError, IndexGateway,
    IndexMapping, IndexSettings, SearchRequest, SearchResponse, Source, WriteResponse, WriteResult,
};

/// Wraps a gateway and misreports selected outcomes.
pub struct FaultyGateway<G> {
    inner: G,
    refuse_create: bool,
    refuse_delete: bool,
    refuse_mapping: bool,
    write_result: Option<WriteResult>,
    failing_ids: Vec<DocumentId>,
    bulk_calls: AtomicUsize,
    write_calls: AtomicUsize,
}

impl<G: IndexGateway> FaultyGateway<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            refuse_create: false,
            refuse_delete: false,
            refuse_mapping: false,
            write_result: None,
            failing_ids: Vec::new(),
            bulk_calls: AtomicUsize::new(0),
            write_calls: AtomicUsize::new(0),
        }
    }

    /// Answer `create_index` with `acknowledged: false` without creating.
    pub fn refuse_create(mut self) -> Self {
        self.refuse_create = true;
        self
    }

    /// Answer `delete_index` with `acknowledged: false` without deleting.
    pub fn refuse_delete(mut self) -> Self {
        self.refuse_delete = true;
        self
    }

    /// Answer `put_mapping` with `acknowledged: false` without mapping.
    pub fn refuse_mapping(mut self) -> Self {
        self.refuse_mapping = true;
        self
    }

    /// Perform single-document writes but report `result` for them.
    pub fn answer_writes(mut self, result: WriteResult) -> Self {
        self.write_result = Some(result);
        self
    }

    /// Reject the bulk operation for `id`.
    pub fn fail_bulk_id(mut self, id: DocumentId) -> Self {
        self.failing_ids.push(id);
        self
    }

    pub fn bulk_calls(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    fn rewrite(&self, mut response: WriteResponse) -> WriteResponse {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(result) = self.write_result {
            response.result = result;
        }
        response
    }
}

fn refused(index: &str) -> Acknowledged {
    Acknowledged {
        acknowledged: false,
        index: index.to_string(),
    }
}

impl<G: IndexGateway> IndexGateway for FaultyGateway<G> {
    fn index_exists(&self, index: &str) -> Result<bool, IndexError> {
        self.inner.index_exists(index)
    }

    fn create_index(
        &self,
        index: &str,
        settings: &IndexSettings,
    ) -> Result<Acknowledged, IndexError> {
        if self.refuse_create {
            return Ok(refused(index));
        }
        self.inner.create_index(index, settings)
    }

    fn delete_index(&self, index: &str) -> Result<Acknowledged, IndexError> {
        if self.refuse_delete {
            return Ok(refused(index));
        }
        self.inner.delete_index(index)
    }

    fn put_mapping(
        &self,
        index: &str,
        mapping: &IndexMapping,
    ) -> Result<Acknowledged, IndexError> {
        if self.refuse_mapping {
            return Ok(refused(index));
        }
        self.inner.put_mapping(index, mapping)
    }

    fn search(&self, index: &str, request: &SearchRequest) -> Result<SearchResponse, IndexError> {
        self.inner.search(index, request)
    }

    fn index_document(
        &self,
        index: &str,
        id: DocumentId,
        source: &Source,
    ) -> Result<WriteResponse, IndexError> {
        let response = self.inner.index_document(index, id, source)?;
        Ok(self.rewrite(response))
    }

    fn delete_document(&self, index: &str, id: DocumentId) -> Result<WriteResponse, IndexError> {
        let response = self.inner.delete_document(index, id)?;
        Ok(self.rewrite(response))
    }

    fn bulk(
        &self,
        index: &str,
        operations: Vec<BulkOperation>,
    ) -> Result<BulkResponse, IndexError> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        let (rejected, accepted): (Vec<_>, Vec<_>) = operations
            .into_iter()
            .partition(|op| self.failing_ids.contains(&op.id()));

        let mut response = self.inner.bulk(index, accepted)?;
        for op in rejected {
            response
                .items
                .push(BulkItem::failed(op.id(), "injected failure"));
            response.errors = true;
        }
        Ok(response)
    }

    fn get_document(&self, index: &str, id: DocumentId) -> Result<Option<Source>, IndexError> {
        self.inner.get_document(index, id)
    }

    fn count(&self, index: &str) -> Result<u64, IndexError> {
        self.inner.count(index)
    }
}
