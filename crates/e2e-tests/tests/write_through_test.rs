//! Write-through Add/Delete E2E tests.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use bookshelf_index::{book_source, IndexGateway, WriteResult};
use bookshelf_indexing::{
    AddBookCommand, AddOutcome, DeleteBookCommand, DeleteOutcome, FaultyGateway, IndexingError,
};
use bookshelf_storage::{RecordStore, RecordTransaction, Storage};
use bookshelf_types::{Book, NewBook, SearchBackend};
use e2e_tests::{titles, TestHarness, BACKENDS, INDEX};

#[test]
fn test_add_then_search_round_trip() {
    let harness = TestHarness::new();
    let book = harness.add("ALPHA", "test contents");

    for backend in BACKENDS {
        let result = harness.search(backend, Some("ALPHA"), 1);
        assert_eq!(
            result.ordered_records,
            vec![Book::new(book.id, "ALPHA", "test contents")],
            "backend {}",
            backend
        );

        let result = harness.search(backend, Some("test"), 1);
        assert_eq!(titles(&result), vec!["ALPHA"], "backend {}", backend);
    }
}

#[test]
fn test_delete_then_search_round_trip() {
    let harness = TestHarness::new();
    let book = harness.add("ALPHA", "test contents");
    harness.add("beta", "stays");

    assert_eq!(harness.delete(book.id), DeleteOutcome::Deleted(book.id));

    for backend in BACKENDS {
        let result = harness.search(backend, Some("ALPHA"), 1);
        assert_eq!(result.total_count, 0, "backend {}", backend);
        assert_eq!(harness.search(backend, None, 1).total_count, 1);
    }
    assert!(harness.gateway.get_document(INDEX, book.id).unwrap().is_none());
}

#[test]
fn test_delete_unknown_id_is_a_no_op() {
    let harness = TestHarness::new();
    harness.add("ALPHA", "test contents");

    assert_eq!(harness.delete(9_999), DeleteOutcome::NotFound(9_999));
    assert_eq!(harness.record_count(), 1);
    assert_eq!(harness.gateway.count(INDEX).unwrap(), 1);
}

#[test]
fn test_unacknowledged_add_leaves_no_record() {
    let harness = TestHarness::new();
    let faulty = Arc::new(
        FaultyGateway::new(harness.gateway.clone()).answer_writes(WriteResult::Noop),
    );
    let command = AddBookCommand::new(harness.storage.clone(), faulty, INDEX);

    let err = command
        .execute(NewBook::new("ALPHA", "test contents"))
        .unwrap_err();
    assert!(matches!(err, IndexingError::Acknowledgement { .. }));
    assert!(err.to_string().contains("noop"));

    assert_eq!(harness.record_count(), 0);
    let result = harness.search(SearchBackend::Relational, Some("ALPHA"), 1);
    assert_eq!(result.total_count, 0);
}

#[test]
fn test_unacknowledged_delete_keeps_record() {
    let harness = TestHarness::new();
    let book = harness.add("ALPHA", "test contents");
    let faulty = Arc::new(
        FaultyGateway::new(harness.gateway.clone()).answer_writes(WriteResult::NotFound),
    );
    let command = DeleteBookCommand::new(harness.storage.clone(), faulty, INDEX);

    let err = command.execute(book.id).unwrap_err();
    assert!(matches!(err, IndexingError::Acknowledgement { .. }));

    let result = harness.search(SearchBackend::Relational, Some("ALPHA"), 1);
    assert_eq!(titles(&result), vec!["ALPHA"]);
}

#[test]
fn test_deleted_id_is_not_reused() {
    let harness = TestHarness::new();
    let first = harness.add("one", "");
    harness.delete(first.id);
    let second = harness.add("two", "");
    assert!(second.id > first.id);
}

#[test]
fn test_add_after_restart_skips_id_of_abandoned_insert() {
    let harness = TestHarness::new();
    let db_path = harness._temp_dir.path().join("restart-db");

    // A process that indexed a document and died before committing
    let abandoned = {
        let storage = Storage::open(&db_path).unwrap();
        let mut txn = storage.begin().unwrap();
        let id = txn.insert(&NewBook::new("orphan", "")).unwrap();
        let orphan = Book::new(id, "orphan", "");
        harness
            .gateway
            .index_document(INDEX, id, &book_source(&orphan))
            .unwrap();
        id
    };

    let storage = Arc::new(Storage::open(&db_path).unwrap());
    let command = AddBookCommand::new(storage.clone(), harness.gateway.clone(), INDEX);
    let AddOutcome::Created(book) = command.execute(NewBook::new("fresh", "")).unwrap();

    assert!(book.id > abandoned);
    assert!(storage.get_book(book.id).unwrap().is_some());
}
