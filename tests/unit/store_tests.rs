/*!
 * Tests for the annotation store reader against a miniature device
 * database fixture.
 */

use rusqlite::Connection;

use inkport::errors::ExportError;
use inkport::store::{read, AnnotationKind, BookFormat, StoreReader};

use crate::common::{
    create_store, insert_annotation, insert_book, insert_chapter, write_markup_files, EPUB_MIME,
    KEPUB_MIME,
};

#[test]
fn test_read_withMissingDatabase_shouldReturnIoUnavailable() {
    let result = read("/definitely/not/here/KoboReader.sqlite");
    assert!(matches!(result, Err(ExportError::IoUnavailable(_))));
}

#[test]
fn test_read_withAnnotatedBook_shouldReturnBookAndRows() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = create_store(dir.path());
    let conn = Connection::open(&db_path).expect("Failed to open fixture");

    insert_book(&conn, "b1", Some("Dune"), Some("Frank Herbert"), EPUB_MIME);
    insert_chapter(&conn, "b1", "c1", Some("Chapter 1"), 0);
    insert_annotation(
        &conn,
        "a1",
        "c1",
        Some("Fear is the mind-killer"),
        None,
        "2024-01-15T10:30:00.000",
        "highlight",
        Some(0),
    );
    drop(conn);

    let extracts = read(&db_path).expect("Read pass failed");

    assert_eq!(extracts.len(), 1);
    let extract = &extracts[0];
    assert_eq!(extract.book.title, "Dune");
    assert_eq!(extract.book.author, "Frank Herbert");
    assert_eq!(extract.book.format, BookFormat::Epub);
    assert!(!extract.book.supports_markup);
    assert_eq!(extract.chapters.len(), 1);
    assert_eq!(extract.annotations.len(), 1);
    assert_eq!(extract.skipped_records, 0);

    let annotation = &extract.annotations[0];
    assert_eq!(annotation.classify(), Some(AnnotationKind::Highlight));
    assert_eq!(annotation.text.as_deref(), Some("Fear is the mind-killer"));
    assert_eq!(annotation.color_index, Some(0));
}

#[test]
fn test_readBooks_withMissingTitleAndAuthor_shouldFallBack() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = create_store(dir.path());
    let conn = Connection::open(&db_path).expect("Failed to open fixture");

    insert_book(&conn, "b1", None, None, EPUB_MIME);
    insert_chapter(&conn, "b1", "c1", Some("Ch"), 0);
    insert_annotation(&conn, "a1", "c1", Some("t"), None, "2024-01-15T10:00:00", "highlight", Some(0));
    drop(conn);

    let extracts = read(&db_path).expect("Read pass failed");

    assert_eq!(extracts[0].book.title, "Unknown Title");
    assert_eq!(extracts[0].book.author, "Unknown Author");
}

#[test]
fn test_readChapters_shouldOrderByVolumeIndex() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = create_store(dir.path());
    let conn = Connection::open(&db_path).expect("Failed to open fixture");

    insert_book(&conn, "b1", Some("B"), Some("A"), EPUB_MIME);
    insert_chapter(&conn, "b1", "c2", Some("Second"), 2);
    insert_chapter(&conn, "b1", "c1", Some("First"), 1);
    insert_annotation(&conn, "a1", "c1", Some("t"), None, "2024-01-15T10:00:00", "highlight", Some(0));
    drop(conn);

    let reader = StoreReader::open(&db_path).expect("Failed to open reader");
    let chapters = reader.read_chapters("b1").expect("Failed to read chapters");

    let ids: Vec<&str> = chapters.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2"]);
}

#[test]
fn test_readAnnotations_withBadTimestamp_shouldSkipAndCount() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = create_store(dir.path());
    let conn = Connection::open(&db_path).expect("Failed to open fixture");

    insert_book(&conn, "b1", Some("B"), Some("A"), EPUB_MIME);
    insert_chapter(&conn, "b1", "c1", Some("Ch"), 0);
    insert_annotation(&conn, "bad", "c1", Some("t"), None, "garbage", "highlight", Some(0));
    insert_annotation(&conn, "good", "c1", Some("t"), None, "2024-01-15T10:00:00", "highlight", Some(0));
    drop(conn);

    let extracts = read(&db_path).expect("Read pass failed");

    assert_eq!(extracts[0].annotations.len(), 1);
    assert_eq!(extracts[0].annotations[0].id, "good");
    assert_eq!(extracts[0].skipped_records, 1);
}

#[test]
fn test_readAnnotations_shouldPreserveStoreOrder() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = create_store(dir.path());
    let conn = Connection::open(&db_path).expect("Failed to open fixture");

    insert_book(&conn, "b1", Some("B"), Some("A"), EPUB_MIME);
    insert_chapter(&conn, "b1", "c1", Some("Ch"), 0);
    // Same timestamp: store order is the deterministic secondary key.
    for id in ["a1", "a2", "a3"] {
        insert_annotation(&conn, id, "c1", Some(id), None, "2024-01-15T10:00:00", "highlight", Some(0));
    }
    drop(conn);

    let extracts = read(&db_path).expect("Read pass failed");

    let ids: Vec<&str> = extracts[0].annotations.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["a1", "a2", "a3"]);
}

#[test]
fn test_readAnnotations_markupOnCapableBook_shouldLoadPayload() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = create_store(dir.path());
    let conn = Connection::open(&db_path).expect("Failed to open fixture");

    insert_book(&conn, "b1", Some("B"), Some("A"), KEPUB_MIME);
    insert_chapter(&conn, "b1", "c1", Some("Ch"), 0);
    insert_annotation(&conn, "m1", "c1", None, Some("caption"), "2024-01-15T10:00:00", "markup", None);
    drop(conn);
    write_markup_files(dir.path(), "m1");

    let extracts = read(&db_path).expect("Read pass failed");

    assert!(extracts[0].book.supports_markup);
    let annotation = &extracts[0].annotations[0];
    let payload = annotation.markup.as_ref().expect("Expected markup payload");
    assert!(!payload.raster.is_empty());
    assert!(payload.svg.is_some());
}

#[test]
fn test_readAnnotations_markupWithMissingPayload_shouldSkipAndCount() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = create_store(dir.path());
    let conn = Connection::open(&db_path).expect("Failed to open fixture");

    insert_book(&conn, "b1", Some("B"), Some("A"), KEPUB_MIME);
    insert_chapter(&conn, "b1", "c1", Some("Ch"), 0);
    insert_annotation(&conn, "m1", "c1", None, None, "2024-01-15T10:00:00", "markup", None);
    insert_annotation(&conn, "a1", "c1", Some("t"), None, "2024-01-15T11:00:00", "highlight", Some(0));
    drop(conn);
    // No markup files on disk for m1.

    let extracts = read(&db_path).expect("Read pass failed");

    assert_eq!(extracts[0].annotations.len(), 1);
    assert_eq!(extracts[0].annotations[0].id, "a1");
    assert_eq!(extracts[0].skipped_records, 1);
}

#[test]
fn test_readAnnotations_markupOnNonCapableBook_shouldNotLoadPayload() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = create_store(dir.path());
    let conn = Connection::open(&db_path).expect("Failed to open fixture");

    insert_book(&conn, "b1", Some("B"), Some("A"), EPUB_MIME);
    insert_chapter(&conn, "b1", "c1", Some("Ch"), 0);
    insert_annotation(&conn, "m1", "c1", None, None, "2024-01-15T10:00:00", "markup", None);
    drop(conn);
    // Payload files exist, but the format is not markup-capable.
    write_markup_files(dir.path(), "m1");

    let extracts = read(&db_path).expect("Read pass failed");

    assert_eq!(extracts[0].annotations.len(), 1);
    assert!(extracts[0].annotations[0].markup.is_none());
}

#[test]
fn test_read_withTwoBooks_shouldReturnBoth() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = create_store(dir.path());
    let conn = Connection::open(&db_path).expect("Failed to open fixture");

    insert_book(&conn, "b1", Some("Alpha"), Some("A"), EPUB_MIME);
    insert_chapter(&conn, "b1", "b1c1", Some("Ch"), 0);
    insert_annotation(&conn, "a1", "b1c1", Some("t"), None, "2024-01-15T10:00:00", "highlight", Some(0));

    insert_book(&conn, "b2", Some("Beta"), Some("B"), KEPUB_MIME);
    insert_chapter(&conn, "b2", "b2c1", Some("Ch"), 0);
    insert_annotation(&conn, "a2", "b2c1", Some("t"), None, "2024-01-15T10:00:00", "highlight", Some(0));
    drop(conn);

    let extracts = read(&db_path).expect("Read pass failed");

    let titles: Vec<&str> = extracts.iter().map(|e| e.book.title.as_str()).collect();
    assert_eq!(titles, vec!["Alpha", "Beta"]);
}
