/*!
 * Reader layer over the device annotation store.
 *
 * Provides a high-level API for one read pass: all books with annotations,
 * and per book the chapter table and the annotation rows in store order.
 * Markup payloads are loaded from the `markups/` directory next to the
 * database; rows whose payload is absent or unreadable are skipped with a
 * logged warning and counted, never failing the book.
 */

use log::{debug, warn};
use rusqlite::params;
use std::path::Path;

use super::connection::StoreConnection;
use super::models::{
    parse_store_timestamp, Annotation, AnnotationKind, Book, BookFormat, Chapter, MarkupPayload,
};
use crate::errors::ExportError;

/// Fallback title for books without one
pub const UNKNOWN_TITLE: &str = "Unknown Title";
/// Fallback author for books without one
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Everything read for one book: metadata, chapter table, annotation rows,
/// and the count of rows skipped as malformed.
#[derive(Debug)]
pub struct BookExtract {
    /// The book itself
    pub book: Book,
    /// Table-of-contents rows in volume order
    pub chapters: Vec<Chapter>,
    /// Annotation rows in store order
    pub annotations: Vec<Annotation>,
    /// Rows dropped during the read (bad timestamp, missing markup payload)
    pub skipped_records: usize,
}

/// Reader over one scoped store connection.
///
/// Owns the connection for the duration of the read pass; dropping the
/// reader releases the database file.
pub struct StoreReader {
    /// The scoped connection
    conn: StoreConnection,
}

impl StoreReader {
    /// Open the store at the given path for one read pass.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, ExportError> {
        let conn = StoreConnection::open_read_only(db_path)?;
        Ok(Self { conn })
    }

    /// All books that have at least one exportable annotation row: a text
    /// payload, or a markup-kind row.
    pub fn read_books(&self) -> Result<Vec<Book>, ExportError> {
        let mut stmt = self
            .conn
            .connection()
            .prepare(
                r#"
                SELECT
                    BookContent.ContentID,
                    BookContent.Title,
                    BookContent.Attribution,
                    BookContent.MimeType
                FROM Bookmark
                JOIN Content ON Bookmark.ContentID = Content.ContentID
                JOIN Content AS BookContent ON Content.BookID = BookContent.ContentID
                WHERE Bookmark.Text IS NOT NULL OR Bookmark.Type = 'markup'
                GROUP BY BookContent.ContentID
                ORDER BY BookContent.Title
                "#,
            )
            .map_err(Self::store_error)?;

        let books = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let title: Option<String> = row.get(1)?;
                let author: Option<String> = row.get(2)?;
                let mime_type: Option<String> = row.get(3)?;
                Ok((id, title, author, mime_type))
            })
            .map_err(Self::store_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(Self::store_error)?
            .into_iter()
            .map(|(id, title, author, mime_type)| {
                let format = BookFormat::from_mime_type(mime_type.as_deref().unwrap_or(""));
                Book::new(
                    id,
                    title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
                    author.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
                    format,
                )
            })
            .collect();

        Ok(books)
    }

    /// Table-of-contents rows for a book, in volume order.
    pub fn read_chapters(&self, book_id: &str) -> Result<Vec<Chapter>, ExportError> {
        let mut stmt = self
            .conn
            .connection()
            .prepare(
                r#"
                SELECT ContentID, Title, VolumeIndex
                FROM Content
                WHERE BookID = ?1 AND ContentID != ?1
                ORDER BY VolumeIndex
                "#,
            )
            .map_err(Self::store_error)?;

        let chapters = stmt
            .query_map(params![book_id], |row| {
                Ok(Chapter {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    ordering: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                })
            })
            .map_err(Self::store_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(Self::store_error)?;

        Ok(chapters)
    }

    /// Annotation rows for a book, in store order (rowid), which serves as
    /// the deterministic secondary sort key downstream.
    ///
    /// Returns the rows together with the count of rows skipped as
    /// malformed.
    pub fn read_annotations(&self, book: &Book) -> Result<(Vec<Annotation>, usize), ExportError> {
        let mut stmt = self
            .conn
            .connection()
            .prepare(
                r#"
                SELECT
                    Bookmark.BookmarkID,
                    Bookmark.ContentID,
                    Bookmark.Text,
                    Bookmark.Annotation,
                    Bookmark.DateCreated,
                    Bookmark.Type,
                    Bookmark.Color
                FROM Bookmark
                JOIN Content ON Bookmark.ContentID = Content.ContentID
                WHERE Content.BookID = ?1
                  AND (Bookmark.Text IS NOT NULL OR Bookmark.Type = 'markup')
                ORDER BY Bookmark.rowid
                "#,
            )
            .map_err(Self::store_error)?;

        let rows = stmt
            .query_map(params![&book.id], |row| {
                let id: String = row.get(0)?;
                let chapter_id: Option<String> = row.get(1)?;
                let text: Option<String> = row.get(2)?;
                let note: Option<String> = row.get(3)?;
                let created: Option<String> = row.get(4)?;
                let kind: Option<String> = row.get(5)?;
                let color_index: Option<i64> = row.get(6)?;
                Ok((id, chapter_id, text, note, created, kind, color_index))
            })
            .map_err(Self::store_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(Self::store_error)?;

        let mut annotations = Vec::with_capacity(rows.len());
        let mut skipped = 0usize;

        for (id, chapter_id, text, note, created, kind, color_index) in rows {
            // Timestamp is required: it is the sole ordering key.
            let created = match created.as_deref().and_then(parse_store_timestamp) {
                Some(ts) => ts,
                None => {
                    warn!("Skipping annotation {}: unparsable timestamp", id);
                    skipped += 1;
                    continue;
                }
            };

            let kind = kind.unwrap_or_default();
            let markup = if AnnotationKind::from_store_type(&kind)
                == Some(AnnotationKind::Markup)
                && book.supports_markup
            {
                // Markup parsing for a non-capable format is undefined, so
                // the payload is only ever loaded behind the capability flag.
                match self.load_markup_payload(&id) {
                    Some(payload) => Some(payload),
                    None => {
                        warn!("Skipping markup annotation {}: payload missing or unreadable", id);
                        skipped += 1;
                        continue;
                    }
                }
            } else {
                None
            };

            annotations.push(Annotation {
                id,
                book_id: book.id.clone(),
                chapter_id,
                kind,
                created,
                color_index,
                text,
                note,
                markup,
            });
        }

        debug!(
            "Read {} annotations for '{}' ({} skipped)",
            annotations.len(),
            book.title,
            skipped
        );

        Ok((annotations, skipped))
    }

    /// Load the image payload for a markup annotation from the `markups/`
    /// directory. The raster page image is required; the vector layer is
    /// optional.
    fn load_markup_payload(&self, annotation_id: &str) -> Option<MarkupPayload> {
        let dir = self.conn.markups_dir();
        let raster_path = dir.join(format!("{}.jpg", annotation_id));
        let svg_path = dir.join(format!("{}.svg", annotation_id));

        let raster = match std::fs::read(&raster_path) {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => {
                warn!("Markup raster is empty: {}", raster_path.display());
                return None;
            }
            Err(e) => {
                warn!("Cannot read markup raster {}: {}", raster_path.display(), e);
                return None;
            }
        };

        let svg = std::fs::read(&svg_path).ok().filter(|b| !b.is_empty());

        Some(MarkupPayload { svg, raster })
    }

    /// Perform the full read pass: every annotated book with its chapters
    /// and annotation rows.
    pub fn read_all(&self) -> Result<Vec<BookExtract>, ExportError> {
        let books = self.read_books()?;
        let mut extracts = Vec::with_capacity(books.len());

        for book in books {
            let chapters = self.read_chapters(&book.id)?;
            let (annotations, skipped_records) = self.read_annotations(&book)?;

            if annotations.is_empty() && skipped_records == 0 {
                continue;
            }

            extracts.push(BookExtract {
                book,
                chapters,
                annotations,
                skipped_records,
            });
        }

        Ok(extracts)
    }

    fn store_error(e: rusqlite::Error) -> ExportError {
        ExportError::IoUnavailable(e.to_string())
    }
}

/// Read the full annotation set from the store at `db_path` under one
/// scoped, read-only connection. The connection is released before this
/// function returns.
pub fn read<P: AsRef<Path>>(db_path: P) -> Result<Vec<BookExtract>, ExportError> {
    let reader = StoreReader::open(db_path)?;
    reader.read_all()
}
