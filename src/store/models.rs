/*!
 * Annotation store entity models.
 *
 * These structures map rows from the device database (`Bookmark` and
 * `Content` tables) to type-safe values used by the rest of the pipeline.
 */

use chrono::NaiveDateTime;
use std::fmt;

/// Content format of a book, derived from the Content row's MIME type.
///
/// Markup (stylus) support is a property of the format, not of the
/// annotations present: a book either can or cannot carry handwritten
/// marks, regardless of what rows exist for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookFormat {
    /// Reflowable ePub
    Epub,
    /// Kobo kepub (reflowable, markup-capable on stylus devices)
    Kepub,
    /// Fixed-layout PDF (markup-capable)
    Pdf,
    /// Anything else the device can open
    Other,
}

impl BookFormat {
    /// Map a Content MIME type to a format.
    pub fn from_mime_type(mime_type: &str) -> Self {
        match mime_type {
            "application/epub+zip" => BookFormat::Epub,
            "application/x-kobo-epub+zip" => BookFormat::Kepub,
            "application/pdf" => BookFormat::Pdf,
            _ => BookFormat::Other,
        }
    }

    /// Whether this format can carry markup annotations.
    pub fn supports_markup(&self) -> bool {
        matches!(self, BookFormat::Kepub | BookFormat::Pdf)
    }
}

/// A book on the device that has at least one annotation.
#[derive(Debug, Clone)]
pub struct Book {
    /// Store identifier (the book row's ContentID)
    pub id: String,
    /// Book title
    pub title: String,
    /// Author (the store's Attribution column)
    pub author: String,
    /// Content format
    pub format: BookFormat,
    /// Precomputed markup capability, derived from `format`
    pub supports_markup: bool,
}

impl Book {
    /// Create a book, deriving the markup capability from the format.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        format: BookFormat,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            format,
            supports_markup: format.supports_markup(),
        }
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.title, self.author)
    }
}

/// A table-of-contents entry for a book.
#[derive(Debug, Clone)]
pub struct Chapter {
    /// Store identifier (the chapter row's ContentID)
    pub id: String,
    /// Chapter title, if the store has one
    pub title: Option<String>,
    /// Ordering key within the book (VolumeIndex)
    pub ordering: i64,
}

/// Annotation kind discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    /// A highlighted text passage
    Highlight,
    /// A highlight with an attached user note
    Note,
    /// A handwritten/drawn mark (vector + raster image data)
    Markup,
}

impl AnnotationKind {
    /// Map the store's `Bookmark.Type` value to a kind.
    ///
    /// Returns `None` for values the pipeline does not export (for example
    /// `dogear`); the caller drops and counts those rows.
    pub fn from_store_type(store_type: &str) -> Option<Self> {
        match store_type {
            "highlight" => Some(AnnotationKind::Highlight),
            "note" | "annotation" => Some(AnnotationKind::Note),
            "markup" => Some(AnnotationKind::Markup),
            _ => None,
        }
    }

    /// Whether this kind carries text content.
    pub fn is_text(&self) -> bool {
        matches!(self, AnnotationKind::Highlight | AnnotationKind::Note)
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationKind::Highlight => write!(f, "highlight"),
            AnnotationKind::Note => write!(f, "note"),
            AnnotationKind::Markup => write!(f, "markup"),
        }
    }
}

/// Image data for a markup annotation.
///
/// The device stores a vector layer (SVG) and a pre-rendered page raster
/// (JPEG) side by side in its `markups/` directory. The raster is what the
/// exporters upload; the vector layer is kept for callers that composite
/// the two themselves.
#[derive(Debug, Clone)]
pub struct MarkupPayload {
    /// Vector stroke data (SVG bytes)
    pub svg: Option<Vec<u8>>,
    /// Rendered page image (JPEG bytes)
    pub raster: Vec<u8>,
}

/// One annotation row from the store.
#[derive(Debug, Clone)]
pub struct Annotation {
    /// Store identifier (BookmarkID)
    pub id: String,
    /// The book this annotation belongs to
    pub book_id: String,
    /// Chapter reference (the Bookmark row's ContentID); resolved against
    /// the chapter table during aggregation, may dangle
    pub chapter_id: Option<String>,
    /// Raw kind discriminator as stored (`Bookmark.Type`)
    pub kind: String,
    /// Creation timestamp; required, the sole ordering key within a chapter
    pub created: NaiveDateTime,
    /// Highlight color index (text kinds only)
    pub color_index: Option<i64>,
    /// Highlighted text (text kinds only)
    pub text: Option<String>,
    /// User note, or caption text for a markup
    pub note: Option<String>,
    /// Image payload (markup kind on capable books only)
    pub markup: Option<MarkupPayload>,
}

impl Annotation {
    /// Classify the raw kind discriminator.
    pub fn classify(&self) -> Option<AnnotationKind> {
        AnnotationKind::from_store_type(&self.kind)
    }
}

/// Parse a store timestamp string.
///
/// The device writes ISO-ish local timestamps, with or without fractional
/// seconds or a trailing `Z`, and older firmware used a space separator.
pub fn parse_store_timestamp(raw: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%d %H:%M:%S",
    ];

    let trimmed = raw.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
}
