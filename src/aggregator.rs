use chrono::NaiveDateTime;
use log::warn;
use std::collections::HashMap;

use crate::colors::{ColorMap, ColorPair};
use crate::store::{Annotation, AnnotationKind, Book, Chapter};

// @module: Per-book annotation aggregation

/// Section label used when a chapter reference cannot be resolved or the
/// chapter has no title.
pub const DEFAULT_CHAPTER_TITLE: &str = "Untitled Chapter";

/// One rendered annotation inside a chapter section.
#[derive(Debug, Clone)]
pub enum AnnotationBlock {
    /// A text annotation (highlight or note)
    Text {
        /// Highlighted text
        text: String,
        /// Attached user note, if any
        note: Option<String>,
        /// Highlight or note
        kind: AnnotationKind,
        /// Creation timestamp
        created: NaiveDateTime,
        /// Resolved highlight colors
        colors: ColorPair,
        /// Whether the color index fell back to the default pair
        color_fallback: bool,
    },
    /// A markup annotation (rendered page image plus caption)
    Markup {
        /// Store identifier, used to name the uploaded resource
        annotation_id: String,
        /// Rendered page image (JPEG bytes)
        raster: Vec<u8>,
        /// Caption text, if any
        caption: Option<String>,
        /// Creation timestamp
        created: NaiveDateTime,
    },
}

impl AnnotationBlock {
    /// Creation timestamp of the underlying annotation.
    pub fn created(&self) -> NaiveDateTime {
        match self {
            AnnotationBlock::Text { created, .. } => *created,
            AnnotationBlock::Markup { created, .. } => *created,
        }
    }

    /// Type label for template rendering.
    pub fn type_label(&self) -> &'static str {
        match self {
            AnnotationBlock::Text { kind, .. } => match kind {
                AnnotationKind::Highlight => "highlight",
                AnnotationKind::Note => "note",
                AnnotationKind::Markup => "markup",
            },
            AnnotationBlock::Markup { .. } => "markup",
        }
    }
}

/// An ordered group of annotation blocks under one chapter heading.
#[derive(Debug, Clone)]
pub struct ChapterSection {
    /// Chapter title (or [`DEFAULT_CHAPTER_TITLE`])
    pub title: String,
    /// Blocks in timestamp-ascending order
    pub blocks: Vec<AnnotationBlock>,
}

/// The aggregated, ordered result for one book, ready for format-specific
/// rendering. Exporters borrow this read-only.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    /// Store identifier of the book
    pub book_id: String,
    /// Book title
    pub title: String,
    /// Book author
    pub author: String,
    /// Chapter sections in first-appearance order
    pub sections: Vec<ChapterSection>,
    /// Rows dropped during aggregation (unknown kind, missing content)
    pub dropped_records: usize,
    /// How many blocks resolved their color through the fallback pair
    pub color_fallbacks: usize,
}

impl RenderedDocument {
    /// Note/file title for this document.
    pub fn display_title(&self) -> String {
        format!("{} - {}", self.title, self.author)
    }

    /// Total number of annotation blocks across all sections.
    pub fn block_count(&self) -> usize {
        self.sections.iter().map(|s| s.blocks.len()).sum()
    }
}

/// Section key during aggregation: a resolvable chapter, or the synthetic
/// default section for dangling references.
#[derive(PartialEq, Eq, Hash, Clone)]
enum SectionKey {
    Chapter(String),
    Default,
}

/// Group a book's annotations into a [`RenderedDocument`].
///
/// The stream is stable-sorted by timestamp (ties keep store order, so the
/// output is reproducible across runs), then walked once: chapter sections
/// are created in order of first appearance, and dangling chapter
/// references collapse into one synthetic section positioned the same way.
/// A row that fails classification is dropped and counted; a single bad row
/// never aborts the book.
pub fn aggregate(
    book: &Book,
    annotations: &[Annotation],
    chapters: &[Chapter],
    colors: &ColorMap,
) -> RenderedDocument {
    let chapter_titles: HashMap<&str, Option<&str>> = chapters
        .iter()
        .map(|c| (c.id.as_str(), c.title.as_deref()))
        .collect();

    // Stable sort: slice order is store order, the secondary key.
    let mut ordered: Vec<&Annotation> = annotations.iter().collect();
    ordered.sort_by_key(|a| a.created);

    let mut sections: Vec<ChapterSection> = Vec::new();
    let mut section_index: HashMap<SectionKey, usize> = HashMap::new();
    let mut dropped_records = 0usize;
    let mut color_fallbacks = 0usize;

    for annotation in ordered {
        let block = match classify(book, annotation, colors, &mut color_fallbacks) {
            Some(block) => block,
            None => {
                dropped_records += 1;
                continue;
            }
        };

        let (key, title) = match annotation
            .chapter_id
            .as_deref()
            .and_then(|id| chapter_titles.get(id).map(|title| (id, *title)))
        {
            Some((id, title)) => (
                SectionKey::Chapter(id.to_string()),
                title.unwrap_or(DEFAULT_CHAPTER_TITLE).to_string(),
            ),
            None => (SectionKey::Default, DEFAULT_CHAPTER_TITLE.to_string()),
        };

        let index = *section_index.entry(key).or_insert_with(|| {
            sections.push(ChapterSection {
                title,
                blocks: Vec::new(),
            });
            sections.len() - 1
        });
        sections[index].blocks.push(block);
    }

    RenderedDocument {
        book_id: book.id.clone(),
        title: book.title.clone(),
        author: book.author.clone(),
        sections,
        dropped_records,
        color_fallbacks,
    }
}

/// Classify one annotation row into a block, or `None` when the row must be
/// dropped.
fn classify(
    book: &Book,
    annotation: &Annotation,
    colors: &ColorMap,
    color_fallbacks: &mut usize,
) -> Option<AnnotationBlock> {
    let kind = match annotation.classify() {
        Some(kind) => kind,
        None => {
            warn!(
                "Dropping annotation {}: unknown kind '{}'",
                annotation.id, annotation.kind
            );
            return None;
        }
    };

    match kind {
        AnnotationKind::Highlight | AnnotationKind::Note => {
            let text = match annotation.text.as_deref() {
                Some(text) if !text.trim().is_empty() => text.to_string(),
                _ => {
                    warn!("Dropping annotation {}: empty text", annotation.id);
                    return None;
                }
            };

            let (pair, fallback) = colors.resolve(annotation.color_index.unwrap_or(0));
            if fallback {
                *color_fallbacks += 1;
            }

            Some(AnnotationBlock::Text {
                text,
                note: annotation.note.clone(),
                kind,
                created: annotation.created,
                colors: pair,
                color_fallback: fallback,
            })
        }
        AnnotationKind::Markup => {
            // Capability is a property of the book format; a markup row on
            // a non-capable book is dropped no matter what it carries.
            if !book.supports_markup {
                warn!(
                    "Dropping markup annotation {}: book format does not support markup",
                    annotation.id
                );
                return None;
            }

            let raster = match annotation.markup.as_ref() {
                Some(payload) => payload.raster.clone(),
                None => {
                    warn!("Dropping markup annotation {}: no payload", annotation.id);
                    return None;
                }
            };

            Some(AnnotationBlock::Markup {
                annotation_id: annotation.id.clone(),
                raster,
                caption: annotation.note.clone(),
                created: annotation.created,
            })
        }
    }
}
