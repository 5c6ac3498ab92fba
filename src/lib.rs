/*!
 * # inkport
 *
 * A Rust library for exporting reading annotations from a Kobo e-reader's
 * on-device database to Joplin or to local Markdown files.
 *
 * ## Features
 *
 * - Read highlights, notes and handwritten markup from the device database
 *   (read-only, scoped access)
 * - Group annotations per book and chapter, ordered by creation time
 * - Resolve highlight colors through a user-replaceable color map
 * - Render annotations through a user-configurable template
 * - Export to Joplin via the Web Clipper API, or to Markdown files
 * - Partial-failure semantics: one bad record or one failed note never
 *   aborts the batch
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration value objects
 * - `store`: Read-only access to the device annotation database:
 *   - `store::connection`: Scoped read-only connection
 *   - `store::reader`: Row-to-model read pass
 * - `colors`: Highlight color resolution
 * - `template`: Placeholder-based annotation templates
 * - `aggregator`: Per-book grouping and ordering
 * - `exporters`: Export destinations behind a common trait:
 *   - `exporters::joplin`: Joplin Web Clipper API
 *   - `exporters::markdown`: Markdown files
 * - `errors`: Custom error types for the library
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]

// Public modules
pub mod aggregator;
pub mod app_config;
pub mod colors;
pub mod errors;
pub mod exporters;
pub mod store;
pub mod template;

// Re-export main types for easier usage
pub use aggregator::{aggregate, AnnotationBlock, ChapterSection, RenderedDocument};
pub use app_config::{ExportConfig, ExportTarget, JoplinConfig, MarkdownConfig, WritePolicy};
pub use colors::{ColorMap, ColorPair};
pub use errors::ExportError;
pub use exporters::{run_export, Exporter, ExportIssue, ExportResult};
pub use store::{read, Annotation, AnnotationKind, Book, BookExtract, Chapter, StoreReader};
pub use template::{Template, TemplateBindings};
