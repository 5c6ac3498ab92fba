/*!
 * Read-only access to the device annotation store.
 *
 * The store is the Kobo on-device SQLite database (`KoboReader.sqlite`).
 * This module owns connection acquisition, the row-to-model mapping and the
 * markup payload loading; it never writes to the device.
 */

pub mod connection;
pub mod models;
pub mod reader;

pub use connection::StoreConnection;
pub use models::{Annotation, AnnotationKind, Book, BookFormat, Chapter, MarkupPayload};
pub use reader::{read, BookExtract, StoreReader};
