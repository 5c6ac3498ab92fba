/*!
 * Export destination implementations.
 *
 * This module contains the polymorphic exporter seam and its two
 * implementations:
 * - Joplin: notes via the Web Clipper HTTP API
 * - Markdown: one local file per book
 *
 * New destinations implement [`Exporter`]; nothing branches on a target
 * type tag inside shared code.
 */

use async_trait::async_trait;
use log::{info, warn};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::aggregator::RenderedDocument;
use crate::errors::ExportError;

pub mod joplin;
pub mod markdown;
pub mod mock;

/// One recorded problem from an export run.
#[derive(Debug)]
pub struct ExportIssue {
    /// The item the issue applies to (note title, resource, file path)
    pub item: String,
    /// What went wrong, or why the item was skipped
    pub error: ExportError,
}

/// Outcome of exporting one or more documents.
///
/// Counts are per item (a note, an uploaded resource, a written file);
/// non-fatal problems are aggregated into `issues` so the caller can
/// present a summary. Nothing is dropped without a count.
#[derive(Debug, Default)]
pub struct ExportResult {
    /// Items written/sent successfully
    pub success_count: usize,
    /// Items that failed (retryable per item)
    pub failure_count: usize,
    /// Items skipped as unsupported by the destination
    pub skipped_count: usize,
    /// Detail for every failure and skip
    pub issues: Vec<ExportIssue>,
}

impl ExportResult {
    /// An empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful item.
    pub fn record_success(&mut self) {
        self.success_count += 1;
    }

    /// Record a failed item.
    pub fn record_failure(&mut self, item: impl Into<String>, error: ExportError) {
        self.failure_count += 1;
        self.issues.push(ExportIssue {
            item: item.into(),
            error,
        });
    }

    /// Record an item the destination cannot represent.
    pub fn record_skip(&mut self, item: impl Into<String>) {
        let item = item.into();
        self.skipped_count += 1;
        self.issues.push(ExportIssue {
            error: ExportError::Unsupported { item: item.clone() },
            item,
        });
    }

    /// Record a non-fatal note without touching the counters.
    pub fn record_issue(&mut self, item: impl Into<String>, error: ExportError) {
        self.issues.push(ExportIssue {
            item: item.into(),
            error,
        });
    }

    /// Fold another result into this one.
    pub fn merge(&mut self, other: ExportResult) {
        self.success_count += other.success_count;
        self.failure_count += other.failure_count;
        self.skipped_count += other.skipped_count;
        self.issues.extend(other.issues);
    }

    /// Whether everything succeeded with nothing skipped.
    pub fn is_clean(&self) -> bool {
        self.failure_count == 0 && self.skipped_count == 0 && self.issues.is_empty()
    }
}

impl fmt::Display for ExportResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} exported, {} failed, {} skipped",
            self.success_count, self.failure_count, self.skipped_count
        )
    }
}

/// Capability interface for export destinations.
///
/// `export` renders and writes one document and reports per-item outcomes;
/// it does not return `Err` because item failures are aggregated, never
/// escalated to the batch.
#[async_trait]
pub trait Exporter: Send + Sync {
    /// Destination name for logging
    fn name(&self) -> &'static str;

    /// Export one aggregated document to this destination.
    async fn export(&self, document: &RenderedDocument) -> ExportResult;
}

/// Export a batch of documents sequentially, in document order.
///
/// Each document is an atomic unit from the caller's perspective: the
/// cancellation flag is only checked between documents, so setting it never
/// leaves a book half-exported. Per-document non-fatal counters (records
/// dropped during read/aggregation) are folded into the result.
pub async fn run_export<E: Exporter + ?Sized>(
    exporter: &E,
    documents: &[RenderedDocument],
    cancel: &AtomicBool,
) -> ExportResult {
    let mut result = ExportResult::new();

    for document in documents {
        if cancel.load(Ordering::SeqCst) {
            info!(
                "Export to {} cancelled before '{}'",
                exporter.name(),
                document.display_title()
            );
            break;
        }

        let document_result = exporter.export(document).await;
        result.merge(document_result);

        if document.dropped_records > 0 {
            warn!(
                "'{}': {} records dropped before export",
                document.display_title(),
                document.dropped_records
            );
            result.record_issue(
                document.display_title(),
                ExportError::MalformedRecord {
                    record_id: document.book_id.clone(),
                    reason: format!(
                        "{} records dropped during read/aggregation",
                        document.dropped_records
                    ),
                },
            );
        }
    }

    result
}
