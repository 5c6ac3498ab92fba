/*!
 * Error types for the inkport library.
 *
 * This module contains the export error taxonomy, using the thiserror
 * crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur while reading from the annotation store or
/// writing to an export destination.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The device annotation store is unreachable or locked. Fatal for the
    /// current export attempt; the caller may retry once the device is free.
    #[error("annotation store unavailable: {0}")]
    IoUnavailable(String),

    /// A single annotation or markup payload could not be parsed. The record
    /// is skipped and counted; it never fails the book it belongs to.
    #[error("malformed record {record_id}: {reason}")]
    MalformedRecord {
        /// Store identifier of the offending record
        record_id: String,
        /// What could not be parsed
        reason: String,
    },

    /// A single destination write or send failed. Retryable per item; the
    /// rest of the batch continues.
    #[error("export failed for {item}: {reason}")]
    ExportFailed {
        /// The item (note, resource or file) that failed
        item: String,
        /// Underlying cause
        reason: String,
    },

    /// The destination cannot represent this annotation kind. Reported as a
    /// skipped item, not as a failure.
    #[error("unsupported by this destination: {item}")]
    Unsupported {
        /// The item that was skipped
        item: String,
    },
}

impl ExportError {
    /// Whether the caller can reasonably retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExportError::IoUnavailable(_) | ExportError::ExportFailed { .. }
        )
    }

    /// Whether the error is fatal for the current export attempt.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExportError::IoUnavailable(_))
    }
}
