/*!
 * Mock exporter for testing batch behavior.
 *
 * Simulates different destination behaviors:
 * - `MockExporter::working()` - every document exports cleanly
 * - `MockExporter::failing()` - every document fails
 * - `MockExporter::intermittent(n)` - every nth document fails
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{Exporter, ExportResult};
use crate::aggregator::RenderedDocument;
use crate::errors::ExportError;

/// Behavior mode for the mock exporter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Always fails with a retryable error
    Failing,
    /// Fails every nth document (1-based)
    Intermittent {
        /// Which document in the sequence fails
        fail_every: usize,
    },
}

/// Mock export destination that records what was sent to it.
pub struct MockExporter {
    /// Behavior mode
    behavior: MockBehavior,
    /// Document counter for intermittent failures
    request_count: AtomicUsize,
    /// Titles of documents exported successfully
    exported: Mutex<Vec<String>>,
}

impl MockExporter {
    /// Create a mock exporter with the specified behavior.
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: AtomicUsize::new(0),
            exported: Mutex::new(Vec::new()),
        }
    }

    /// A destination that always accepts.
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// A destination that always rejects.
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// A destination that rejects every nth document.
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Titles of the documents this destination accepted, in order.
    pub fn exported_titles(&self) -> Vec<String> {
        self.exported
            .lock()
            .map(|titles| titles.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Exporter for MockExporter {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn export(&self, document: &RenderedDocument) -> ExportResult {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;
        let title = document.display_title();
        let mut result = ExportResult::new();

        let should_fail = match self.behavior {
            MockBehavior::Working => false,
            MockBehavior::Failing => true,
            MockBehavior::Intermittent { fail_every } => {
                fail_every > 0 && count % fail_every == 0
            }
        };

        if should_fail {
            result.record_failure(
                title,
                ExportError::ExportFailed {
                    item: document.display_title(),
                    reason: "HTTP 500: simulated server error".to_string(),
                },
            );
        } else {
            if let Ok(mut exported) = self.exported.lock() {
                exported.push(title);
            }
            result.record_success();
        }

        result
    }
}
