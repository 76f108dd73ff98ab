use parking_lot::Mutex;

use crate::processor::error::{ErrorEntry, Severity};

/// Receives reportable failures; never fails
pub trait ErrorSink: Send + Sync {
    fn record(&self, entry: &ErrorEntry);
}

/// Writes entries to the log
#[derive(Debug, Default)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn record(&self, entry: &ErrorEntry) {
        match entry.severity {
            Severity::Warning => tracing::warn!(
                operation_id = %entry.operation_id,
                identifier = %entry.identifier,
                "{}",
                entry.message
            ),
            Severity::Error => tracing::error!(
                operation_id = %entry.operation_id,
                identifier = %entry.identifier,
                "{}",
                entry.message
            ),
        }
    }
}

/// Keeps entries in memory
#[derive(Debug, Default)]
pub struct CollectingErrorSink {
    entries: Mutex<Vec<ErrorEntry>>,
}

impl CollectingErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<ErrorEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ErrorSink for CollectingErrorSink {
    fn record(&self, entry: &ErrorEntry) {
        self.entries.lock().push(entry.clone());
    }
}
