use async_trait::async_trait;
use imgpipe_core::LogEntry;
use parking_lot::Mutex;

use super::SinkError;
use crate::traits::LogSink;

/// Keeps entries in memory. Useful for embedding and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything persisted so far, in arrival order.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl LogSink for MemorySink {
    async fn persist(&self, entry: &LogEntry) -> Result<(), SinkError> {
        self.entries.lock().push(entry.clone());
        Ok(())
    }
}
