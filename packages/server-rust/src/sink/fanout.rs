//! Fan-out sink: delivers one entry to every child concurrently.
//!
//! Child failures are reported with `tracing::warn!` and absorbed. The
//! fan-out itself always succeeds once every child has been attempted.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use imgpipe_core::LogEntry;
use tracing::warn;

use super::SinkError;
use crate::traits::LogSink;

pub struct FanoutSink {
    sinks: Vec<Arc<dyn LogSink>>,
}

impl FanoutSink {
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn LogSink>>) -> Self {
        Self { sinks }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl LogSink for FanoutSink {
    async fn persist(&self, entry: &LogEntry) -> Result<(), SinkError> {
        let results = join_all(self.sinks.iter().map(|sink| sink.persist(entry))).await;
        for (index, result) in results.into_iter().enumerate() {
            if let Err(err) = result {
                warn!(sink = index, error = %err, "log sink failed; entry dropped for this sink");
            }
        }
        Ok(())
    }
}
