use async_trait::async_trait;
use imgpipe_core::{LogEntry, LogLevel};

use super::SinkError;
use crate::traits::LogSink;

/// Emits each entry as a structured `tracing` event on the
/// `imgpipe::access` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

#[async_trait]
impl LogSink for TracingSink {
    async fn persist(&self, entry: &LogEntry) -> Result<(), SinkError> {
        let params = serde_json::to_string(&entry.params)?;
        match entry.level {
            LogLevel::Info => tracing::info!(
                target: "imgpipe::access",
                user = %entry.user,
                endpoint = %entry.endpoint,
                params = %params,
                duration_ms = entry.duration,
                "operation succeeded"
            ),
            LogLevel::Error => tracing::error!(
                target: "imgpipe::access",
                user = %entry.user,
                endpoint = %entry.endpoint,
                params = %params,
                duration_ms = entry.duration,
                error = entry.message.as_deref().unwrap_or_default(),
                "operation failed"
            ),
        }
        Ok(())
    }
}
