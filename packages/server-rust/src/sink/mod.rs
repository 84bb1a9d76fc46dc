//! Log sinks for the logging stage.
//!
//! - [`file`]: append-only JSON-lines file
//! - [`trace`]: structured `tracing` events
//! - [`memory`]: in-process buffer
//! - [`fanout`]: concurrent delivery to several sinks with isolated failures

pub mod fanout;
pub mod file;
pub mod memory;
pub mod trace;

use std::sync::Arc;

pub use fanout::FanoutSink;
pub use file::FileSink;
pub use memory::MemorySink;
pub use trace::TracingSink;

use crate::service::config::ServerConfig;
use crate::traits::LogSink;

/// Errors raised by individual sinks. Never surfaced to callers of the
/// handling chain.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("log sink I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize log entry: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("log sink unavailable: {0}")]
    Unavailable(String),
}

/// Builds the sink configured by `config`: a fan-out over the file sink
/// (when a log file is set) and the tracing sink (when enabled).
#[must_use]
pub fn build_sink(config: &ServerConfig) -> Arc<dyn LogSink> {
    let mut sinks: Vec<Arc<dyn LogSink>> = Vec::new();
    if let Some(path) = &config.log_file {
        sinks.push(Arc::new(FileSink::new(path.clone())));
    }
    if config.trace_sink {
        sinks.push(Arc::new(TracingSink));
    }
    Arc::new(FanoutSink::new(sinks))
}

#[cfg(test)]
mod tests {
    use imgpipe_core::{LogEntry, ANONYMOUS};
    use serde_json::Map;

    use super::*;

    #[tokio::test]
    async fn configured_sink_writes_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("app.log");
        let config = ServerConfig {
            log_file: Some(path.clone()),
            trace_sink: false,
            ..ServerConfig::default()
        };

        let sink = build_sink(&config);
        sink.persist(&LogEntry::success(ANONYMOUS, "/images/resize", Map::new(), 1))
            .await
            .unwrap();

        let contents = std::fs::read_to_string(path).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    #[tokio::test]
    async fn empty_configuration_still_accepts_entries() {
        let config = ServerConfig {
            log_file: None,
            trace_sink: false,
            ..ServerConfig::default()
        };
        let sink = build_sink(&config);
        assert!(sink
            .persist(&LogEntry::success(ANONYMOUS, "/images/crop", Map::new(), 0))
            .await
            .is_ok());
    }
}
