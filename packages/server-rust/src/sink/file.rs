//! Append-only JSON-lines file sink.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use imgpipe_core::LogEntry;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::SinkError;
use crate::traits::LogSink;

/// Writes one JSON object per line, UTF-8, appending to `path`.
///
/// Parent directories are created on first write. Writes from concurrent
/// calls are serialized so lines never interleave.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LogSink for FileSink {
    async fn persist(&self, entry: &LogEntry) -> Result<(), SinkError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use imgpipe_core::{LogOutcome, ANONYMOUS};
    use serde_json::{json, Map};

    use super::*;

    #[tokio::test]
    async fn appends_one_line_per_entry() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path().join("nested").join("app.log"));

        let mut params = Map::new();
        params.insert("angle".into(), json!(90));
        sink.persist(&LogEntry::success("ada@example.com", "/images/rotate", params, 4))
            .await
            .unwrap();
        sink.persist(&LogEntry::failure(ANONYMOUS, "/images/rotate", Map::new(), 1, "nope"))
            .await
            .unwrap();

        let contents = tokio::fs::read_to_string(sink.path()).await.unwrap();
        let entries: Vec<LogEntry> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].user, "ada@example.com");
        assert_eq!(entries[0].params["angle"], json!(90));
        assert_eq!(entries[1].result, LogOutcome::Error);
        assert_eq!(entries[1].message.as_deref(), Some("nope"));
    }

    #[tokio::test]
    async fn concurrent_writes_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(FileSink::new(dir.path().join("app.log")));

        let mut handles = Vec::new();
        for i in 0..16 {
            let sink = Arc::clone(&sink);
            handles.push(tokio::spawn(async move {
                let entry = LogEntry::success(ANONYMOUS, format!("/images/{i}"), Map::new(), i);
                sink.persist(&entry).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let contents = tokio::fs::read_to_string(sink.path()).await.unwrap();
        assert_eq!(contents.lines().count(), 16);
        for line in contents.lines() {
            assert!(serde_json::from_str::<LogEntry>(line).is_ok());
        }
    }

    #[tokio::test]
    async fn unwritable_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending.
        let sink = FileSink::new(dir.path());
        let err = sink
            .persist(&LogEntry::success(ANONYMOUS, "/images/crop", Map::new(), 0))
            .await
            .unwrap_err();
        assert!(matches!(err, SinkError::Io(_)));
    }
}
