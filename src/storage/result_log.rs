//! Append-only log of suggestion responses

use crate::error::{Error, Result};
use crate::suggest::SuggestionResponse;
use async_trait::async_trait;
use std::collections::HashSet;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Durable record of every response collected by a run.
///
/// One writer per run; `append` is called once per finished batch.
#[async_trait]
pub trait ResultLog: Send + Sync {
    async fn append(&self, responses: &[SuggestionResponse]) -> Result<()>;

    /// Candidate queries that already have a response
    async fn written_keys(&self) -> Result<HashSet<String>>;

    async fn read_all(&self) -> Result<Vec<SuggestionResponse>>;
}

/// Line-delimited JSON file, one response per line
pub struct JsonlResultLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlResultLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn storage_error(&self, action: &str, e: impl std::fmt::Display) -> Error {
        Error::storage(format!("{} {}: {}", action, self.path.display(), e))
    }

    async fn read_lines(&self) -> Result<Vec<SuggestionResponse>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.storage_error("cannot read", e)),
        };

        let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
        let last = lines.len().saturating_sub(1);
        let mut responses = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            match serde_json::from_str::<SuggestionResponse>(line) {
                Ok(response) => responses.push(response),
                // A crash mid-append leaves at most one partial trailing line
                Err(e) if i == last => {
                    warn!("Ignoring torn final line in {}: {}", self.path.display(), e);
                }
                Err(e) => return Err(self.storage_error(&format!("corrupt line {} in", i + 1), e)),
            }
        }
        Ok(responses)
    }

    /// Cut a partial trailing line back to the last newline.
    ///
    /// Returns the number of bytes dropped.
    async fn truncate_torn_tail(file: &mut File) -> std::io::Result<u64> {
        let len = file.metadata().await?.len();
        if len == 0 {
            return Ok(0);
        }

        let mut last = [0u8; 1];
        file.seek(SeekFrom::Start(len - 1)).await?;
        file.read_exact(&mut last).await?;
        if last[0] == b'\n' {
            return Ok(0);
        }

        let mut buf = vec![0u8; 4096];
        let mut end = len;
        while end > 0 {
            let start = end.saturating_sub(buf.len() as u64);
            let chunk = &mut buf[..(end - start) as usize];
            file.seek(SeekFrom::Start(start)).await?;
            file.read_exact(chunk).await?;
            if let Some(i) = chunk.iter().rposition(|&b| b == b'\n') {
                let keep = start + i as u64 + 1;
                file.set_len(keep).await?;
                return Ok(len - keep);
            }
            end = start;
        }
        file.set_len(0).await?;
        Ok(len)
    }
}

#[async_trait]
impl ResultLog for JsonlResultLog {
    async fn append(&self, responses: &[SuggestionResponse]) -> Result<()> {
        if responses.is_empty() {
            return Ok(());
        }

        let mut buf = String::new();
        for response in responses {
            buf.push_str(&serde_json::to_string(response)?);
            buf.push('\n');
        }

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.storage_error("cannot create directory for", e))?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&self.path)
            .await
            .map_err(|e| self.storage_error("cannot open", e))?;
        let dropped = Self::truncate_torn_tail(&mut file)
            .await
            .map_err(|e| self.storage_error("cannot repair", e))?;
        if dropped > 0 {
            warn!("Dropped {} bytes of torn final line in {}", dropped, self.path.display());
        }
        file.seek(SeekFrom::End(0))
            .await
            .map_err(|e| self.storage_error("cannot seek in", e))?;
        file.write_all(buf.as_bytes())
            .await
            .map_err(|e| self.storage_error("cannot append to", e))?;
        file.flush()
            .await
            .map_err(|e| self.storage_error("cannot flush", e))?;

        debug!("Appended {} responses to {}", responses.len(), self.path.display());
        Ok(())
    }

    async fn written_keys(&self) -> Result<HashSet<String>> {
        Ok(self
            .read_lines()
            .await?
            .into_iter()
            .map(|response| response.keyword)
            .collect())
    }

    async fn read_all(&self) -> Result<Vec<SuggestionResponse>> {
        self.read_lines().await
    }
}

/// In-process log, used by tests and dry runs
#[derive(Default)]
pub struct MemoryResultLog {
    entries: Mutex<Vec<SuggestionResponse>>,
}

impl MemoryResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log pre-filled with earlier responses
    pub fn with_entries(entries: Vec<SuggestionResponse>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl ResultLog for MemoryResultLog {
    async fn append(&self, responses: &[SuggestionResponse]) -> Result<()> {
        self.entries.lock().await.extend_from_slice(responses);
        Ok(())
    }

    async fn written_keys(&self) -> Result<HashSet<String>> {
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .map(|response| response.keyword.clone())
            .collect())
    }

    async fn read_all(&self) -> Result<Vec<SuggestionResponse>> {
        Ok(self.entries.lock().await.clone())
    }
}
