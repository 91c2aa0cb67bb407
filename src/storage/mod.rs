//! Durable storage: result logs, trend history and run output files

mod history;
mod result_log;

pub use history::{FsHistoryStore, HistoryStore, MemoryHistoryStore};
pub use result_log::{JsonlResultLog, MemoryResultLog, ResultLog};

use crate::error::{Error, Result};
use serde::Serialize;
use std::path::Path;

async fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            Error::storage(format!("cannot create {}: {}", parent.display(), e))
        })?;
    }
    tokio::fs::write(path, content)
        .await
        .map_err(|e| Error::storage(format!("cannot write {}: {}", path.display(), e)))
}

/// Replace `path` with one line per item
pub async fn write_lines<S: AsRef<str>>(path: &Path, lines: &[S]) -> Result<()> {
    let mut content = String::new();
    for line in lines {
        content.push_str(line.as_ref());
        content.push('\n');
    }
    write_file(path, content.as_bytes()).await
}

/// Replace `path` with pretty-printed JSON
pub async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_vec_pretty(value)?;
    write_file(path, &content).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_write_lines_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/out.txt");
        write_lines(&path, &["one", "two"]).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");

        write_lines::<String>(&path, &[]).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[tokio::test]
    async fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("by_entity.json");
        let mut map = BTreeMap::new();
        map.insert("iphone", vec!["iphone 16"]);
        write_json(&path, &map).await.unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["iphone"][0], "iphone 16");
    }
}
