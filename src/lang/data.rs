//! Line-oriented vocabulary data files

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Root of the per-language data directory (`<root>/<lang>/<file>`)
#[derive(Debug, Clone)]
pub struct DataFiles {
    root: PathBuf,
}

impl DataFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Non-empty trimmed lines of `<root>/<lang>/<name>`.
    /// A missing or unreadable file is a configuration error.
    pub fn lines(&self, lang: &str, name: &str) -> Result<Vec<String>> {
        let path = self.root.join(lang).join(name);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::config(format!("vocabulary file {} unavailable: {}", path.display(), e))
        })?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}
