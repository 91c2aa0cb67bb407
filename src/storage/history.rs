//! Trend keywords published by earlier runs

use crate::error::{Error, Result};
use crate::suggest::DataSource;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const TREND_FILE_SUFFIX: &str = "_trend_keywords.txt";

/// Source of previously emitted trend keywords
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Trend keywords emitted on one day for one language, across all sources
    async fn day(&self, lang: &str, date: NaiveDate) -> Result<Vec<String>>;

    /// Keywords of the `days` days strictly before `today`, most recent day
    /// first, without exact duplicates
    async fn window(&self, lang: &str, today: NaiveDate, days: u32) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut keywords = Vec::new();
        for offset in 1..=i64::from(days) {
            let date = today - Duration::days(offset);
            for keyword in self.day(lang, date).await? {
                if seen.insert(keyword.clone()) {
                    keywords.push(keyword);
                }
            }
        }
        info!(
            "Loaded {} historical trend keywords for {} ({} days before {})",
            keywords.len(),
            lang,
            days,
            today
        );
        Ok(keywords)
    }
}

/// Directory tree `<root>/<lang>/<source>/<yyyy>/<yyyymm>/<yyyymmdd>/<job>/*_trend_keywords.txt`
pub struct FsHistoryStore {
    root: PathBuf,
}

impl FsHistoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Folder holding one day's job directories
    pub fn day_dir(&self, lang: &str, source: DataSource, date: NaiveDate) -> PathBuf {
        self.root
            .join(lang)
            .join(source.as_str())
            .join(date.format("%Y").to_string())
            .join(date.format("%Y%m").to_string())
            .join(date.format("%Y%m%d").to_string())
    }

    async fn trend_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut jobs = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
            Err(e) => return Err(Error::storage(format!("cannot list {}: {}", dir.display(), e))),
        };

        while let Some(job) = jobs.next_entry().await? {
            if !job.file_type().await?.is_dir() {
                continue;
            }
            let mut entries = tokio::fs::read_dir(job.path()).await?;
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name();
                if name.to_string_lossy().ends_with(TREND_FILE_SUFFIX) {
                    files.push(entry.path());
                }
            }
        }
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl HistoryStore for FsHistoryStore {
    async fn day(&self, lang: &str, date: NaiveDate) -> Result<Vec<String>> {
        let mut keywords = Vec::new();
        for source in DataSource::all() {
            for file in Self::trend_files(&self.day_dir(lang, source, date)).await? {
                let content = tokio::fs::read_to_string(&file).await.map_err(|e| {
                    Error::storage(format!("cannot read {}: {}", file.display(), e))
                })?;
                keywords.extend(
                    content
                        .lines()
                        .map(str::trim)
                        .filter(|line| !line.is_empty())
                        .map(str::to_string),
                );
                debug!("Read history file {}", file.display());
            }
        }
        Ok(keywords)
    }
}

/// Fixed history keyed by date
#[derive(Default)]
pub struct MemoryHistoryStore {
    days: HashMap<NaiveDate, Vec<String>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_day(mut self, date: NaiveDate, keywords: &[&str]) -> Self {
        self.days
            .entry(date)
            .or_default()
            .extend(keywords.iter().map(|k| k.to_string()));
        self
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn day(&self, _lang: &str, date: NaiveDate) -> Result<Vec<String>> {
        Ok(self.days.get(&date).cloned().unwrap_or_default())
    }
}
