//! Downstream enrichment of trend keywords
//!
//! A collection request is published for every keyword, then the enrichment
//! store is polled until each keyword has a row. Once few keywords remain
//! the stragglers are re-requested and polling slows down.

mod http;

pub use http::{HttpCollectionPublisher, HttpEnrichmentStore};

use crate::config::CompletionSettings;
use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Fire-and-forget request to collect enrichment for one keyword
#[async_trait]
pub trait CollectionPublisher: Send + Sync {
    async fn publish(&self, keyword: &str) -> Result<()>;
}

/// One stored enrichment result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentRow {
    pub keyword: String,
    /// Content hash of the collected document
    pub hash: String,
    /// Locator of the collected document
    pub json: String,
    #[serde(default)]
    pub collected_at: Option<String>,
}

/// Store holding collected enrichment rows
#[async_trait]
pub trait EnrichmentStore: Send + Sync {
    /// Rows for any of `keywords`, optionally only those collected at or
    /// after `collected_since`
    async fn lookup(
        &self,
        keywords: &[String],
        collected_since: Option<NaiveDateTime>,
    ) -> Result<Vec<EnrichmentRow>>;
}

/// Enrichment found for a keyword
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SerpResult {
    pub hash: String,
    pub locator: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    /// Every keyword resolved
    Complete,
    /// The deadline passed first
    TimedOut,
    /// Cancelled before every keyword resolved
    Cancelled,
}

impl CompletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::Complete => "complete",
            CompletionStatus::TimedOut => "timed_out",
            CompletionStatus::Cancelled => "cancelled",
        }
    }
}

/// Outcome of a poll run: every requested keyword, resolved or not
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub results: BTreeMap<String, Option<SerpResult>>,
    pub status: CompletionStatus,
}

impl Completion {
    pub fn is_complete(&self) -> bool {
        self.status == CompletionStatus::Complete
    }

    pub fn resolved(&self) -> usize {
        self.results.values().filter(|r| r.is_some()).count()
    }

    pub fn missing(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|(_, r)| r.is_none())
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct PollerOptions {
    pub poll_interval: Duration,
    pub tail_interval: Duration,
    /// Missing-set size at or below which stragglers are re-requested
    pub tail_threshold: usize,
    pub deadline: Option<Duration>,
    pub collected_since: Option<NaiveDateTime>,
}

impl From<&CompletionSettings> for PollerOptions {
    fn from(settings: &CompletionSettings) -> Self {
        Self {
            poll_interval: Duration::from_secs(settings.poll_interval_secs),
            tail_interval: Duration::from_secs(settings.tail_interval_secs),
            tail_threshold: settings.tail_threshold,
            deadline: settings.deadline_secs.map(Duration::from_secs),
            collected_since: None,
        }
    }
}

impl PollerOptions {
    /// Options for a job started at `started_at`
    pub fn for_run(settings: &CompletionSettings, started_at: NaiveDateTime) -> Self {
        Self {
            collected_since: settings.fresh_only.then_some(started_at),
            ..Self::from(settings)
        }
    }
}

impl Default for PollerOptions {
    fn default() -> Self {
        Self::from(&CompletionSettings::default())
    }
}

/// Drives the request and poll phases for one keyword set
pub struct CompletionPoller {
    publisher: Arc<dyn CollectionPublisher>,
    store: Arc<dyn EnrichmentStore>,
    options: PollerOptions,
}

impl CompletionPoller {
    pub fn new(
        publisher: Arc<dyn CollectionPublisher>,
        store: Arc<dyn EnrichmentStore>,
        options: PollerOptions,
    ) -> Self {
        Self {
            publisher,
            store,
            options,
        }
    }

    /// Request enrichment for `keywords` and poll until all resolve, the
    /// deadline passes or `cancel` fires.
    ///
    /// Keywords are matched case-insensitively; results are keyed by the
    /// first spelling given. Only non-transient store errors are returned.
    pub async fn run(&self, keywords: &[String], cancel: &CancellationToken) -> Result<Completion> {
        // lower-cased key -> original spelling
        let mut targets: Vec<(String, String)> = Vec::new();
        let mut known = HashSet::new();
        for keyword in keywords {
            let key = keyword.to_lowercase();
            if known.insert(key.clone()) {
                targets.push((key, keyword.clone()));
            }
        }

        let mut found: HashMap<String, SerpResult> = HashMap::new();
        if cancel.is_cancelled() {
            return Ok(self.finish(&targets, found, CompletionStatus::Cancelled));
        }

        let deadline = self.options.deadline.map(|d| Instant::now() + d);
        info!("Requesting enrichment for {} keywords", targets.len());
        self.publish_all(targets.iter().map(|(_, k)| k.as_str())).await;

        let status = loop {
            let missing: Vec<String> = targets
                .iter()
                .filter(|(key, _)| !found.contains_key(key))
                .map(|(key, _)| key.clone())
                .collect();

            match self
                .store
                .lookup(&missing, self.options.collected_since)
                .await
            {
                Ok(rows) => {
                    for row in rows {
                        let key = row.keyword.to_lowercase();
                        if known.contains(&key) {
                            found.entry(key).or_insert(SerpResult {
                                hash: row.hash,
                                locator: row.json,
                            });
                        }
                    }
                }
                Err(e) if e.is_transient() => warn!("Enrichment lookup failed: {}", e),
                Err(e) => return Err(e),
            }

            let missing: Vec<&(String, String)> = targets
                .iter()
                .filter(|(key, _)| !found.contains_key(key))
                .collect();
            info!("{}/{} keywords enriched", found.len(), targets.len());
            if missing.is_empty() {
                break CompletionStatus::Complete;
            }

            let wait = if missing.len() <= self.options.tail_threshold {
                self.publish_all(missing.iter().map(|(_, k)| k.as_str()))
                    .await;
                self.options.tail_interval
            } else {
                self.options.poll_interval
            };

            let mut wake = Instant::now() + wait;
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    break CompletionStatus::TimedOut;
                }
                wake = wake.min(deadline);
            }

            tokio::select! {
                _ = cancel.cancelled() => break CompletionStatus::Cancelled,
                _ = sleep_until(wake) => {}
            }
        };

        Ok(self.finish(&targets, found, status))
    }

    /// Publishing is at-least-once; failures are logged and left to the
    /// straggler re-requests.
    async fn publish_all<'a>(&self, keywords: impl Iterator<Item = &'a str>) {
        let mut sent = 0usize;
        for keyword in keywords {
            match self.publisher.publish(keyword).await {
                Ok(()) => sent += 1,
                Err(e) => warn!("Collection request for {:?} failed: {}", keyword, e),
            }
        }
        debug!("Published {} collection requests", sent);
    }

    fn finish(
        &self,
        targets: &[(String, String)],
        mut found: HashMap<String, SerpResult>,
        status: CompletionStatus,
    ) -> Completion {
        let results = targets
            .iter()
            .map(|(key, original)| (original.clone(), found.remove(key)))
            .collect();
        Completion { results, status }
    }
}
