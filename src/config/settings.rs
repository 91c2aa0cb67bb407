//! Settings structures for trend-finder configuration

use crate::error::{Error, Result};
use crate::suggest::DataSource;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main settings structure matching settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub outgoing: OutgoingSettings,
    pub suggest: SuggestSettings,
    pub frontier: FrontierSettings,
    pub trend: TrendSettings,
    pub completion: CompletionSettings,
    pub notify: NotifySettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables (TREND_FINDER_* prefix)
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("TREND_FINDER_LANGUAGE") {
            self.general.language = val;
        }
        if let Ok(val) = std::env::var("TREND_FINDER_SERVICE") {
            match val.to_lowercase().as_str() {
                "google" => self.general.service = DataSource::Google,
                "youtube" => self.general.service = DataSource::Youtube,
                _ => {}
            }
        }
        if let Ok(val) = std::env::var("TREND_FINDER_MODE") {
            match val.to_lowercase().as_str() {
                "basic" => self.general.mode = RunMode::Basic,
                "target" => self.general.mode = RunMode::Target,
                _ => {}
            }
        }
        if let Ok(val) = std::env::var("TREND_FINDER_SUGGEST_ENDPOINT") {
            self.suggest.endpoint = val;
        }
        if let Ok(val) = std::env::var("TREND_FINDER_CONCURRENCY") {
            if let Ok(concurrency) = val.parse() {
                self.suggest.concurrency = concurrency;
            }
        }
        if let Ok(val) = std::env::var("TREND_FINDER_OUTPUT_DIR") {
            self.general.output_dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("TREND_FINDER_WEBHOOK_URL") {
            self.notify.webhook_url = Some(val);
        }
    }

    /// Reject settings that would make a run meaningless
    pub fn validate(&self) -> Result<()> {
        if self.suggest.batch_size == 0 {
            return Err(Error::config("suggest.batch_size must be positive"));
        }
        if self.suggest.concurrency == 0 {
            return Err(Error::config("suggest.concurrency must be positive"));
        }
        if self.suggest.max_attempts == 0 {
            return Err(Error::config("suggest.max_attempts must be positive"));
        }
        url::Url::parse(&self.suggest.endpoint).map_err(|e| {
            Error::config(format!(
                "invalid suggest endpoint {}: {}",
                self.suggest.endpoint, e
            ))
        })?;
        if self.completion.enabled {
            for endpoint in [
                &self.completion.publish_endpoint,
                &self.completion.store_endpoint,
            ] {
                url::Url::parse(endpoint).map_err(|e| {
                    Error::config(format!("invalid completion endpoint {}: {}", endpoint, e))
                })?;
            }
        }
        if self.general.mode == RunMode::Target && self.general.topics_file.is_none() {
            return Err(Error::config("target mode requires general.topics_file"));
        }
        Ok(())
    }
}

/// Which kind of run to perform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Blind enumeration from the empty prefix
    #[default]
    Basic,
    /// Enumeration anchored on a list of base keywords
    Target,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Basic => "basic",
            RunMode::Target => "target",
        }
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Target language code (ko, ja, en)
    pub language: String,
    /// Suggestion source
    pub service: DataSource,
    /// Run mode
    pub mode: RunMode,
    /// Directory holding vocabulary data files
    pub data_dir: PathBuf,
    /// Directory receiving run results
    pub output_dir: PathBuf,
    /// Root of previously published trend keyword files
    pub history_dir: PathBuf,
    /// Line file of base keywords for target mode
    pub topics_file: Option<PathBuf>,
    /// Identifier sent to backends with every request
    pub caller_id: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            service: DataSource::Google,
            mode: RunMode::Basic,
            data_dir: PathBuf::from("./data/lang"),
            output_dir: PathBuf::from("./data/result"),
            history_dir: PathBuf::from("./data/history"),
            topics_file: None,
            caller_id: "trend-finder".to_string(),
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Pool max size
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
    /// Extra headers to send
    pub extra_headers: HashMap<String, String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 20.0,
            pool_maxsize: 100,
            verify_ssl: true,
            proxies: ProxySettings::default(),
            extra_headers: HashMap::new(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Autosuggest backend and fan-out settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestSettings {
    /// Suggestion API endpoint
    pub endpoint: String,
    /// Per-request timeout in seconds
    pub request_timeout: f64,
    /// Attempts per candidate before it is dropped
    pub max_attempts: u32,
    /// First retry delay in milliseconds
    pub retry_initial_delay_ms: u64,
    /// Upper bound for the retry delay in milliseconds
    pub retry_max_delay_ms: u64,
    /// Candidates per persisted batch
    pub batch_size: usize,
    /// Concurrent requests within a batch
    pub concurrency: usize,
}

impl SuggestSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout)
    }
}

impl Default for SuggestSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/api/suggest/v2/suggestions".to_string(),
            request_timeout: 20.0,
            max_attempts: 10,
            retry_initial_delay_ms: 200,
            retry_max_delay_ms: 5_000,
            batch_size: 10_000,
            concurrency: 100,
        }
    }
}

/// Frontier pruning settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontierSettings {
    /// Valid-suggestion count needed to expand a basic-mode candidate
    pub basic_threshold: usize,
    /// Valid-suggestion count needed to expand a target-mode initial
    pub target_threshold: usize,
    /// Only count suggestions that extend the query itself
    pub require_query_prefix: bool,
}

impl Default for FrontierSettings {
    fn default() -> Self {
        Self {
            basic_threshold: 6,
            target_threshold: 8,
            require_query_prefix: true,
        }
    }
}

/// Trend keyword extraction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendSettings {
    /// Days of history a new keyword is checked against
    pub history_days: u32,
    /// Maximum whitespace-separated tokens of an accepted keyword
    pub max_tokens: usize,
}

impl Default for TrendSettings {
    fn default() -> Self {
        Self {
            history_days: 7,
            max_tokens: 20,
        }
    }
}

/// SERP enrichment settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    /// Request SERP enrichment for new trend keywords
    pub enabled: bool,
    /// Queue gateway receiving collection requests
    pub publish_endpoint: String,
    /// Lookup endpoint of the enrichment store
    pub store_endpoint: String,
    /// Sleep between polls in seconds
    pub poll_interval_secs: u64,
    /// Sleep between polls once the missing set is small
    pub tail_interval_secs: u64,
    /// Missing-set size at or below which stragglers are re-requested
    pub tail_threshold: usize,
    /// Optional wall-clock bound for the whole poll phase
    pub deadline_secs: Option<u64>,
    /// Accept only SERP results collected after the job started
    pub fresh_only: bool,
    /// Tag attached to collection requests
    pub usage_id: String,
    /// Domain attached to collection requests
    pub domain: String,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            publish_endpoint: "http://localhost:8081/queue/serp-download".to_string(),
            store_endpoint: "http://localhost:8082/serp/history".to_string(),
            poll_interval_secs: 300,
            tail_interval_secs: 420,
            tail_threshold: 200,
            deadline_secs: None,
            fresh_only: false,
            usage_id: "intent".to_string(),
            domain: "issue_keyword".to_string(),
        }
    }
}

/// Notification settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifySettings {
    /// Chat webhook receiving run reports
    pub webhook_url: Option<String>,
}
