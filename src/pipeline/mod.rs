//! One trend discovery run, from settings to published keyword files
//!
//! [`TrendRun::execute`] is the only place where failures are turned into a
//! report; everything below it propagates errors with `?`.

use crate::completion::{
    Completion, CompletionPoller, CompletionStatus, HttpCollectionPublisher, HttpEnrichmentStore,
    PollerOptions,
};
use crate::config::{RunMode, Settings};
use crate::error::{Error, Result};
use crate::fanout::{BatchRequester, FanoutOptions, RequestContext};
use crate::frontier::FrontierController;
use crate::lang::{self, DataFiles, VocabularyProvider};
use crate::metrics::{
    CompletionStats, LogNotifier, Notifier, RunOutcome, RunReport, RunStats, TrendStats,
    WebhookNotifier,
};
use crate::network::HttpClient;
use crate::storage::{self, FsHistoryStore, HistoryStore, JsonlResultLog, ResultLog};
use crate::suggest::{AutosuggestBackend, SuggestApi};
use crate::trend::{Deduplicator, TrendExtractor};
use chrono::{NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Job id of a run started at `at`: `YYYYMMDDHH`
pub fn job_id(at: NaiveDateTime) -> String {
    at.format("%Y%m%d%H").to_string()
}

/// Files of one run, under `<output_dir>/<mode>/<service>/<lang>/`
#[derive(Debug, Clone)]
pub struct RunPaths {
    dir: PathBuf,
    job_id: String,
}

impl RunPaths {
    pub fn new(settings: &Settings, job_id: &str) -> Self {
        let dir = settings
            .general
            .output_dir
            .join(settings.general.mode.as_str())
            .join(settings.general.service.as_str())
            .join(&settings.general.language);
        Self {
            dir,
            job_id: job_id.to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}{}", self.job_id, suffix))
    }

    pub fn result_log(&self) -> PathBuf {
        self.file(".jsonl")
    }

    pub fn trend_keywords(&self) -> PathBuf {
        self.file("_trend_keywords.txt")
    }

    pub fn new_trend_keywords(&self) -> PathBuf {
        self.file("_trend_keywords_new.txt")
    }

    pub fn rejected_trend_keywords(&self) -> PathBuf {
        self.file("_except_for_valid_trend_keywords.txt")
    }

    pub fn trend_keywords_by_entity(&self) -> PathBuf {
        self.file("_trend_keywords_by_entity.json")
    }

    pub fn serp_keywords(&self) -> PathBuf {
        self.file("_serp_keywords.json")
    }
}

enum RunEnd {
    Finished,
    Cancelled,
}

/// A configured run and its collaborators
pub struct TrendRun {
    settings: Arc<Settings>,
    job_id: String,
    job_date: NaiveDate,
    backend: Arc<dyn AutosuggestBackend>,
    history: Arc<dyn HistoryStore>,
    notifier: Arc<dyn Notifier>,
    completion: Option<CompletionPoller>,
}

impl TrendRun {
    pub fn new(
        settings: Settings,
        backend: Arc<dyn AutosuggestBackend>,
        history: Arc<dyn HistoryStore>,
        notifier: Arc<dyn Notifier>,
        started_at: NaiveDateTime,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            job_id: job_id(started_at),
            job_date: started_at.date(),
            backend,
            history,
            notifier,
            completion: None,
        }
    }

    /// Run wired to the HTTP backends named in `settings`
    pub fn from_settings(settings: Settings, client: HttpClient, started_at: NaiveDateTime) -> Self {
        let backend = Arc::new(SuggestApi::new(
            client.clone(),
            settings.suggest.endpoint.clone(),
            settings.suggest.request_timeout(),
        ));
        let history = Arc::new(FsHistoryStore::new(settings.general.history_dir.clone()));
        let notifier: Arc<dyn Notifier> = match &settings.notify.webhook_url {
            Some(url) => Arc::new(WebhookNotifier::new(client.clone(), url.clone())),
            None => Arc::new(LogNotifier),
        };

        let completion = settings.completion.enabled.then(|| {
            let publisher = HttpCollectionPublisher::new(
                client.clone(),
                settings.completion.publish_endpoint.clone(),
                settings.completion.usage_id.clone(),
                settings.completion.domain.clone(),
            );
            let store = HttpEnrichmentStore::new(client, settings.completion.store_endpoint.clone());
            CompletionPoller::new(
                Arc::new(publisher),
                Arc::new(store),
                PollerOptions::for_run(&settings.completion, started_at),
            )
        });

        let run = Self::new(settings, backend, history, notifier, started_at);
        match completion {
            Some(poller) => run.with_completion(poller),
            None => run,
        }
    }

    /// Enrich new trend keywords once they are written
    pub fn with_completion(mut self, poller: CompletionPoller) -> Self {
        self.completion = Some(poller);
        self
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn paths(&self) -> RunPaths {
        RunPaths::new(&self.settings, &self.job_id)
    }

    /// Run to completion, report the outcome to the notifier and return it
    pub async fn execute(&self, cancel: &CancellationToken) -> RunReport {
        let started = Instant::now();
        let mut stats = RunStats::default();

        let outcome = match self.run(cancel, &mut stats).await {
            Ok(RunEnd::Finished) => RunOutcome::Succeeded,
            Ok(RunEnd::Cancelled) => RunOutcome::Cancelled,
            Err(e) => {
                error!("Run {} failed: {}", self.job_id, e);
                RunOutcome::Failed(e.to_string())
            }
        };

        let general = &self.settings.general;
        let report = RunReport {
            job_id: self.job_id.clone(),
            language: general.language.clone(),
            service: general.service.to_string(),
            mode: general.mode.as_str().to_string(),
            elapsed: started.elapsed(),
            outcome,
            stats,
        };

        if let Err(e) = self.notifier.notify(&report).await {
            warn!("Could not deliver report for {}: {}", self.job_id, e);
        }
        report
    }

    async fn run(&self, cancel: &CancellationToken, stats: &mut RunStats) -> Result<RunEnd> {
        let settings = &self.settings;
        let profile = lang::profile(&settings.general.language)?;
        let paths = self.paths();
        info!(
            "Starting {} run {} for {}/{}",
            settings.general.mode.as_str(),
            self.job_id,
            settings.general.service,
            profile.code()
        );

        let vocabulary = Arc::new(VocabularyProvider::new(DataFiles::new(
            settings.general.data_dir.clone(),
        )));
        let log: Arc<dyn ResultLog> = Arc::new(JsonlResultLog::new(paths.result_log()));
        let context = RequestContext {
            host_language: profile.host_language().to_string(),
            geo: profile.geo().to_string(),
            data_source: settings.general.service,
            caller_id: settings.general.caller_id.clone(),
        };
        let requester = BatchRequester::new(
            Arc::clone(&self.backend),
            log,
            context,
            FanoutOptions::from(&settings.suggest),
        );

        let history = self
            .history
            .window(profile.code(), self.job_date, settings.trend.history_days)
            .await?;
        let mut dedup = Deduplicator::with_history(&history);

        let max_tokens = settings.trend.max_tokens;
        let (plan, mut extractor) = match settings.general.mode {
            RunMode::Basic => (
                profile.basic_plan(&settings.frontier),
                TrendExtractor::new(Arc::clone(&profile), max_tokens),
            ),
            RunMode::Target => {
                let topics = self.topics().await?;
                info!("Targeting {} topics", topics.len());
                (
                    profile.target_plan(&topics, &settings.frontier),
                    TrendExtractor::new(Arc::clone(&profile), max_tokens).anchored(),
                )
            }
        };

        let controller = FrontierController::new(Arc::clone(&profile), vocabulary, requester);
        let frontier = controller.run(&plan, cancel, &mut extractor).await?;
        stats.stages = frontier.stages;
        if frontier.cancelled {
            warn!("Run {} cancelled during the search", self.job_id);
            return Ok(RunEnd::Cancelled);
        }

        let output = extractor.finish(&mut dedup);
        stats.trend = TrendStats {
            total: output.accepted.len(),
            new: output.new.len(),
            rejected: output.rejected.len(),
        };
        storage::write_lines(&paths.trend_keywords(), &output.accepted).await?;
        storage::write_lines(&paths.new_trend_keywords(), &output.new).await?;
        storage::write_lines(&paths.rejected_trend_keywords(), &output.rejected).await?;
        if settings.general.mode == RunMode::Target {
            storage::write_json(&paths.trend_keywords_by_entity(), &output.by_entity).await?;
        }
        info!(
            "Run {}: {} trend keywords, {} new, written to {}",
            self.job_id,
            output.accepted.len(),
            output.new.len(),
            paths.dir().display()
        );

        if let Some(poller) = &self.completion {
            if !output.new.is_empty() {
                let completion = poller.run(&output.new, cancel).await?;
                stats.completion = Some(completion_stats(&completion));
                storage::write_json(&paths.serp_keywords(), &completion).await?;
                if completion.status == CompletionStatus::Cancelled {
                    return Ok(RunEnd::Cancelled);
                }
            }
        }

        Ok(RunEnd::Finished)
    }

    async fn topics(&self) -> Result<Vec<String>> {
        let path = self
            .settings
            .general
            .topics_file
            .as_ref()
            .ok_or_else(|| Error::config("target mode requires general.topics_file"))?;
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::config(format!("cannot read topics {}: {}", path.display(), e)))?;
        let topics: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        if topics.is_empty() {
            return Err(Error::config(format!("no topics in {}", path.display())));
        }
        Ok(topics)
    }
}

fn completion_stats(completion: &Completion) -> CompletionStats {
    CompletionStats {
        requested: completion.results.len(),
        resolved: completion.resolved(),
        status: completion.status.as_str().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{CollectionPublisher, EnrichmentRow, EnrichmentStore};
    use crate::storage::MemoryHistoryStore;
    use crate::suggest::{SuggestRequest, Suggestion, SuggestionResponse};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Answers known queries from a table, everything else with no suggestions
    struct TableBackend {
        table: HashMap<String, Vec<Suggestion>>,
        calls: Mutex<usize>,
    }

    impl TableBackend {
        fn new(entries: Vec<(&str, Vec<Suggestion>)>) -> Self {
            Self {
                table: entries
                    .into_iter()
                    .map(|(q, s)| (q.to_string(), s))
                    .collect(),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl AutosuggestBackend for TableBackend {
        fn name(&self) -> &str {
            "table"
        }

        async fn suggest(&self, request: &SuggestRequest) -> Result<SuggestionResponse> {
            *self.calls.lock().unwrap() += 1;
            let suggestions = self.table.get(&request.query).cloned().unwrap_or_default();
            Ok(SuggestionResponse::new(request.query.clone(), suggestions))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        reports: Mutex<Vec<RunReport>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, report: &RunReport) -> Result<()> {
            self.reports.lock().unwrap().push(report.clone());
            Ok(())
        }
    }

    struct NullPublisher;

    #[async_trait]
    impl CollectionPublisher for NullPublisher {
        async fn publish(&self, _keyword: &str) -> Result<()> {
            Ok(())
        }
    }

    /// Every keyword is already enriched
    struct EagerStore;

    #[async_trait]
    impl EnrichmentStore for EagerStore {
        async fn lookup(
            &self,
            keywords: &[String],
            _collected_since: Option<NaiveDateTime>,
        ) -> Result<Vec<EnrichmentRow>> {
            Ok(keywords
                .iter()
                .map(|k| EnrichmentRow {
                    keyword: k.clone(),
                    hash: format!("h-{}", k),
                    json: format!("serp/{}.json", k),
                    collected_at: None,
                })
                .collect())
        }
    }

    fn started_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap()
    }

    fn settings(dir: &Path, language: &str) -> Settings {
        let mut settings = Settings::default();
        settings.general.language = language.to_string();
        settings.general.output_dir = dir.join("result");
        settings.general.data_dir = dir.join("lang");
        settings.suggest.concurrency = 4;
        settings.suggest.retry_initial_delay_ms = 1;
        settings.suggest.retry_max_delay_ms = 1;
        settings
    }

    fn basic_backend() -> TableBackend {
        let mut a = vec![
            Suggestion::new("apple event", 0, vec![3]),
            Suggestion::new("amazon  prime", 46, vec![3]),
        ];
        for i in 0..5 {
            a.push(Suggestion::new(format!("a{}", i), 0, vec![512]));
        }
        let z = vec![Suggestion::new("zoom", 0, vec![512])];
        TableBackend::new(vec![("a", a), ("z", z)])
    }

    #[test]
    fn test_job_id_format() {
        assert_eq!(job_id(started_at()), "2024031012");
    }

    #[tokio::test]
    async fn test_basic_run_writes_trend_files() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(basic_backend());
        let yesterday = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let history = Arc::new(MemoryHistoryStore::new().with_day(yesterday, &["amazonprime"]));
        let notifier = Arc::new(RecordingNotifier::default());

        let run = TrendRun::new(
            settings(dir.path(), "en"),
            backend.clone(),
            history,
            notifier.clone(),
            started_at(),
        )
        .with_completion(CompletionPoller::new(
            Arc::new(NullPublisher),
            Arc::new(EagerStore),
            PollerOptions::default(),
        ));

        let report = run.execute(&CancellationToken::new()).await;
        assert!(report.is_success(), "{:?}", report.outcome);
        assert_eq!(report.job_id, "2024031012");

        // 36 rank-1 candidates, then "a" followed by the 36 rank-2 extensions
        assert_eq!(backend.calls(), 72);
        assert_eq!(report.stats.total_requested(), 72);
        assert_eq!(report.stats.stages[0].survivors, 1);
        assert_eq!(
            report.stats.trend,
            TrendStats {
                total: 2,
                new: 1,
                rejected: 0,
            }
        );

        let paths = run.paths();
        assert!(paths.dir().ends_with("basic/google/en"));
        assert_eq!(
            std::fs::read_to_string(paths.trend_keywords()).unwrap(),
            "apple event\namazon  prime\n"
        );
        assert_eq!(
            std::fs::read_to_string(paths.new_trend_keywords()).unwrap(),
            "apple event\n"
        );
        assert_eq!(std::fs::read_to_string(paths.rejected_trend_keywords()).unwrap(), "");
        assert!(!paths.trend_keywords_by_entity().exists());

        let completion = report.stats.completion.as_ref().unwrap();
        assert_eq!(completion.resolved, 1);
        assert_eq!(completion.status, "complete");
        assert!(paths.serp_keywords().exists());

        let log = JsonlResultLog::new(paths.result_log());
        assert_eq!(log.written_keys().await.unwrap().len(), 72);
        assert_eq!(notifier.reports.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rerun_resumes_from_log() {
        let dir = tempfile::tempdir().unwrap();
        let first = Arc::new(basic_backend());
        let run = TrendRun::new(
            settings(dir.path(), "en"),
            first.clone(),
            Arc::new(MemoryHistoryStore::new()),
            Arc::new(LogNotifier),
            started_at(),
        );
        assert!(run.execute(&CancellationToken::new()).await.is_success());

        let second = Arc::new(basic_backend());
        let rerun = TrendRun::new(
            settings(dir.path(), "en"),
            second.clone(),
            Arc::new(MemoryHistoryStore::new()),
            Arc::new(LogNotifier),
            started_at(),
        );
        let report = rerun.execute(&CancellationToken::new()).await;
        assert!(report.is_success());
        assert_eq!(second.calls(), 0);
        assert_eq!(report.stats.trend.total, 2);
        assert_eq!(report.stats.stages[0].resumed, 36);
    }

    #[tokio::test]
    async fn test_target_run_groups_by_entity() {
        let dir = tempfile::tempdir().unwrap();
        let topics = dir.path().join("topics.txt");
        std::fs::write(&topics, "iphone\n\n").unwrap();
        let mut settings = settings(dir.path(), "en");
        settings.general.mode = RunMode::Target;
        settings.general.topics_file = Some(topics);

        let mut r = vec![Suggestion::new("iphone release date", 0, vec![3])];
        for i in 0..7 {
            r.push(Suggestion::new(format!("iphone r{}", i), 0, vec![512]));
        }
        let backend = Arc::new(TableBackend::new(vec![("iphone r", r)]));

        let run = TrendRun::new(
            settings,
            backend,
            Arc::new(MemoryHistoryStore::new()),
            Arc::new(LogNotifier),
            started_at(),
        );
        let report = run.execute(&CancellationToken::new()).await;
        assert!(report.is_success(), "{:?}", report.outcome);

        // "iphone r" met the threshold, so its 26 two-letter initials ran
        let initials = report.stats.stages.last().unwrap();
        assert_eq!(initials.rank, "initials");
        assert_eq!(initials.candidates, 26);

        let by_entity: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(run.paths().trend_keywords_by_entity()).unwrap(),
        )
        .unwrap();
        assert_eq!(
            by_entity,
            serde_json::json!({"iphone": {"iphone r": ["iphone release date"]}})
        );
    }

    #[tokio::test]
    async fn test_failures_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let run = TrendRun::new(
            settings(dir.path(), "xx"),
            Arc::new(TableBackend::new(Vec::new())),
            Arc::new(MemoryHistoryStore::new()),
            notifier.clone(),
            started_at(),
        );
        let report = run.execute(&CancellationToken::new()).await;
        match &report.outcome {
            RunOutcome::Failed(msg) => assert!(msg.contains("configuration error")),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(!notifier.reports.lock().unwrap()[0].is_success());
    }

    #[tokio::test]
    async fn test_cancelled_run_writes_no_trend_files() {
        let dir = tempfile::tempdir().unwrap();
        let run = TrendRun::new(
            settings(dir.path(), "en"),
            Arc::new(basic_backend()),
            Arc::new(MemoryHistoryStore::new()),
            Arc::new(LogNotifier),
            started_at(),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();
        let report = run.execute(&cancel).await;
        assert_eq!(report.outcome, RunOutcome::Cancelled);
        assert!(!run.paths().trend_keywords().exists());
    }
}
