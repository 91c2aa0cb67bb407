//! Batched, bounded-concurrency fan-out of candidates to the autosuggest backend
//!
//! Candidates are split into fixed-size batches. Inside a batch every
//! candidate is requested through a bounded worker pool; the batch is
//! appended to the result log only once all of its workers are done, so a
//! crash loses at most the batch in flight. Candidates already present in
//! the log are never requested again.

use crate::config::SuggestSettings;
use crate::error::{Error, Result};
use crate::network::Backoff;
use crate::storage::ResultLog;
use crate::suggest::{AutosuggestBackend, Candidate, DataSource, SuggestRequest, SuggestionResponse};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Request parameters shared by every candidate of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub host_language: String,
    pub geo: String,
    pub data_source: DataSource,
    pub caller_id: String,
}

impl RequestContext {
    pub fn request(&self, query: &str) -> SuggestRequest {
        SuggestRequest {
            query: query.to_string(),
            host_language: self.host_language.clone(),
            geo: self.geo.clone(),
            data_source: self.data_source,
            caller_id: self.caller_id.clone(),
        }
    }
}

/// Result of one finished batch
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Zero-based batch number within one `collect` call
    pub index: usize,
    /// Responses appended to the log for this batch
    pub responses: Vec<SuggestionResponse>,
    /// Candidates dropped after exhausting every attempt
    pub failed: Vec<Candidate>,
    pub elapsed: Duration,
}

/// Fan-out tuning
#[derive(Debug, Clone, Copy)]
pub struct FanoutOptions {
    pub batch_size: usize,
    pub concurrency: usize,
    pub request_timeout: Duration,
    pub max_attempts: u32,
    pub retry_initial_delay: Duration,
    pub retry_max_delay: Duration,
}

impl From<&SuggestSettings> for FanoutOptions {
    fn from(settings: &SuggestSettings) -> Self {
        Self {
            batch_size: settings.batch_size.max(1),
            concurrency: settings.concurrency.max(1),
            request_timeout: settings.request_timeout(),
            max_attempts: settings.max_attempts.max(1),
            retry_initial_delay: Duration::from_millis(settings.retry_initial_delay_ms),
            retry_max_delay: Duration::from_millis(settings.retry_max_delay_ms),
        }
    }
}

impl Default for FanoutOptions {
    fn default() -> Self {
        Self::from(&SuggestSettings::default())
    }
}

pub struct BatchRequester {
    backend: Arc<dyn AutosuggestBackend>,
    log: Arc<dyn ResultLog>,
    context: RequestContext,
    options: FanoutOptions,
}

impl BatchRequester {
    pub fn new(
        backend: Arc<dyn AutosuggestBackend>,
        log: Arc<dyn ResultLog>,
        context: RequestContext,
        options: FanoutOptions,
    ) -> Self {
        Self {
            backend,
            log,
            context,
            options,
        }
    }

    pub fn log(&self) -> &Arc<dyn ResultLog> {
        &self.log
    }

    /// Request every candidate that has no logged response yet, one batch at
    /// a time. No new batch starts once `cancel` fires.
    pub fn collect<'a>(
        &'a self,
        candidates: Vec<Candidate>,
        cancel: &'a CancellationToken,
    ) -> BoxStream<'a, Result<BatchOutcome>> {
        let pending = async move {
            let written = self.log.written_keys().await?;
            let total = candidates.len();
            let pending: Vec<Candidate> = candidates
                .into_iter()
                .filter(|c| !written.contains(c.query()))
                .collect();
            if pending.len() < total {
                info!(
                    "Skipping {} of {} candidates already in the result log",
                    total - pending.len(),
                    total
                );
            }
            Ok::<_, Error>(pending)
        };

        let batch_size = self.options.batch_size;
        stream::once(pending)
            .map_ok(move |pending| {
                let batches: Vec<Vec<Candidate>> =
                    pending.chunks(batch_size).map(<[Candidate]>::to_vec).collect();
                let count = batches.len();
                stream::iter(batches.into_iter().enumerate())
                    .take_while(move |_| futures::future::ready(!cancel.is_cancelled()))
                    .then(move |(index, batch)| self.run_batch(index, count, batch))
            })
            .try_flatten()
            .boxed()
    }

    async fn run_batch(
        &self,
        index: usize,
        count: usize,
        batch: Vec<Candidate>,
    ) -> Result<BatchOutcome> {
        let started = Instant::now();
        let size = batch.len();
        debug!("Starting batch {}/{} ({} candidates)", index + 1, count, size);

        let results: Vec<(Candidate, Option<SuggestionResponse>)> = stream::iter(batch)
            .map(|candidate| async move {
                let response = self.fetch(&candidate).await;
                (candidate, response)
            })
            .buffer_unordered(self.options.concurrency)
            .collect()
            .await;

        let mut responses = Vec::with_capacity(results.len());
        let mut failed = Vec::new();
        for (candidate, response) in results {
            match response {
                Some(response) => responses.push(response),
                None => failed.push(candidate),
            }
        }

        self.log.append(&responses).await?;

        let elapsed = started.elapsed();
        info!(
            "Batch {}/{} done: {} responses, {} dropped in {:?}",
            index + 1,
            count,
            responses.len(),
            failed.len(),
            elapsed
        );

        Ok(BatchOutcome {
            index,
            responses,
            failed,
            elapsed,
        })
    }

    /// One candidate with timeout and retry. `None` once attempts run out.
    async fn fetch(&self, candidate: &Candidate) -> Option<SuggestionResponse> {
        let request = self.context.request(candidate.query());
        let mut backoff = Backoff::new(
            self.options.retry_initial_delay,
            self.options.retry_max_delay,
            self.options.max_attempts,
        );

        loop {
            let error = match timeout(self.options.request_timeout, self.backend.suggest(&request))
                .await
            {
                Ok(Ok(response)) => return Some(response),
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!("timed out after {:?}", self.options.request_timeout),
            };

            if backoff.wait().await.is_err() {
                warn!(
                    "Dropping {:?} from {} after {} attempts: {}",
                    candidate.query(),
                    self.backend.name(),
                    backoff.attempts(),
                    error
                );
                return None;
            }
            debug!("Retrying {:?}: {}", candidate.query(), error);
        }
    }
}
