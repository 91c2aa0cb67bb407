//! Run statistics and reporting
//!
//! Tracks per-rank request counts, valid-count histograms and trend totals,
//! and hands a [`RunReport`] to a [`Notifier`] once the run ends.

mod notify;

pub use notify::{LogNotifier, Notifier, WebhookNotifier};

use crate::lang::Rank;
use serde::Serialize;
use std::fmt::Write as _;
use std::time::Duration;

/// Histogram buckets: counts 0..=9, then 10 and above
pub const HISTOGRAM_BUCKETS: usize = 11;

/// Statistics of one frontier stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankStats {
    pub rank: String,
    /// Candidates generated for the stage
    pub candidates: usize,
    /// Candidates answered from an earlier, interrupted run
    pub resumed: usize,
    /// Candidates sent to the backend
    pub requested: usize,
    /// Candidates dropped after exhausting retries
    pub failed: usize,
    /// Candidates that met the threshold of the stage pruned from this one
    pub survivors: usize,
    /// Number of candidates per counted-valid-suggestion bucket
    pub histogram: [usize; HISTOGRAM_BUCKETS],
}

impl RankStats {
    pub fn new(rank: Rank, candidates: usize) -> Self {
        Self {
            rank: rank.to_string(),
            candidates,
            resumed: 0,
            requested: 0,
            failed: 0,
            survivors: 0,
            histogram: [0; HISTOGRAM_BUCKETS],
        }
    }

    /// Record the counted valid suggestions of one candidate
    pub fn record_count(&mut self, count: usize) {
        let bucket = count.min(HISTOGRAM_BUCKETS - 1);
        self.histogram[bucket] += 1;
    }

    /// Candidates whose count is at least `threshold`, read off the histogram
    pub fn at_least(&self, threshold: usize) -> usize {
        if threshold >= HISTOGRAM_BUCKETS {
            return self.histogram[HISTOGRAM_BUCKETS - 1];
        }
        self.histogram[threshold..].iter().sum()
    }
}

/// Counters of the trend extraction step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrendStats {
    /// Accepted trend keywords
    pub total: usize,
    /// Accepted keywords absent from the history window
    pub new: usize,
    /// Trend-shaped keywords rejected by the language filter
    pub rejected: usize,
}

/// Coverage of the enrichment step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionStats {
    pub requested: usize,
    pub resolved: usize,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub stages: Vec<RankStats>,
    pub trend: TrendStats,
    pub completion: Option<CompletionStats>,
}

impl RunStats {
    pub fn total_requested(&self) -> usize {
        self.stages.iter().map(|s| s.requested).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.stages.iter().map(|s| s.failed).sum()
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum RunOutcome {
    Succeeded,
    Cancelled,
    Failed(String),
}

/// Everything reported at the end of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub job_id: String,
    pub language: String,
    pub service: String,
    pub mode: String,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
    pub outcome: RunOutcome,
    pub stats: RunStats,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.outcome == RunOutcome::Succeeded
    }

    /// Multi-line human readable summary
    pub fn message(&self) -> String {
        let mut msg = String::new();
        let _ = writeln!(msg, "Job Id: `{}`", self.job_id);
        let _ = writeln!(
            msg,
            "Task: `{}`-`{}`-`{}`",
            self.mode, self.service, self.language
        );
        match &self.outcome {
            RunOutcome::Succeeded => {
                let _ = writeln!(msg, "Status: completed in {:?}", self.elapsed);
            }
            RunOutcome::Cancelled => {
                let _ = writeln!(msg, "Status: cancelled after {:?}", self.elapsed);
            }
            RunOutcome::Failed(error) => {
                let _ = writeln!(msg, "Status: failed after {:?}: {}", self.elapsed, error);
            }
        }
        for stage in &self.stats.stages {
            let _ = writeln!(
                msg,
                "rank {}: {} candidates, {} requested, {} resumed, {} failed, {} survived",
                stage.rank,
                stage.candidates,
                stage.requested,
                stage.resumed,
                stage.failed,
                stage.survivors
            );
        }
        let trend = &self.stats.trend;
        let _ = write!(
            msg,
            "trend keywords: {} total, {} new, {} rejected",
            trend.total, trend.new, trend.rejected
        );
        if let Some(completion) = &self.stats.completion {
            let _ = write!(
                msg,
                "\nenrichment: {}/{} resolved ({})",
                completion.resolved, completion.requested, completion.status
            );
        }
        msg
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }
}
