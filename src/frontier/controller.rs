//! Staged, threshold-pruned candidate search

use super::plan::{CountRule, Expansion, Pruning, Stage, StagePlan};
use crate::error::Result;
use crate::fanout::BatchRequester;
use crate::index::PrefixIndex;
use crate::lang::{LanguageProfile, Rank, VocabularyProvider};
use crate::metrics::RankStats;
use crate::suggest::{Candidate, SuggestionResponse};
use futures::TryStreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Receives every response the search collects or resumes
pub trait ResponseObserver: Send {
    fn observe(&mut self, candidate: &Candidate, response: &SuggestionResponse);
}

impl<F> ResponseObserver for F
where
    F: FnMut(&Candidate, &SuggestionResponse) + Send,
{
    fn observe(&mut self, candidate: &Candidate, response: &SuggestionResponse) {
        self(candidate, response)
    }
}

/// Outcome of a whole plan
#[derive(Debug, Clone, Default)]
pub struct FrontierReport {
    pub stages: Vec<RankStats>,
    /// The run was cancelled before every stage finished
    pub cancelled: bool,
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Runs a [`StagePlan`] against the autosuggest backend
pub struct FrontierController {
    profile: Arc<dyn LanguageProfile>,
    vocabulary: Arc<VocabularyProvider>,
    requester: BatchRequester,
}

impl FrontierController {
    pub fn new(
        profile: Arc<dyn LanguageProfile>,
        vocabulary: Arc<VocabularyProvider>,
        requester: BatchRequester,
    ) -> Self {
        Self {
            profile,
            vocabulary,
            requester,
        }
    }

    /// Valid suggestions of `response` that count toward `candidate`'s threshold
    pub fn count_valid(
        &self,
        rule: CountRule,
        candidate: &Candidate,
        response: &SuggestionResponse,
    ) -> usize {
        let stripped_query = match rule {
            CountRule::QueryPrefix => Some(strip_whitespace(candidate.query())),
            _ => None,
        };
        response
            .suggestions
            .iter()
            .filter(|s| self.profile.classify(s).is_valid())
            .filter(|s| match rule {
                CountRule::Any => true,
                CountRule::QueryPrefix => stripped_query
                    .as_deref()
                    .map(|q| strip_whitespace(&s.text).starts_with(q))
                    .unwrap_or(false),
                CountRule::NextInitial => self.next_initial_matches(candidate, &s.text),
            })
            .count()
    }

    /// Whether the first character after the candidate's base keyword in
    /// `text` has the candidate's extension as its initial
    fn next_initial_matches(&self, candidate: &Candidate, text: &str) -> bool {
        let keyword = candidate.base().trim();
        if keyword.is_empty() {
            return false;
        }
        let Some(at) = text.find(keyword) else {
            return false;
        };
        let after = &text[at + keyword.len()..];
        let segment = after.split(keyword).next().unwrap_or(after);
        match segment.trim_start().chars().next() {
            Some(ch) => {
                let initial = self.profile.initial_of(ch);
                let mut ext = candidate.extension().chars();
                ext.next() == Some(initial) && ext.next().is_none()
            }
            None => false,
        }
    }

    /// Run every stage of `plan` in order, feeding each collected or resumed
    /// response to `observer`
    pub async fn run(
        &self,
        plan: &StagePlan,
        cancel: &CancellationToken,
        observer: &mut dyn ResponseObserver,
    ) -> Result<FrontierReport> {
        plan.validate()?;

        let mut resumed: HashMap<String, SuggestionResponse> = HashMap::new();
        for response in self.requester.log().read_all().await? {
            resumed.entry(response.keyword.clone()).or_insert(response);
        }
        if !resumed.is_empty() {
            info!("Resuming with {} logged responses", resumed.len());
        }

        let mut visited: HashSet<String> = HashSet::new();
        let mut survivors: HashMap<Pruning, Vec<Candidate>> = HashMap::new();
        let mut report = FrontierReport::default();

        for stage in plan.stages() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let generated = self.expand(plan, stage, &survivors).await?;
            let candidates: Vec<Candidate> = generated
                .into_iter()
                .filter(|c| visited.insert(c.query().to_string()))
                .collect();

            // Prunings fed by this stage; the first one drives the stats
            let prunings: Vec<Pruning> = plan
                .stages()
                .iter()
                .filter_map(|s| s.expansion.pruning().copied())
                .filter(|p| p.parent == stage.rank)
                .collect();

            let mut stats = RankStats::new(stage.rank, candidates.len());
            info!("Rank {}: {} candidates", stage.rank, candidates.len());

            if candidates.is_empty() {
                report.stages.push(stats);
                continue;
            }

            let by_query: HashMap<String, Candidate> = candidates
                .iter()
                .map(|c| (c.query().to_string(), c.clone()))
                .collect();

            let mut record = |candidate: &Candidate,
                              response: &SuggestionResponse,
                              stats: &mut RankStats,
                              survivors: &mut HashMap<Pruning, Vec<Candidate>>| {
                observer.observe(candidate, response);
                let primary = prunings.first().map(|p| p.rule).unwrap_or(CountRule::Any);
                stats.record_count(self.count_valid(primary, candidate, response));
                for pruning in &prunings {
                    if self.count_valid(pruning.rule, candidate, response) >= pruning.threshold {
                        survivors.entry(*pruning).or_default().push(candidate.clone());
                    }
                }
            };

            for candidate in &candidates {
                if let Some(response) = resumed.get(candidate.query()) {
                    stats.resumed += 1;
                    record(candidate, response, &mut stats, &mut survivors);
                }
            }

            let mut batches = self.requester.collect(candidates, cancel);
            while let Some(outcome) = batches.try_next().await? {
                stats.requested += outcome.responses.len() + outcome.failed.len();
                stats.failed += outcome.failed.len();
                for response in &outcome.responses {
                    match by_query.get(&response.keyword) {
                        Some(candidate) => record(candidate, response, &mut stats, &mut survivors),
                        None => warn!("Response for unknown candidate {:?}", response.keyword),
                    }
                }
            }
            drop(batches);

            if let Some(primary) = prunings.first() {
                stats.survivors = survivors.get(primary).map(Vec::len).unwrap_or(0);
            }
            info!(
                "Rank {} done: {} requested, {} resumed, {} failed, {} survived",
                stats.rank, stats.requested, stats.resumed, stats.failed, stats.survivors
            );
            debug!("Rank {} histogram {:?}", stats.rank, stats.histogram);
            report.stages.push(stats);
        }

        if cancel.is_cancelled() {
            report.cancelled = true;
        }
        Ok(report)
    }

    async fn vocabulary(&self, rank: Rank) -> Result<Arc<Vec<String>>> {
        self.vocabulary.extensions(&self.profile, rank).await
    }

    /// Candidates of one stage, before de-duplication against earlier stages
    async fn expand(
        &self,
        plan: &StagePlan,
        stage: &Stage,
        survivors: &HashMap<Pruning, Vec<Candidate>>,
    ) -> Result<Vec<Candidate>> {
        let parents = |pruning: &Pruning| survivors.get(pruning).map(Vec::as_slice).unwrap_or(&[]);

        let candidates = match &stage.expansion {
            Expansion::Exhaustive => {
                let words = self.vocabulary(stage.rank).await?;
                plan.seeds()
                    .iter()
                    .flat_map(|seed| words.iter().map(move |w| Candidate::new(seed.clone(), w.clone())))
                    .collect()
            }
            Expansion::Append(pruning) => {
                let words = self.vocabulary(stage.rank).await?;
                let mut out = Vec::new();
                for survivor in parents(pruning) {
                    out.extend(
                        words
                            .iter()
                            .map(|w| Candidate::new(survivor.query(), w.as_str())),
                    );
                }
                out
            }
            Expansion::PrefixIndex(pruning) => {
                let roots = parents(pruning);
                if roots.is_empty() {
                    return Ok(Vec::new());
                }
                let words = self.vocabulary(stage.rank).await?;
                let index: PrefixIndex = words.iter().collect();
                debug!("Indexed {} extensions of rank {}", index.len(), stage.rank);
                let mut out = Vec::new();
                for survivor in roots {
                    let mut matches = index.all_with_prefix(survivor.extension());
                    matches.sort_unstable();
                    out.extend(
                        matches
                            .into_iter()
                            .map(|ext| Candidate::new(survivor.base(), ext)),
                    );
                }
                out
            }
            Expansion::Initials(pruning) => {
                let separator = self.profile.separator();
                let mut out = Vec::new();
                for survivor in parents(pruning) {
                    let base = format!("{}{}", survivor.base().trim_end(), separator);
                    out.extend(
                        self.profile
                            .completions_for_initial(survivor.extension())
                            .into_iter()
                            .map(|ext| Candidate::new(base.clone(), ext)),
                    );
                }
                out
            }
        };
        Ok(candidates)
    }
}
