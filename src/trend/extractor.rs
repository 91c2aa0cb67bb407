//! Trend keyword extraction from collected responses

use super::dedup::Deduplicator;
use crate::frontier::ResponseObserver;
use crate::lang::LanguageProfile;
use crate::suggest::{is_trend_keyword, Candidate, SuggestionResponse};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Trend keywords grouped by base keyword, then by candidate query
pub type EntityTrends = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Result of one run's extraction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrendOutput {
    /// Accepted trend keywords, in first-seen order
    pub accepted: Vec<String>,
    /// Accepted keywords unseen in the history window and earlier in the run
    pub new: Vec<String>,
    /// Trend-shaped keywords rejected by the language filter
    pub rejected: Vec<String>,
    /// Populated when anchored on base keywords
    pub by_entity: EntityTrends,
}

/// Collects trend-shaped suggestions as responses stream in.
///
/// When anchored, only suggestions that start with the candidate's base
/// keyword and the language separator count, and results are also grouped
/// per base keyword.
pub struct TrendExtractor {
    profile: Arc<dyn LanguageProfile>,
    max_tokens: usize,
    anchored: bool,
    accepted: Vec<String>,
    rejected: Vec<String>,
    seen: HashSet<String>,
    by_entity: EntityTrends,
}

impl TrendExtractor {
    pub fn new(profile: Arc<dyn LanguageProfile>, max_tokens: usize) -> Self {
        Self {
            profile,
            max_tokens,
            anchored: false,
            accepted: Vec::new(),
            rejected: Vec::new(),
            seen: HashSet::new(),
            by_entity: BTreeMap::new(),
        }
    }

    /// Require trend keywords to extend the candidate's base keyword
    pub fn anchored(mut self) -> Self {
        self.anchored = true;
        self
    }

    /// Trend keywords of one response, before the acceptance filter
    pub fn extract(&self, candidate: &Candidate, response: &SuggestionResponse) -> Vec<String> {
        let base = candidate.base().trim();
        let anchor = (self.anchored && !base.is_empty()).then(|| (base, self.profile.separator()));
        response
            .suggestions
            .iter()
            .filter(|s| self.profile.is_trend_shaped(s))
            .filter(|s| anchor.is_none() || is_trend_keyword(s, anchor))
            .map(|s| s.text.trim().to_string())
            .filter(|text| !text.is_empty())
            .collect()
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    /// Split off new keywords against `dedup`, which holds the history window
    /// and anything emitted earlier
    pub fn finish(self, dedup: &mut Deduplicator) -> TrendOutput {
        let new = dedup.filter(&self.accepted);
        debug!(
            "Trend extraction: {} accepted, {} new, {} rejected",
            self.accepted.len(),
            new.len(),
            self.rejected.len()
        );
        TrendOutput {
            accepted: self.accepted,
            new,
            rejected: self.rejected,
            by_entity: self.by_entity,
        }
    }
}

impl ResponseObserver for TrendExtractor {
    fn observe(&mut self, candidate: &Candidate, response: &SuggestionResponse) {
        let keywords = self.extract(candidate, response);
        if keywords.is_empty() {
            return;
        }

        for keyword in &keywords {
            if !self.seen.insert(keyword.clone()) {
                continue;
            }
            if self.profile.accepts_trend_keyword(keyword, self.max_tokens) {
                self.accepted.push(keyword.clone());
            } else {
                self.rejected.push(keyword.clone());
            }
        }

        if self.anchored {
            let entity = candidate.base().trim().to_string();
            self.by_entity
                .entry(entity)
                .or_default()
                .entry(candidate.query().to_string())
                .or_default()
                .extend(keywords);
        }
    }
}
