//! Language profiles and vocabulary generation
//!
//! Each supported language is one [`LanguageProfile`] implementation. The
//! registry maps language codes to profiles so call sites never branch on
//! the code themselves.

mod data;
mod en;
mod ja;
mod ko;
mod rank;

pub use data::DataFiles;
pub use en::English;
pub use ja::Japanese;
pub use ko::Korean;
pub use rank::Rank;

use crate::config::FrontierSettings;
use crate::error::{Error, Result};
use crate::frontier::{CountRule, Pruning, StagePlan};
use crate::suggest::{classifier, Suggestion, Verdict};
use moka::future::Cache;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Documented size of a rank's vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Exact(usize),
    /// Depends on the named data file
    DataDependent(&'static str),
}

/// One rank a language supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankInfo {
    pub rank: Rank,
    pub cardinality: Cardinality,
}

impl RankInfo {
    pub const fn exact(rank: Rank, size: usize) -> Self {
        Self {
            rank,
            cardinality: Cardinality::Exact(size),
        }
    }

    pub const fn data(rank: Rank, file: &'static str) -> Self {
        Self {
            rank,
            cardinality: Cardinality::DataDependent(file),
        }
    }
}

/// Per-language capability set
pub trait LanguageProfile: Send + Sync {
    /// Language code (`ko`, `ja`, `en`)
    fn code(&self) -> &'static str;

    /// `hl` parameter sent with suggest requests
    fn host_language(&self) -> &'static str {
        self.code()
    }

    /// `gl` parameter sent with suggest requests
    fn geo(&self) -> &'static str;

    /// Location name handed to the SERP collector
    fn serp_location(&self) -> &'static str;

    /// Joins a base keyword to a following extension
    fn separator(&self) -> &'static str {
        " "
    }

    /// Supported ranks and their vocabulary size
    fn ranks(&self) -> Vec<RankInfo>;

    /// Ordered extension strings of a rank
    fn extensions(&self, rank: Rank, data: &DataFiles) -> Result<Vec<String>>;

    /// Initial letter of a character (the choseong for Hangul syllables)
    fn initial_of(&self, ch: char) -> char {
        ch
    }

    /// Two-character completions of a one-character initial. Empty when the
    /// string is not an initial of this language.
    fn completions_for_initial(&self, initial: &str) -> Vec<String> {
        latin_completions(initial)
    }

    fn classify(&self, suggestion: &Suggestion) -> Verdict {
        classifier::classify_suggestion(suggestion)
    }

    fn is_trend_shaped(&self, suggestion: &Suggestion) -> bool {
        classifier::is_trend_shaped(suggestion.suggest_type, &suggestion.suggest_subtypes)
    }

    /// Language-specific acceptance of an extracted trend keyword
    fn accepts_trend_keyword(&self, _keyword: &str, _max_tokens: usize) -> bool {
        true
    }

    /// Stages of a basic (topic-less) run
    fn basic_plan(&self, settings: &FrontierSettings) -> StagePlan;

    /// Stages of a target run: the topics alone and with one extension, then
    /// completions of every initial that proved productive.
    fn target_plan(&self, topics: &[String], settings: &FrontierSettings) -> StagePlan {
        let seeds = topics
            .iter()
            .map(|topic| topic.trim())
            .filter(|topic| !topic.is_empty())
            .map(|topic| format!("{}{}", topic, self.separator()))
            .collect();
        StagePlan::new(seeds)
            .exhaustive(Rank::Level(0))
            .exhaustive(Rank::Level(1))
            .initials(Pruning::new(
                Rank::Level(1),
                settings.target_threshold,
                CountRule::NextInitial,
            ))
    }
}

pub(crate) fn unsupported(code: &str, rank: Rank) -> Error {
    Error::config(format!("language {} has no rank {}", code, rank))
}

pub(crate) fn basic_rule(settings: &FrontierSettings) -> CountRule {
    if settings.require_query_prefix {
        CountRule::QueryPrefix
    } else {
        CountRule::Any
    }
}

pub(crate) fn alphabets() -> Vec<String> {
    ('a'..='z').map(String::from).collect()
}

pub(crate) fn digits() -> Vec<String> {
    ('0'..='9').map(String::from).collect()
}

/// Every `x + y` with `x` from `left` and `y` from `right`, left-major
pub(crate) fn cross(left: &[String], right: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(left.len() * right.len());
    for x in left {
        for y in right {
            let mut s = String::with_capacity(x.len() + y.len());
            s.push_str(x);
            s.push_str(y);
            out.push(s);
        }
    }
    out
}

/// `x` followed by each latin letter, when `x` is a single latin letter
pub(crate) fn latin_completions(initial: &str) -> Vec<String> {
    let mut chars = initial.chars();
    match (chars.next(), chars.next()) {
        (Some(x), None) if x.is_ascii_lowercase() => {
            ('a'..='z').map(|y| format!("{}{}", x, y)).collect()
        }
        _ => Vec::new(),
    }
}

/// Lookup table of supported languages
pub struct LanguageRegistry {
    profiles: HashMap<&'static str, Arc<dyn LanguageProfile>>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            profiles: HashMap::new(),
        };
        registry.register(Arc::new(Korean));
        registry.register(Arc::new(Japanese));
        registry.register(Arc::new(English));
        registry
    }

    pub fn register(&mut self, profile: Arc<dyn LanguageProfile>) {
        self.profiles.insert(profile.code(), profile);
    }

    /// Profile for a language code
    pub fn get(&self, code: &str) -> Result<Arc<dyn LanguageProfile>> {
        self.profiles
            .get(code)
            .cloned()
            .ok_or_else(|| Error::config(format!("unsupported language {:?}", code)))
    }

    /// Registered codes, sorted
    pub fn codes(&self) -> Vec<&'static str> {
        let mut codes: Vec<_> = self.profiles.keys().copied().collect();
        codes.sort_unstable();
        codes
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Profile for a language code from the built-in registry
pub fn profile(code: &str) -> Result<Arc<dyn LanguageProfile>> {
    LanguageRegistry::new().get(code)
}

/// Cached access to rank vocabularies.
///
/// Data files are read once per (language, rank); concurrent first requests
/// for the same key share one load.
pub struct VocabularyProvider {
    data: DataFiles,
    cache: Cache<(&'static str, Rank), Arc<Vec<String>>>,
}

impl VocabularyProvider {
    pub fn new(data: DataFiles) -> Self {
        let cache = Cache::builder().max_capacity(64).build();
        Self { data, cache }
    }

    pub fn data(&self) -> &DataFiles {
        &self.data
    }

    /// Extensions of `rank` for `profile`
    pub async fn extensions(
        &self,
        profile: &Arc<dyn LanguageProfile>,
        rank: Rank,
    ) -> Result<Arc<Vec<String>>> {
        let key = (profile.code(), rank);
        let loader = {
            let profile = Arc::clone(profile);
            let data = self.data.clone();
            async move {
                let code = profile.code();
                let words = tokio::task::spawn_blocking({
                    let profile = Arc::clone(&profile);
                    move || profile.extensions(rank, &data)
                })
                .await
                .map_err(|e| Error::config(format!("loading {}/{} panicked: {}", code, rank, e)))??;
                debug!(
                    "Loaded {} extensions for {}/{}",
                    words.len(),
                    profile.code(),
                    rank
                );
                Ok::<_, Error>(Arc::new(words))
            }
        };
        self.cache
            .try_get_with(key, loader)
            .await
            .map_err(|e| match e.as_ref() {
                Error::Configuration(msg) => Error::config(msg.clone()),
                other => Error::config(other.to_string()),
            })
    }

    /// Number of cached vocabularies
    pub fn cached(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        let registry = LanguageRegistry::new();
        assert_eq!(registry.codes(), vec!["en", "ja", "ko"]);
        assert_eq!(registry.get("ko").unwrap().geo(), "kr");
        assert!(matches!(registry.get("fr"), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_exact_cardinalities_match_vocabulary() {
        let data = DataFiles::new("/nonexistent");
        let registry = LanguageRegistry::new();
        for code in registry.codes() {
            let profile = registry.get(code).unwrap();
            for info in profile.ranks() {
                if let Cardinality::Exact(size) = info.cardinality {
                    // skip the multi-million ranks
                    if size > 100_000 {
                        continue;
                    }
                    let words = profile.extensions(info.rank, &data).unwrap();
                    assert_eq!(words.len(), size, "{}/{}", code, info.rank);
                }
            }
        }
    }

    #[test]
    fn test_unsupported_rank() {
        let data = DataFiles::new("/nonexistent");
        let en = profile("en").unwrap();
        assert!(matches!(
            en.extensions(Rank::Small(2), &data),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_default_plans_validate() {
        let settings = FrontierSettings::default();
        let topics = vec!["iphone".to_string()];
        for code in LanguageRegistry::new().codes() {
            let profile = profile(code).unwrap();
            profile.basic_plan(&settings).validate().unwrap();
            let target = profile.target_plan(&topics, &settings);
            target.validate().unwrap();
            let seed = format!("iphone{}", profile.separator());
            assert_eq!(target.seeds(), [seed]);
        }
    }

    #[test]
    fn test_target_seeds_join_with_separator() {
        let settings = FrontierSettings::default();
        let topics = vec![" 東京 ".to_string(), "".to_string()];
        let ja = profile("ja").unwrap();
        assert_eq!(ja.target_plan(&topics, &settings).seeds(), ["東京".to_string()]);
        let ko = profile("ko").unwrap();
        assert_eq!(ko.target_plan(&topics, &settings).seeds(), ["東京 ".to_string()]);
    }

    #[tokio::test]
    async fn test_provider_caches_and_reports_missing_data() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("ko")).unwrap();
        std::fs::write(dir.path().join("ko/characters.txt"), "가\n나\n").unwrap();

        let provider = VocabularyProvider::new(DataFiles::new(dir.path()));
        let ko = profile("ko").unwrap();

        let first = provider.extensions(&ko, Rank::Level(2)).await.unwrap();
        assert_eq!(first.as_slice(), ["가", "나"]);

        // served from cache even after the file is gone
        std::fs::remove_file(dir.path().join("ko/characters.txt")).unwrap();
        let second = provider.extensions(&ko, Rank::Level(2)).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let ja = profile("ja").unwrap();
        let err = provider.extensions(&ja, Rank::New(1)).await.unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_cross_order() {
        let left = vec!["a".to_string(), "b".to_string()];
        let right = vec!["1".to_string(), "2".to_string()];
        assert_eq!(cross(&left, &right), vec!["a1", "a2", "b1", "b2"]);
    }
}
