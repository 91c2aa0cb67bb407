//! English

use super::{alphabets, basic_rule, cross, digits, unsupported, DataFiles, LanguageProfile, Rank, RankInfo};
use crate::config::FrontierSettings;
use crate::error::Result;
use crate::frontier::{Pruning, StagePlan};
use once_cell::sync::Lazy;
use regex::Regex;

static HAS_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9]").expect("valid regex"));

// Letters, digits, whitespace and ASCII punctuation only
static PRINTABLE_ASCII: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r##"^[A-Za-z0-9\s!"#$%&'()*+,\-./:;<=>?@\[\\\]^_`{|}~]+$"##).expect("valid regex")
});

#[derive(Debug, Clone, Copy, Default)]
pub struct English;

impl English {
    fn base() -> Vec<String> {
        let mut base = alphabets();
        base.extend(digits());
        base
    }
}

impl LanguageProfile for English {
    fn code(&self) -> &'static str {
        "en"
    }

    fn geo(&self) -> &'static str {
        "us"
    }

    fn serp_location(&self) -> &'static str {
        "United States"
    }

    fn ranks(&self) -> Vec<RankInfo> {
        vec![
            RankInfo::exact(Rank::Level(0), 1),
            RankInfo::exact(Rank::Level(1), 36),
            RankInfo::exact(Rank::Level(2), 1_296),
            RankInfo::exact(Rank::Level(3), 46_656),
            RankInfo::exact(Rank::Level(4), 1_679_616),
        ]
    }

    fn extensions(&self, rank: Rank, _data: &DataFiles) -> Result<Vec<String>> {
        let base = Self::base();
        match rank {
            Rank::Level(0) => Ok(vec![String::new()]),
            Rank::Level(1) => Ok(base),
            Rank::Level(2) => Ok(cross(&base, &base)),
            Rank::Level(3) => Ok(cross(&cross(&base, &base), &base)),
            Rank::Level(4) => {
                let pairs = cross(&base, &base);
                Ok(cross(&pairs, &pairs))
            }
            other => Err(unsupported(self.code(), other)),
        }
    }

    fn accepts_trend_keyword(&self, keyword: &str, max_tokens: usize) -> bool {
        HAS_ALPHANUMERIC.is_match(keyword)
            && PRINTABLE_ASCII.is_match(keyword)
            && keyword.split_whitespace().count() <= max_tokens
    }

    fn basic_plan(&self, settings: &FrontierSettings) -> StagePlan {
        let rule = basic_rule(settings);
        let threshold = settings.basic_threshold;
        StagePlan::unseeded()
            .exhaustive(Rank::Level(1))
            .prefix_indexed(Rank::Level(2), Pruning::new(Rank::Level(1), threshold, rule))
            .prefix_indexed(Rank::Level(3), Pruning::new(Rank::Level(2), threshold, rule))
            .prefix_indexed(Rank::Level(4), Pruning::new(Rank::Level(3), threshold, rule))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_two_starts_with_rank_one() {
        let data = DataFiles::new("/nonexistent");
        let two = English.extensions(Rank::Level(2), &data).unwrap();
        assert_eq!(two.first().map(String::as_str), Some("aa"));
        assert_eq!(two.iter().filter(|w| w.starts_with('a')).count(), 36);
    }

    #[test]
    fn test_trend_keyword_filter() {
        assert!(English.accepts_trend_keyword("hello 123!", 20));
        assert!(English.accepts_trend_keyword("hello@world", 20));
        assert!(English.accepts_trend_keyword("12345", 20));
        assert!(!English.accepts_trend_keyword("!@#", 20));
        assert!(!English.accepts_trend_keyword("café", 20));
        assert!(!English.accepts_trend_keyword("iphone 케이스", 20));
        assert!(!English.accepts_trend_keyword(&"word ".repeat(21), 20));
        assert!(English.accepts_trend_keyword(&"word ".repeat(20), 20));
    }

    #[test]
    fn test_completions() {
        let completions = English.completions_for_initial("q");
        assert_eq!(completions.len(), 26);
        assert_eq!(completions[0], "qa");
        assert!(English.completions_for_initial("7").is_empty());
        assert!(English.completions_for_initial("ab").is_empty());
    }
}
