//! Whitespace-insensitive keyword de-duplication

use std::collections::HashMap;

/// Comparison key: the keyword with every whitespace character removed
pub fn dedup_key(keyword: &str) -> String {
    keyword.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Remembers every keyword seen so far by its whitespace-stripped form.
///
/// The first spelling seen for a stripped form is the one kept.
#[derive(Debug, Clone, Default)]
pub struct Deduplicator {
    seen: HashMap<String, String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deduplicator that already knows a historical window
    pub fn with_history<S: AsRef<str>>(history: &[S]) -> Self {
        let mut dedup = Self::new();
        for keyword in history {
            dedup.admit(keyword.as_ref());
        }
        dedup
    }

    /// Record `keyword`; true when its stripped form was not seen before
    pub fn admit(&mut self, keyword: &str) -> bool {
        let key = dedup_key(keyword);
        if self.seen.contains_key(&key) {
            return false;
        }
        self.seen.insert(key, keyword.to_string());
        true
    }

    /// Keywords not seen before, in input order, in their original spelling
    pub fn filter<S: AsRef<str>>(&mut self, keywords: &[S]) -> Vec<String> {
        keywords
            .iter()
            .map(AsRef::as_ref)
            .filter(|k| self.admit(k))
            .map(str::to_string)
            .collect()
    }

    /// First spelling recorded for the stripped form of `keyword`
    pub fn original(&self, keyword: &str) -> Option<&str> {
        self.seen.get(&dedup_key(keyword)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Keywords of `new` whose stripped form is absent from `history` and from
/// earlier entries of `new`
pub fn dedupe<H: AsRef<str>, N: AsRef<str>>(history: &[H], new: &[N]) -> Vec<String> {
    Deduplicator::with_history(history).filter(new)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: [&str; 0] = [];

    #[test]
    fn test_whitespace_insensitive() {
        let first = dedupe(&NONE, &["a b"]);
        assert_eq!(first, vec!["a b"]);
        assert!(dedupe(&["ab"], &["a  b"]).is_empty());
    }

    #[test]
    fn test_first_spelling_wins() {
        let out = dedupe(&NONE, &["iphone 16", "iphone16", "galaxy", "iphone  16"]);
        assert_eq!(out, vec!["iphone 16", "galaxy"]);
    }

    #[test]
    fn test_idempotent() {
        let history = ["old one", "older"];
        let input = ["new", "old  one", "n e w", "fresh", "fresh"];
        let once = dedupe(&history, &input);
        let twice = dedupe(&history, &once);
        assert_eq!(once, twice);
        assert_eq!(once, vec!["new", "fresh"]);
    }

    #[test]
    fn test_history_keeps_first_original() {
        let dedup = Deduplicator::with_history(&["a b", "ab"]);
        assert_eq!(dedup.original("a   b"), Some("a b"));
        assert_eq!(dedup.len(), 1);
    }

    #[test]
    fn test_run_level_memory() {
        let mut dedup = Deduplicator::new();
        assert_eq!(dedup.filter(&["x y"]), vec!["x y"]);
        assert!(dedup.filter(&["xy", "x\ty"]).is_empty());
        assert!(!dedup.is_empty());
    }
}
