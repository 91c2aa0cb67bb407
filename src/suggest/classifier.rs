//! Validity taxonomy for raw backend suggestions
//!
//! Every suggestion carries a `suggest_type` and a set of `suggest_subtypes`.
//! Disqualifying rules are checked before qualifying ones, so a suggestion
//! that is both a prefix-extension and a typo correction is noise.

use super::types::Suggestion;

/// Types that carry query-related completions
const RELATED_TYPES: [i32; 2] = [0, 46];
/// Pure recommendation unrelated to the query
const UNRELATED_TYPE: i32 = 33;
/// Spelled-out or transliterated variants of the query
const SPELLED_OUT_SUBTYPES: [i32; 3] = [333, 546, 10];
/// Automatic typo correction
const TYPO_SUBTYPE: i32 = 13;
/// Prefix-extension, infix, reorder, suffix-extension, low-relevance, trend-suffix
const QUALIFYING_SUBTYPES: [i32; 6] = [5, 7, 8, 512, 30, TREND_SUBTYPE];
/// Suffix-trend subtype
pub const TREND_SUBTYPE: i32 = 3;

/// Why a suggestion was not counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoiseKind {
    Unrelated,
    SpelledOutVariant,
    TypoCorrection,
    Unqualified,
}

/// Classification of one suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Valid,
    Noise(NoiseKind),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }
}

fn intersects(subtypes: &[i32], wanted: &[i32]) -> bool {
    subtypes.iter().any(|s| wanted.contains(s))
}

/// Classify a `(suggest_type, suggest_subtypes)` pair
pub fn classify(suggest_type: i32, subtypes: &[i32]) -> Verdict {
    if suggest_type == UNRELATED_TYPE {
        return Verdict::Noise(NoiseKind::Unrelated);
    }
    if !RELATED_TYPES.contains(&suggest_type) {
        return Verdict::Noise(NoiseKind::Unqualified);
    }
    if intersects(subtypes, &SPELLED_OUT_SUBTYPES) {
        return Verdict::Noise(NoiseKind::SpelledOutVariant);
    }
    if subtypes.contains(&TYPO_SUBTYPE) {
        return Verdict::Noise(NoiseKind::TypoCorrection);
    }
    if intersects(subtypes, &QUALIFYING_SUBTYPES) {
        Verdict::Valid
    } else {
        Verdict::Noise(NoiseKind::Unqualified)
    }
}

/// Classify a suggestion
pub fn classify_suggestion(suggestion: &Suggestion) -> Verdict {
    classify(suggestion.suggest_type, &suggestion.suggest_subtypes)
}

/// Whether the pair carries the suffix-trend subtype on a related type
pub fn is_trend_shaped(suggest_type: i32, subtypes: &[i32]) -> bool {
    RELATED_TYPES.contains(&suggest_type) && subtypes.contains(&TREND_SUBTYPE)
}

/// Whether a suggestion is a trend keyword, optionally anchored on a base
/// keyword: with a base, the text must start with `base + separator`.
pub fn is_trend_keyword(suggestion: &Suggestion, anchor: Option<(&str, &str)>) -> bool {
    if !is_trend_shaped(suggestion.suggest_type, &suggestion.suggest_subtypes) {
        return false;
    }
    match anchor {
        Some((base, separator)) => suggestion
            .text
            .strip_prefix(base)
            .map(|rest| rest.starts_with(separator))
            .unwrap_or(false),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualifying_subtypes() {
        for subtype in [5, 7, 8, 512, 30, 3] {
            assert_eq!(classify(0, &[subtype]), Verdict::Valid, "subtype {}", subtype);
            assert_eq!(classify(46, &[subtype]), Verdict::Valid, "subtype {}", subtype);
        }
    }

    #[test]
    fn test_disqualify_wins() {
        let qualifying = [5, 7, 8, 512, 30, 3];
        for bad in [13, 333, 546, 10] {
            for good in qualifying {
                for suggest_type in [0, 46] {
                    let verdict = classify(suggest_type, &[good, bad]);
                    assert!(
                        matches!(verdict, Verdict::Noise(_)),
                        "type {} subtypes {:?}",
                        suggest_type,
                        [good, bad]
                    );
                }
            }
        }
        assert_eq!(
            classify(0, &[512, 13]),
            Verdict::Noise(NoiseKind::TypoCorrection)
        );
        assert_eq!(
            classify(46, &[5, 546]),
            Verdict::Noise(NoiseKind::SpelledOutVariant)
        );
    }

    #[test]
    fn test_unrelated_and_other_types() {
        assert_eq!(classify(33, &[5]), Verdict::Noise(NoiseKind::Unrelated));
        assert_eq!(classify(35, &[5]), Verdict::Noise(NoiseKind::Unqualified));
        assert_eq!(classify(0, &[]), Verdict::Noise(NoiseKind::Unqualified));
        assert_eq!(classify(0, &[99]), Verdict::Noise(NoiseKind::Unqualified));
    }

    #[test]
    fn test_trend_shape() {
        assert!(is_trend_shaped(0, &[3, 512]));
        assert!(is_trend_shaped(46, &[3]));
        assert!(!is_trend_shaped(33, &[3]));
        assert!(!is_trend_shaped(0, &[512]));
    }

    #[test]
    fn test_trend_keyword_anchor() {
        let suggestion = Suggestion::new("iphone 16 release", 0, vec![3]);
        assert!(is_trend_keyword(&suggestion, None));
        assert!(is_trend_keyword(&suggestion, Some(("iphone", " "))));
        assert!(!is_trend_keyword(&suggestion, Some(("iphone 16 release", " "))));
        assert!(!is_trend_keyword(&suggestion, Some(("galaxy", " "))));

        let joined = Suggestion::new("東京タワー", 0, vec![3]);
        assert!(is_trend_keyword(&joined, Some(("東京", ""))));

        let plain = Suggestion::new("iphone 16", 0, vec![512]);
        assert!(!is_trend_keyword(&plain, None));
    }
}
