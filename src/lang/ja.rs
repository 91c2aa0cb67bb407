//! Japanese

use super::{
    alphabets, basic_rule, cross, digits, latin_completions, unsupported, DataFiles,
    LanguageProfile, Rank, RankInfo,
};
use crate::config::FrontierSettings;
use crate::error::Result;
use crate::frontier::{Pruning, StagePlan};

/// Basic hiragana, without voiced marks or small kana
pub const HIRAGANA: [char; 46] = [
    'あ', 'い', 'う', 'え', 'お', 'か', 'き', 'く', 'け', 'こ', 'さ', 'し', 'す', 'せ', 'そ', 'た', 'ち',
    'つ', 'て', 'と', 'な', 'に', 'ぬ', 'ね', 'の', 'は', 'ひ', 'ふ', 'へ', 'ほ', 'ま', 'み', 'む', 'め',
    'も', 'や', 'ゆ', 'よ', 'ら', 'り', 'る', 'れ', 'ろ', 'わ', 'を', 'ん',
];

/// Hiragana including the voiced and semi-voiced syllables
pub const KANA_SYLLABLES: [char; 71] = [
    'あ', 'い', 'う', 'え', 'お', 'か', 'き', 'く', 'け', 'こ', 'が', 'ぎ', 'ぐ', 'げ', 'ご', 'さ', 'し',
    'す', 'せ', 'そ', 'ざ', 'じ', 'ず', 'ぜ', 'ぞ', 'た', 'ち', 'つ', 'て', 'と', 'だ', 'ぢ', 'づ', 'で',
    'ど', 'な', 'に', 'ぬ', 'ね', 'の', 'は', 'ひ', 'ふ', 'へ', 'ほ', 'ば', 'び', 'ぶ', 'べ', 'ぼ', 'ぱ',
    'ぴ', 'ぷ', 'ぺ', 'ぽ', 'ま', 'み', 'む', 'め', 'も', 'や', 'ゆ', 'よ', 'ら', 'り', 'る', 'れ', 'ろ',
    'わ', 'を', 'ん',
];

/// Long vowel mark written after a katakana syllable
const CHOUON: char = 'ー';

const KANJI_FILE: &str = "kanji.txt";
const KANJI_TREND_FILE: &str = "kanji_trend.txt";
const KANJI_TOP_FILE: &str = "kanji_top_300.txt";
const KANJI_TOP: usize = 300;
const KANA: usize = 71 + 71 + 69 + 26 + 10;

#[derive(Debug, Clone, Copy, Default)]
pub struct Japanese;

impl Japanese {
    /// Hiragana, latin letters and digits
    fn letters() -> Vec<String> {
        let mut letters: Vec<String> = HIRAGANA.iter().copied().map(String::from).collect();
        letters.extend(alphabets());
        letters.extend(digits());
        letters
    }

    /// Hiragana, katakana, katakana with a long vowel, latin letters and digits
    fn kana() -> Vec<String> {
        let katakana: Vec<char> = KANA_SYLLABLES.iter().filter_map(|&c| to_katakana(c)).collect();
        let mut kana: Vec<String> = KANA_SYLLABLES.iter().copied().map(String::from).collect();
        kana.extend(katakana.iter().copied().map(String::from));
        kana.extend(
            katakana
                .iter()
                .filter(|&&c| c != 'ヲ' && c != 'ン')
                .map(|c| format!("{}{}", c, CHOUON)),
        );
        kana.extend(alphabets());
        kana.extend(digits());
        kana
    }

    fn kana_with_top_kanji(data: &DataFiles) -> Result<Vec<String>> {
        let mut words = data.lines("ja", KANJI_TOP_FILE)?;
        words.truncate(KANJI_TOP);
        let mut set = Self::kana();
        set.extend(words);
        Ok(set)
    }

    fn with_file(data: &DataFiles, file: &str, limit: Option<usize>) -> Result<Vec<String>> {
        let mut words = data.lines("ja", file)?;
        if let Some(limit) = limit {
            words.truncate(limit);
        }
        let mut set = Self::letters();
        set.extend(words);
        Ok(set)
    }

    fn with_kanji(data: &DataFiles) -> Result<Vec<String>> {
        Self::with_file(data, KANJI_FILE, None)
    }

    fn with_trend_kanji(data: &DataFiles) -> Result<Vec<String>> {
        Self::with_file(data, KANJI_TREND_FILE, None)
    }

    fn with_top_kanji(data: &DataFiles) -> Result<Vec<String>> {
        Self::with_file(data, KANJI_TOP_FILE, Some(KANJI_TOP))
    }
}

/// Katakana counterpart of a hiragana syllable
fn to_katakana(c: char) -> Option<char> {
    match c {
        '\u{3041}'..='\u{3096}' => char::from_u32(c as u32 + 0x60),
        _ => None,
    }
}

impl LanguageProfile for Japanese {
    fn code(&self) -> &'static str {
        "ja"
    }

    fn geo(&self) -> &'static str {
        "jp"
    }

    fn serp_location(&self) -> &'static str {
        "Japan"
    }

    fn separator(&self) -> &'static str {
        ""
    }

    fn ranks(&self) -> Vec<RankInfo> {
        vec![
            RankInfo::exact(Rank::Level(0), 1),
            RankInfo::exact(Rank::Level(1), 82),
            RankInfo::data(Rank::New(1), KANJI_FILE),
            RankInfo::data(Rank::Kanji300(1), KANJI_TOP_FILE),
            RankInfo::exact(Rank::Level(2), 82 * 82),
            RankInfo::data(Rank::New(2), KANJI_TREND_FILE),
            RankInfo::data(Rank::Kanji300(2), KANJI_TOP_FILE),
            RankInfo::exact(Rank::Level(3), 82 * 82 * 82),
            RankInfo::data(Rank::New(3), KANJI_TREND_FILE),
            RankInfo::data(Rank::Kanji300(3), KANJI_TOP_FILE),
            RankInfo::data(Rank::Kana(1), KANJI_TOP_FILE),
            RankInfo::exact(Rank::Kana(2), KANA),
            RankInfo::exact(Rank::Kana(3), KANA),
        ]
    }

    fn extensions(&self, rank: Rank, data: &DataFiles) -> Result<Vec<String>> {
        let letters = Self::letters();
        match rank {
            Rank::Level(0) => Ok(vec![String::new()]),
            Rank::Level(1) => Ok(letters),
            Rank::New(1) => Self::with_kanji(data),
            Rank::Kanji300(1) => Self::with_top_kanji(data),
            Rank::Level(2) => Ok(cross(&letters, &letters)),
            Rank::New(2) => Ok(cross(&letters, &Self::with_trend_kanji(data)?)),
            Rank::Kanji300(2) => Ok(cross(&Self::with_top_kanji(data)?, &letters)),
            Rank::Level(3) => Ok(cross(&cross(&letters, &letters), &letters)),
            Rank::New(3) => Ok(cross(
                &cross(&letters, &letters),
                &Self::with_trend_kanji(data)?,
            )),
            Rank::Kanji300(3) => Ok(cross(
                &cross(&Self::with_top_kanji(data)?, &letters),
                &letters,
            )),
            Rank::Kana(1) => Self::kana_with_top_kanji(data),
            // appended one step at a time to surviving queries
            Rank::Kana(2) | Rank::Kana(3) => Ok(Self::kana()),
            other => Err(unsupported(self.code(), other)),
        }
    }

    fn completions_for_initial(&self, initial: &str) -> Vec<String> {
        let mut chars = initial.chars();
        match (chars.next(), chars.next()) {
            (Some(x), None) if HIRAGANA.contains(&x) => {
                HIRAGANA.iter().map(|y| format!("{}{}", x, y)).collect()
            }
            _ => latin_completions(initial),
        }
    }

    fn basic_plan(&self, settings: &FrontierSettings) -> StagePlan {
        let rule = basic_rule(settings);
        let threshold = settings.basic_threshold;
        StagePlan::unseeded()
            .exhaustive(Rank::Kana(1))
            .append(Rank::Kana(2), Pruning::new(Rank::Kana(1), threshold, rule))
            .append(Rank::Kana(3), Pruning::new(Rank::Kana(2), threshold, rule))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontier::Expansion;

    fn data_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("ja")).unwrap();
        let top: String = (0..310).map(|i| format!("k{}\n", i)).collect();
        std::fs::write(dir.path().join("ja").join(KANJI_TOP_FILE), top).unwrap();
        std::fs::write(dir.path().join("ja").join(KANJI_TREND_FILE), "話\n題\n").unwrap();
        dir
    }

    #[test]
    fn test_top_kanji_is_capped() {
        let dir = data_dir();
        let data = DataFiles::new(dir.path());
        let one = Japanese.extensions(Rank::Kanji300(1), &data).unwrap();
        assert_eq!(one.len(), 82 + KANJI_TOP);
        assert_eq!(one.last().map(String::as_str), Some("k299"));

        let two = Japanese.extensions(Rank::Kanji300(2), &data).unwrap();
        assert_eq!(two.len(), (82 + KANJI_TOP) * 82);
    }

    #[test]
    fn test_new_ranks_append_trend_kanji() {
        let dir = data_dir();
        let data = DataFiles::new(dir.path());
        let two = Japanese.extensions(Rank::New(2), &data).unwrap();
        assert_eq!(two.len(), 82 * 84);
        assert!(two.contains(&"あ話".to_string()));
        assert!(Japanese.extensions(Rank::New(1), &data).is_err());
    }

    #[test]
    fn test_kana_vocabulary() {
        let kana = Japanese::kana();
        assert_eq!(kana.len(), KANA);
        assert!(kana.contains(&"が".to_string()));
        assert!(kana.contains(&"ガ".to_string()));
        assert!(!kana.contains(&"ヴ".to_string()));
        assert!(kana.contains(&"ワー".to_string()));
        assert!(!kana.contains(&"ンー".to_string()));
        assert_eq!(to_katakana('ん'), Some('ン'));
        assert_eq!(to_katakana('a'), None);

        let dir = data_dir();
        let data = DataFiles::new(dir.path());
        let one = Japanese.extensions(Rank::Kana(1), &data).unwrap();
        assert_eq!(one.len(), KANA + KANJI_TOP);
        assert_eq!(Japanese.extensions(Rank::Kana(3), &data).unwrap(), kana);
    }

    #[test]
    fn test_basic_plan_appends_to_survivors() {
        let settings = FrontierSettings::default();
        let plan = Japanese.basic_plan(&settings);
        plan.validate().unwrap();
        let stages = plan.stages();
        assert_eq!(stages.len(), 3);
        assert_eq!(stages[0].expansion, Expansion::Exhaustive);
        assert_eq!(
            stages[2].expansion,
            Expansion::Append(Pruning::new(
                Rank::Kana(2),
                settings.basic_threshold,
                basic_rule(&settings)
            ))
        );
    }

    #[test]
    fn test_completions_and_separator() {
        assert_eq!(Japanese.separator(), "");
        let completions = Japanese.completions_for_initial("か");
        assert_eq!(completions.len(), 46);
        assert_eq!(completions[0], "かあ");
        assert_eq!(Japanese.completions_for_initial("z").len(), 26);
        assert!(Japanese.completions_for_initial("が").is_empty());
    }
}
