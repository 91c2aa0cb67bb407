//! Korean

use super::{
    alphabets, basic_rule, cross, digits, latin_completions, unsupported, DataFiles,
    LanguageProfile, Rank, RankInfo,
};
use crate::config::FrontierSettings;
use crate::error::Result;
use crate::frontier::{Pruning, StagePlan};
use std::collections::HashSet;

/// The 19 initial consonants, in Unicode syllable order
pub const CHOSEONG: [char; 19] = [
    'ㄱ', 'ㄲ', 'ㄴ', 'ㄷ', 'ㄸ', 'ㄹ', 'ㅁ', 'ㅂ', 'ㅃ', 'ㅅ', 'ㅆ', 'ㅇ', 'ㅈ', 'ㅉ', 'ㅊ', 'ㅋ', 'ㅌ',
    'ㅍ', 'ㅎ',
];

/// Open syllables (no final consonant) that carry most query traffic
const SMALL_SYLLABLES: &str = concat!(
    "가개거게겨계고과괴교구궈궤귀규그기까깨꺼께껴꼬꽤꾀꾸꿔꿰뀌끄끼나내냐너네녀노놔뇌",
    "뇨누눠뉘뉴느늬니다대더데뎌도돼되두둬뒤듀드디따때떠떼또뚜뛰뜨띄띠라래랴러레려례로",
    "뢰료루뤄뤼류르리마매머메며모묘무뭐뮤므미바배버베벼보봐부뷔뷰브비빠빼뻐뼈뽀뾰뿌쁘",
    "삐사새샤섀서세셔셰소쇄쇠쇼수쉐쉬슈스시싸써쎄쏘쐐쑤쓰씌씨아애야얘어에여예오와왜외",
    "요우워웨위유으의이자재저제져조좌죄죠주줘쥐쥬즈지짜째쩌쪼쯔찌차채처체쳐초최추춰췌",
    "취츄츠치카캐커케켜코콰쾌쿄쿠쿼퀘퀴큐크키타태터테텨토퇴투퉈튀튜트티파패퍼페펴폐포",
    "표푸퓨프피하해허헤혀혜호화회효후훼휘휴흐희히",
);

const SMALL_COUNT: usize = 262;
const CHARACTERS_FILE: &str = "characters.txt";

const SYLLABLE_FIRST: u32 = 0xAC00;
const SYLLABLE_LAST: u32 = 0xD7A3;
const SYLLABLES_PER_INITIAL: u32 = 588;

#[derive(Debug, Clone, Copy, Default)]
pub struct Korean;

impl Korean {
    fn small() -> Vec<String> {
        SMALL_SYLLABLES.chars().map(String::from).collect()
    }

    fn small_with_space() -> Vec<String> {
        let mut set = Self::small();
        set.push(" ".to_string());
        set
    }

    /// Choseong, latin letters and digits
    fn letters() -> Vec<String> {
        let mut letters: Vec<String> = CHOSEONG.iter().copied().map(String::from).collect();
        letters.extend(alphabets());
        letters.extend(digits());
        letters
    }

    fn characters(data: &DataFiles) -> Result<Vec<String>> {
        data.lines("ko", CHARACTERS_FILE)
    }
}

/// Collapse whitespace runs to one space
fn normalize_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

/// Choseong of a precomposed Hangul syllable
pub fn choseong(ch: char) -> Option<char> {
    let code = ch as u32;
    if (SYLLABLE_FIRST..=SYLLABLE_LAST).contains(&code) {
        let index = ((code - SYLLABLE_FIRST) / SYLLABLES_PER_INITIAL) as usize;
        CHOSEONG.get(index).copied()
    } else {
        None
    }
}

impl LanguageProfile for Korean {
    fn code(&self) -> &'static str {
        "ko"
    }

    fn geo(&self) -> &'static str {
        "kr"
    }

    fn serp_location(&self) -> &'static str {
        "South Korea"
    }

    fn ranks(&self) -> Vec<RankInfo> {
        let small = SMALL_COUNT;
        vec![
            RankInfo::exact(Rank::Level(0), 1),
            RankInfo::exact(Rank::Level(1), 55),
            RankInfo::data(Rank::Level(2), CHARACTERS_FILE),
            RankInfo::exact(Rank::Small(2), small),
            RankInfo::data(Rank::Level(3), CHARACTERS_FILE),
            RankInfo::exact(Rank::Small(3), small * 55),
            RankInfo::data(Rank::Level(4), CHARACTERS_FILE),
            RankInfo::exact(Rank::Small(4), small * small),
            RankInfo::exact(Rank::SmallWithSpace(4), (small + 1) * small),
            RankInfo::data(Rank::Level(5), CHARACTERS_FILE),
            RankInfo::exact(Rank::Small(5), small * small * small),
            RankInfo::exact(
                Rank::SmallWithSpace(5),
                small * small * small + 2 * small * small + small,
            ),
        ]
    }

    fn extensions(&self, rank: Rank, data: &DataFiles) -> Result<Vec<String>> {
        match rank {
            Rank::Level(0) => Ok(vec![String::new()]),
            Rank::Level(1) => Ok(Self::letters()),
            Rank::Level(2) => Self::characters(data),
            Rank::Small(2) => Ok(Self::small()),
            Rank::Level(3) => Ok(cross(&Self::characters(data)?, &Self::letters())),
            Rank::Small(3) => Ok(cross(&Self::small(), &Self::letters())),
            Rank::Level(4) => {
                let chars = Self::characters(data)?;
                Ok(cross(&chars, &chars))
            }
            Rank::Small(4) => {
                let small = Self::small();
                Ok(cross(&small, &small))
            }
            Rank::SmallWithSpace(4) => {
                let set = Self::small_with_space();
                Ok(cross(&set, &set)
                    .into_iter()
                    .filter(|w| !w.starts_with(' '))
                    .collect())
            }
            Rank::Level(5) => {
                let chars = Self::characters(data)?;
                Ok(cross(&cross(&chars, &chars), &chars))
            }
            Rank::Small(5) => {
                let small = Self::small();
                Ok(cross(&cross(&small, &small), &small))
            }
            Rank::SmallWithSpace(5) => {
                let set = Self::small_with_space();
                let mut seen = HashSet::new();
                Ok(cross(&cross(&set, &set), &set)
                    .into_iter()
                    .filter(|w| !w.starts_with(' '))
                    .map(|w| normalize_spaces(&w))
                    .filter(|w| seen.insert(w.clone()))
                    .collect())
            }
            other => Err(unsupported(self.code(), other)),
        }
    }

    fn initial_of(&self, ch: char) -> char {
        choseong(ch).unwrap_or(ch)
    }

    fn completions_for_initial(&self, initial: &str) -> Vec<String> {
        let mut chars = initial.chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) if CHOSEONG.contains(&letter) => SMALL_SYLLABLES
                .chars()
                .filter(|&syllable| choseong(syllable) == Some(letter))
                .map(String::from)
                .collect(),
            _ => latin_completions(initial),
        }
    }

    fn basic_plan(&self, settings: &FrontierSettings) -> StagePlan {
        let rule = basic_rule(settings);
        let threshold = settings.basic_threshold;
        StagePlan::unseeded()
            .exhaustive(Rank::Level(1))
            .exhaustive(Rank::Small(2))
            .exhaustive(Rank::Small(3))
            .prefix_indexed(Rank::Small(4), Pruning::new(Rank::Small(2), threshold, rule))
            .prefix_indexed(Rank::Small(5), Pruning::new(Rank::Small(4), threshold, rule))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_set() {
        let small = Korean::small();
        assert_eq!(small.len(), SMALL_COUNT);
        let unique: HashSet<_> = small.iter().collect();
        assert_eq!(unique.len(), SMALL_COUNT);
    }

    #[test]
    fn test_choseong() {
        assert_eq!(choseong('가'), Some('ㄱ'));
        assert_eq!(choseong('까'), Some('ㄲ'));
        assert_eq!(choseong('힣'), Some('ㅎ'));
        assert_eq!(choseong('아'), Some('ㅇ'));
        assert_eq!(choseong('a'), None);
        assert_eq!(Korean.initial_of('a'), 'a');
    }

    #[test]
    fn test_initial_completions() {
        let giyeok = Korean.completions_for_initial("ㄱ");
        assert!(giyeok.contains(&"가".to_string()));
        assert!(giyeok.iter().all(|s| choseong(s.chars().next().unwrap()) == Some('ㄱ')));

        let total: usize = CHOSEONG
            .iter()
            .map(|c| Korean.completions_for_initial(&c.to_string()).len())
            .sum();
        assert_eq!(total, SMALL_COUNT);

        assert_eq!(Korean.completions_for_initial("b").len(), 26);
        assert!(Korean.completions_for_initial("가").is_empty());
    }

    #[test]
    fn test_with_space_ranks() {
        let data = DataFiles::new("/nonexistent");
        let four = Korean.extensions(Rank::SmallWithSpace(4), &data).unwrap();
        assert!(four.contains(&"가 ".to_string()));
        assert!(four.contains(&"가나".to_string()));
        assert!(four.iter().all(|w| !w.starts_with(' ')));
    }

    #[test]
    fn test_normalize_spaces() {
        assert_eq!(normalize_spaces("가  "), "가 ");
        assert_eq!(normalize_spaces("가 나"), "가 나");
    }

    #[test]
    fn test_character_ranks_need_data_file() {
        let data = DataFiles::new("/nonexistent");
        assert!(Korean.extensions(Rank::Level(2), &data).is_err());
        assert!(Korean.extensions(Rank::Kanji300(1), &data).is_err());
    }
}
