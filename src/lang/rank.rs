//! Vocabulary rank identifiers

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A named vocabulary set of a language.
///
/// Plain levels are numeric; the variants trade coverage for cardinality
/// (a reduced syllable set, or a base alphabet extended with kanji lists).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rank {
    /// `0`, `1`, `2`, ...
    Level(u8),
    /// `2_small`, `3_small`, ...
    Small(u8),
    /// `4_small_with_space`, `5_small_with_space`
    SmallWithSpace(u8),
    /// `1_new`, `2_new`, `3_new`
    New(u8),
    /// `1_kanji_300`, `2_kanji_300`, `3_kanji_300`
    Kanji300(u8),
    /// `1_kana`, `2_kana`, `3_kana`: hiragana and katakana syllables
    Kana(u8),
    /// Completions grouped by initial letter, used by target runs
    Initials,
}

impl Rank {
    /// Numeric depth of the rank
    pub fn depth(&self) -> u8 {
        match self {
            Rank::Level(n)
            | Rank::Small(n)
            | Rank::SmallWithSpace(n)
            | Rank::New(n)
            | Rank::Kanji300(n)
            | Rank::Kana(n) => *n,
            Rank::Initials => 2,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rank::Level(n) => write!(f, "{}", n),
            Rank::Small(n) => write!(f, "{}_small", n),
            Rank::SmallWithSpace(n) => write!(f, "{}_small_with_space", n),
            Rank::New(n) => write!(f, "{}_new", n),
            Rank::Kanji300(n) => write!(f, "{}_kanji_300", n),
            Rank::Kana(n) => write!(f, "{}_kana", n),
            Rank::Initials => f.write_str("initials"),
        }
    }
}

impl FromStr for Rank {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == "initials" {
            return Ok(Rank::Initials);
        }
        let (head, tail) = match s.split_once('_') {
            Some((head, tail)) => (head, Some(tail)),
            None => (s, None),
        };
        let depth: u8 = head
            .parse()
            .map_err(|_| Error::config(format!("unknown rank {:?}", s)))?;
        match tail {
            None => Ok(Rank::Level(depth)),
            Some("small") => Ok(Rank::Small(depth)),
            Some("small_with_space") => Ok(Rank::SmallWithSpace(depth)),
            Some("new") => Ok(Rank::New(depth)),
            Some("kanji_300") => Ok(Rank::Kanji300(depth)),
            Some("kana") => Ok(Rank::Kana(depth)),
            Some(_) => Err(Error::config(format!("unknown rank {:?}", s))),
        }
    }
}
