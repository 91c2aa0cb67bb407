//! Declarative description of a staged frontier search

use crate::error::{Error, Result};
use crate::lang::Rank;

/// How valid suggestions of a candidate are counted toward its threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CountRule {
    /// Every valid suggestion counts
    Any,
    /// Valid suggestions whose text, with whitespace removed, starts with the
    /// whitespace-stripped query
    QueryPrefix,
    /// Valid suggestions whose first character after the base keyword has
    /// the candidate's extension as its initial
    NextInitial,
}

/// Survival gate applied to the candidates of an earlier stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pruning {
    /// Rank whose survivors feed this stage
    pub parent: Rank,
    /// Minimum counted valid suggestions (inclusive)
    pub threshold: usize,
    pub rule: CountRule,
}

impl Pruning {
    pub fn new(parent: Rank, threshold: usize, rule: CountRule) -> Self {
        Self {
            parent,
            threshold,
            rule,
        }
    }
}

/// How a stage produces its candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    /// Every seed crossed with every extension of the rank
    Exhaustive,
    /// Every survivor's full query crossed with every extension of the rank
    Append(Pruning),
    /// Extensions of the rank that start with a survivor's extension,
    /// attached to that survivor's base
    PrefixIndex(Pruning),
    /// Language completions of a survivor's initial-letter extension
    Initials(Pruning),
}

impl Expansion {
    pub fn pruning(&self) -> Option<&Pruning> {
        match self {
            Expansion::Exhaustive => None,
            Expansion::Append(p) | Expansion::PrefixIndex(p) | Expansion::Initials(p) => Some(p),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub rank: Rank,
    pub expansion: Expansion,
}

/// Ordered stages plus the seed bases the exhaustive stages start from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePlan {
    seeds: Vec<String>,
    stages: Vec<Stage>,
}

impl StagePlan {
    /// Plan rooted at the given seed bases
    pub fn new(seeds: Vec<String>) -> Self {
        Self {
            seeds,
            stages: Vec::new(),
        }
    }

    /// Plan rooted at the empty base
    pub fn unseeded() -> Self {
        Self::new(vec![String::new()])
    }

    pub fn exhaustive(self, rank: Rank) -> Self {
        self.stage(rank, Expansion::Exhaustive)
    }

    pub fn append(self, rank: Rank, pruning: Pruning) -> Self {
        self.stage(rank, Expansion::Append(pruning))
    }

    pub fn prefix_indexed(self, rank: Rank, pruning: Pruning) -> Self {
        self.stage(rank, Expansion::PrefixIndex(pruning))
    }

    pub fn initials(self, pruning: Pruning) -> Self {
        self.stage(Rank::Initials, Expansion::Initials(pruning))
    }

    fn stage(mut self, rank: Rank, expansion: Expansion) -> Self {
        self.stages.push(Stage { rank, expansion });
        self
    }

    pub fn seeds(&self) -> &[String] {
        &self.seeds
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Ranks must be unique and every pruned stage must name an earlier rank
    pub fn validate(&self) -> Result<()> {
        if self.seeds.is_empty() {
            return Err(Error::config("stage plan has no seeds"));
        }
        for (i, stage) in self.stages.iter().enumerate() {
            let earlier = &self.stages[..i];
            if earlier.iter().any(|s| s.rank == stage.rank) {
                return Err(Error::config(format!("rank {} planned twice", stage.rank)));
            }
            if let Some(pruning) = stage.expansion.pruning() {
                if !earlier.iter().any(|s| s.rank == pruning.parent) {
                    return Err(Error::config(format!(
                        "rank {} is pruned from rank {}, which does not run before it",
                        stage.rank, pruning.parent
                    )));
                }
            }
        }
        Ok(())
    }
}
