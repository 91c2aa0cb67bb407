//! Trend Finder: discovers trending search-box completions
//!
//! Autosuggest endpoints are queried with systematically generated prefixes.
//! Only prefixes that proved productive are extended further, and completions
//! flagged as trend suffixes are collected, filtered and de-duplicated against
//! recent history.

pub mod completion;
pub mod config;
pub mod error;
pub mod fanout;
pub mod frontier;
pub mod index;
pub mod lang;
pub mod metrics;
pub mod network;
pub mod pipeline;
pub mod storage;
pub mod suggest;
pub mod trend;

pub use config::Settings;
pub use error::{Error, Result};
pub use frontier::{FrontierController, StagePlan};
pub use lang::{LanguageProfile, Rank};
pub use pipeline::TrendRun;
pub use suggest::{Candidate, Suggestion, SuggestionResponse, Verdict};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
