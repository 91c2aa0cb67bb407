//! Autosuggest data model, validity classification and backends

mod backend;
pub mod classifier;
mod types;

pub use backend::{AutosuggestBackend, SuggestApi};
pub use classifier::{classify, is_trend_keyword, is_trend_shaped, NoiseKind, Verdict};
pub use types::{Candidate, DataSource, SuggestRequest, Suggestion, SuggestionResponse};
