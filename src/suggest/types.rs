//! Suggestion data model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Suggestion source queried through the autosuggest backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    #[default]
    Google,
    Youtube,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Google => "google",
            DataSource::Youtube => "youtube",
        }
    }

    pub fn all() -> [DataSource; 2] {
        [DataSource::Google, DataSource::Youtube]
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A query string sent to the autosuggest backend.
///
/// `query` is always `base + extension`; the split is kept so later stages
/// can extend either the whole query or only its base.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    base: String,
    extension: String,
    query: String,
}

impl Candidate {
    pub fn new(base: impl Into<String>, extension: impl Into<String>) -> Self {
        let base = base.into();
        let extension = extension.into();
        let query = format!("{}{}", base, extension);
        Self {
            base,
            extension,
            query,
        }
    }

    /// Candidate with an empty base
    pub fn bare(extension: impl Into<String>) -> Self {
        Self::new(String::new(), extension)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.query)
    }
}

/// One completion returned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub text: String,
    #[serde(default)]
    pub suggest_type: i32,
    #[serde(default)]
    pub suggest_subtypes: Vec<i32>,
}

impl Suggestion {
    pub fn new(text: impl Into<String>, suggest_type: i32, suggest_subtypes: Vec<i32>) -> Self {
        Self {
            text: text.into(),
            suggest_type,
            suggest_subtypes,
        }
    }
}

/// All suggestions returned for one candidate query, as persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionResponse {
    /// The candidate query that produced this response
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

impl SuggestionResponse {
    pub fn new(keyword: impl Into<String>, suggestions: Vec<Suggestion>) -> Self {
        Self {
            keyword: keyword.into(),
            suggestions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }
}

/// Parameters of one autosuggest call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestRequest {
    pub query: String,
    pub host_language: String,
    pub geo: String,
    pub data_source: DataSource,
    pub caller_id: String,
}
