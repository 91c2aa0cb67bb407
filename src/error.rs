//! Error types shared across the crate

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while running a trend discovery job
#[derive(Debug, Error)]
pub enum Error {
    /// Unsupported language/rank, missing vocabulary data, bad settings.
    /// Fatal: the run is aborted without retry.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transient backend failure (timeout, non-2xx, malformed body)
    #[error("backend error: {0}")]
    Backend(String),

    /// Durable storage could not be read or written
    #[error("storage error: {0}")]
    Storage(String),

    /// The run was cancelled before it could finish
    #[error("run cancelled")]
    Cancelled,

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Error::Backend(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Error::Storage(msg.into())
    }

    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Backend(_) | Error::Http(_) | Error::Json(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(Error::backend("502").is_transient());
        assert!(!Error::config("unknown language xx").is_transient());
        assert!(!Error::storage("disk full").is_transient());
        assert!(!Error::Cancelled.is_transient());
    }

    #[test]
    fn test_display() {
        let err = Error::config("rank 9 is not defined for en");
        assert_eq!(
            err.to_string(),
            "configuration error: rank 9 is not defined for en"
        );
    }
}
