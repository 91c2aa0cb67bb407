//! Autosuggest backend implementations

use super::types::{DataSource, SuggestRequest, SuggestionResponse};
use crate::error::{Error, Result};
use crate::network::HttpClient;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Trait for autosuggest backends
#[async_trait]
pub trait AutosuggestBackend: Send + Sync {
    /// Backend name
    fn name(&self) -> &str;

    /// Fetch suggestions for one query.
    ///
    /// Every error is treated as transient by the caller and retried.
    async fn suggest(&self, request: &SuggestRequest) -> Result<SuggestionResponse>;
}

/// Request body of the suggestion API
#[derive(Debug, Serialize)]
struct SuggestPayload<'a> {
    q: &'a str,
    hl: &'a str,
    gl: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ds: Option<&'a str>,
    usage_id: &'a str,
}

/// JSON-over-HTTP suggestion API
pub struct SuggestApi {
    client: HttpClient,
    endpoint: String,
    timeout: Duration,
}

impl SuggestApi {
    pub fn new(client: HttpClient, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        }
    }
}

#[async_trait]
impl AutosuggestBackend for SuggestApi {
    fn name(&self) -> &str {
        "suggest_api"
    }

    async fn suggest(&self, request: &SuggestRequest) -> Result<SuggestionResponse> {
        // Google is the API default, so only youtube is named explicitly
        let ds = match request.data_source {
            DataSource::Youtube => Some(request.data_source.as_str()),
            DataSource::Google => None,
        };
        let payload = SuggestPayload {
            q: &request.query,
            hl: &request.host_language,
            gl: &request.geo,
            ds,
            usage_id: &request.caller_id,
        };

        let response = self
            .client
            .post_json_with_timeout(&self.endpoint, &payload, self.timeout)
            .await?;

        if response.is_rate_limited() {
            debug!("Suggest API rate limited {:?}", request.query);
        }
        if !response.is_success() {
            return Err(Error::backend(format!(
                "suggest API returned {} for {:?}",
                response.status, request.query
            )));
        }

        let mut parsed: SuggestionResponse = response.json().map_err(|e| {
            Error::backend(format!("malformed suggest body for {:?}: {}", request.query, e))
        })?;

        // Results are keyed by the candidate we sent, not the backend's echo
        parsed.keyword = request.query.clone();
        Ok(parsed)
    }
}
