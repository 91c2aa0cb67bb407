//! HTTP implementations of the enrichment collaborators

use super::{CollectionPublisher, EnrichmentRow, EnrichmentStore};
use crate::error::{Error, Result};
use crate::network::HttpClient;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

/// Keywords per lookup request
const LOOKUP_CHUNK: usize = 100;

#[derive(Serialize)]
struct CollectionRequest<'a> {
    keyword: &'a str,
    usage_id: &'a str,
    domain: &'a str,
    purpose: &'a str,
}

/// Publishes collection requests to a queue gateway
pub struct HttpCollectionPublisher {
    client: HttpClient,
    endpoint: String,
    usage_id: String,
    domain: String,
}

impl HttpCollectionPublisher {
    pub fn new(
        client: HttpClient,
        endpoint: impl Into<String>,
        usage_id: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            usage_id: usage_id.into(),
            domain: domain.into(),
        }
    }
}

#[async_trait]
impl CollectionPublisher for HttpCollectionPublisher {
    async fn publish(&self, keyword: &str) -> Result<()> {
        let request = CollectionRequest {
            keyword,
            usage_id: &self.usage_id,
            domain: &self.domain,
            purpose: "adhoc",
        };
        let response = self.client.post_json(&self.endpoint, &request).await?;
        if !response.is_success() {
            return Err(Error::backend(format!(
                "queue gateway returned {} for {:?}",
                response.status, keyword
            )));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct LookupRequest<'a> {
    keywords: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    collected_since: Option<String>,
}

/// Looks up enrichment rows through the store's JSON endpoint
pub struct HttpEnrichmentStore {
    client: HttpClient,
    endpoint: String,
}

impl HttpEnrichmentStore {
    pub fn new(client: HttpClient, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl EnrichmentStore for HttpEnrichmentStore {
    async fn lookup(
        &self,
        keywords: &[String],
        collected_since: Option<NaiveDateTime>,
    ) -> Result<Vec<EnrichmentRow>> {
        // The store keeps keywords lower-cased
        let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        let since = collected_since.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string());

        let mut rows = Vec::new();
        for chunk in keywords.chunks(LOOKUP_CHUNK) {
            let request = LookupRequest {
                keywords: chunk,
                collected_since: since.clone(),
            };
            let response = self.client.post_json(&self.endpoint, &request).await?;
            if !response.is_success() {
                return Err(Error::backend(format!(
                    "enrichment store returned {}",
                    response.status
                )));
            }
            let mut chunk_rows: Vec<EnrichmentRow> = response.json()?;
            debug!("Enrichment lookup: {}/{} found", chunk_rows.len(), chunk.len());
            rows.append(&mut chunk_rows);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wiremock::matchers::{body_json, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_publish_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/queue"))
            .and(body_json(serde_json::json!({
                "keyword": "Apple Event",
                "usage_id": "intent",
                "domain": "issue_keyword",
                "purpose": "adhoc"
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let publisher = HttpCollectionPublisher::new(
            HttpClient::new().unwrap(),
            format!("{}/queue", server.uri()),
            "intent",
            "issue_keyword",
        );
        publisher.publish("Apple Event").await.unwrap();
    }

    #[tokio::test]
    async fn test_publish_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let publisher =
            HttpCollectionPublisher::new(HttpClient::new().unwrap(), server.uri(), "intent", "x");
        let err = publisher.publish("kw").await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_lookup_lowercases_and_parses_rows() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/lookup"))
            .and(body_partial_json(serde_json::json!({
                "keywords": ["apple event", "kw2"],
                "collected_since": "2024-03-10 00:00:00"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "keyword": "apple event",
                    "hash": "h1",
                    "json": "serp/h1.json",
                    "collected_at": "2024-03-10 01:02:03"
                }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let store = HttpEnrichmentStore::new(
            HttpClient::new().unwrap(),
            format!("{}/lookup", server.uri()),
        );
        let since = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let rows = store
            .lookup(&["Apple Event".to_string(), "KW2".to_string()], Some(since))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].hash, "h1");
        assert_eq!(rows[0].json, "serp/h1.json");
    }

    #[tokio::test]
    async fn test_lookup_is_chunked() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(3)
            .mount(&server)
            .await;

        let store = HttpEnrichmentStore::new(HttpClient::new().unwrap(), server.uri());
        let keywords: Vec<String> = (0..250).map(|i| format!("kw{}", i)).collect();
        assert!(store.lookup(&keywords, None).await.unwrap().is_empty());
    }
}
