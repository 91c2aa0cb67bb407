//! HTTP client for talking to the suggestion, queue and enrichment backends

use crate::config::OutgoingSettings;
use crate::error::Result;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// HTTP client wrapper configured from [`OutgoingSettings`]
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
    user_agent: String,
    extra_headers: HashMap<String, String>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs_f64(settings.request_timeout))
            .pool_max_idle_per_host(settings.pool_maxsize)
            .gzip(true)
            .brotli(true);

        // SSL verification
        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        // Proxy settings
        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            default_timeout: Duration::from_secs_f64(settings.request_timeout),
            user_agent: format!("trend-finder/{}", crate::VERSION),
            extra_headers: settings.extra_headers.clone(),
        })
    }

    /// POST a JSON body with the default timeout
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<BackendResponse> {
        self.post_json_with_timeout(url, body, self.default_timeout)
            .await
    }

    /// POST a JSON body with a custom timeout
    pub async fn post_json_with_timeout<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        timeout: Duration,
    ) -> Result<BackendResponse> {
        let request = self.client.post(url).timeout(timeout).json(body);
        self.send(request).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<BackendResponse> {
        let mut request = request
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json");

        for (key, value) in &self.extra_headers {
            request = request.header(key, value);
        }

        let response = request.send().await?;
        Self::parse_response(response).await
    }

    /// Parse response into BackendResponse
    async fn parse_response(response: Response) -> Result<BackendResponse> {
        let status = response.status().as_u16();
        let url = response.url().to_string();

        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(key.to_string(), v.to_string());
            }
        }

        let text = response.text().await?;

        Ok(BackendResponse {
            status,
            headers,
            text,
            url,
        })
    }

    /// Current user agent
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

/// HTTP response from a backend request
#[derive(Debug)]
pub struct BackendResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Response body as text
    pub text: String,
    /// Response URL (after redirects)
    pub url: String,
}

impl BackendResponse {
    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.text)?)
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if response indicates rate limiting
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_client_creation() {
        let client = HttpClient::new();
        assert!(client.is_ok());
        assert!(client.unwrap().user_agent().starts_with("trend-finder/"));
    }

    #[tokio::test]
    async fn test_post_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(body_json(serde_json::json!({"q": "abc"})))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let response = client
            .post_json(
                &format!("{}/echo", server.uri()),
                &serde_json::json!({"q": "abc"}),
            )
            .await
            .unwrap();

        assert!(response.is_success());
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["ok"], true);
    }

    #[test]
    fn test_status_helpers() {
        let response = BackendResponse {
            status: 429,
            headers: HashMap::new(),
            text: String::new(),
            url: String::new(),
        };
        assert!(!response.is_success());
        assert!(response.is_rate_limited());
    }
}
