//! Delivery of run reports

use super::RunReport;
use crate::error::{Error, Result};
use crate::network::HttpClient;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info, warn};

/// Consumer of end-of-run reports
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, report: &RunReport) -> Result<()>;
}

/// Writes reports to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, report: &RunReport) -> Result<()> {
        if report.is_success() {
            info!("{}", report.message());
        } else {
            warn!("{}", report.message());
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

/// Posts reports to a chat webhook, then logs them
pub struct WebhookNotifier {
    client: HttpClient,
    url: String,
}

impl WebhookNotifier {
    pub fn new(client: HttpClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, report: &RunReport) -> Result<()> {
        LogNotifier.notify(report).await?;

        let message = report.message();
        let response = self
            .client
            .post_json(&self.url, &WebhookPayload { text: &message })
            .await?;
        if !response.is_success() {
            error!("Webhook rejected report for {}: {}", report.job_id, response.status);
            return Err(Error::backend(format!(
                "webhook returned {}",
                response.status
            )));
        }
        Ok(())
    }
}
