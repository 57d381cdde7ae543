//! Slack incoming-webhook notification channel.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

use super::{NotificationChannel, headline, release_label};
use crate::Result;
use crate::domain::RepositorySnapshot;

/// Attachment color bar (Slack "good" green).
const ATTACHMENT_COLOR: &str = "#2eb886";

/// Request timeout for Slack deliveries.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Slack channel configuration.
#[derive(Debug, Clone, Default)]
pub struct SlackConfig {
    /// Whether the channel is enabled.
    pub enabled: bool,
    /// Incoming webhook URL.
    pub webhook_url: String,
}

/// Slack notification channel.
pub struct SlackChannel {
    config: SlackConfig,
    client: Client,
}

impl SlackChannel {
    /// Create a new Slack channel.
    pub fn new(config: SlackConfig) -> Self {
        github_releases::install_rustls_provider();
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self { config, client }
    }

    /// Build the webhook payload for a new release.
    fn build_payload(&self, repository: &RepositorySnapshot) -> serde_json::Value {
        let release = &repository.release;
        let text = headline(repository);

        json!({
            "text": text,
            "attachments": [{
                "fallback": text,
                "color": ATTACHMENT_COLOR,
                "author_name": repository.full_name(),
                "author_link": repository.url,
                "title": release_label(repository),
                "title_link": release.url,
                "text": release.description,
                "footer": repository.description,
                "ts": release.published_at.timestamp(),
            }]
        })
    }
}

#[async_trait]
impl NotificationChannel for SlackChannel {
    fn channel_type(&self) -> &'static str {
        "slack"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.webhook_url.is_empty()
    }

    async fn send(&self, repository: &RepositorySnapshot) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let payload = self.build_payload(repository);
        let response = self
            .client
            .post(&self.config.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| crate::Error::notification(format!("Slack request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Slack webhook failed: {} - {}", status, body);
            return Err(crate::Error::notification(format!(
                "Slack webhook failed: {} - {}",
                status, body
            )));
        }

        debug!("Slack notification sent: {}", repository.full_name());
        Ok(())
    }
}
