//! Generic webhook notification channel.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, header::HeaderMap};
use serde_json::json;
use tracing::{debug, warn};

use super::{NotificationChannel, headline};
use crate::Result;
use crate::domain::RepositorySnapshot;

/// Request timeout for webhook deliveries.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Webhook channel configuration.
#[derive(Debug, Clone, Default)]
pub struct WebhookConfig {
    /// Whether the channel is enabled.
    pub enabled: bool,
    /// Webhook URL.
    pub url: String,
    /// Optional bearer token.
    pub token: Option<String>,
}

/// Generic webhook notification channel.
pub struct WebhookChannel {
    config: WebhookConfig,
    client: Client,
}

impl WebhookChannel {
    /// Create a new Webhook channel.
    pub fn new(config: WebhookConfig) -> Self {
        github_releases::install_rustls_provider();
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self { config, client }
    }

    /// Build the request headers.
    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.config.token {
            match format!("Bearer {}", token).parse() {
                Ok(value) => {
                    headers.insert(reqwest::header::AUTHORIZATION, value);
                }
                Err(_) => warn!("Webhook token is not a valid header value, sending without it"),
            }
        }
        headers
    }

    /// Build the JSON payload.
    fn build_payload(&self, repository: &RepositorySnapshot) -> serde_json::Value {
        json!({
            "event_type": "new_release",
            "title": headline(repository),
            "description": repository.release.description,
            "timestamp": Utc::now().to_rfc3339(),
            "repository": repository,
        })
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn channel_type(&self) -> &'static str {
        "webhook"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.url.is_empty()
    }

    async fn send(&self, repository: &RepositorySnapshot) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let payload = self.build_payload(repository);
        let headers = self.build_headers();

        let request = self
            .client
            .post(&self.config.url)
            .headers(headers)
            .json(&payload);

        let response = request.send().await.map_err(|e| {
            crate::Error::notification(format!("Webhook request failed: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Webhook failed: {} - {}", status, body);
            return Err(crate::Error::notification(format!(
                "Webhook failed: {} - {}",
                status, body
            )));
        }

        debug!("Webhook notification sent: {}", repository.full_name());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::channels::test_support;

    #[test]
    fn test_webhook_config_default() {
        let config = WebhookConfig::default();
        assert!(!config.enabled);
        assert!(config.url.is_empty());
        assert!(config.token.is_none());
    }

    #[test]
    fn test_build_payload() {
        let channel = WebhookChannel::new(WebhookConfig::default());
        let payload = channel.build_payload(&test_support::repository("v1.1.0"));

        assert_eq!(payload["event_type"], "new_release");
        assert_eq!(payload["repository"]["owner"], "acme");
        assert_eq!(payload["repository"]["release"]["name"], "v1.1.0");
        assert_eq!(
            payload["repository"]["release"]["publishedAt"],
            "2024-02-01T00:00:00Z"
        );
    }

    #[test]
    fn test_build_headers_with_bearer() {
        let channel = WebhookChannel::new(WebhookConfig {
            enabled: true,
            url: "https://example.com/webhook".to_string(),
            token: Some("test-token".to_string()),
        });
        let headers = channel.build_headers();

        assert_eq!(
            headers.get(reqwest::header::AUTHORIZATION).unwrap(),
            "Bearer test-token"
        );
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_build_headers_without_token() {
        let channel = WebhookChannel::new(WebhookConfig {
            enabled: true,
            url: "https://example.com/webhook".to_string(),
            token: None,
        });
        assert!(channel.build_headers().is_empty());
    }
}
