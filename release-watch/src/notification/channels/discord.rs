//! Discord webhook notification channel.
//!
//! Rate limits are not hardcoded. A 429 response is retried after the
//! `Retry-After` (or `X-RateLimit-Reset-After`) delay.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

use super::{NotificationChannel, headline, release_label};
use crate::Result;
use crate::domain::RepositorySnapshot;

/// Maximum number of attempts for rate-limited requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Discord rejects embed descriptions longer than this.
const MAX_EMBED_DESCRIPTION_CHARS: usize = 4096;

const EMBED_COLOR: u32 = 0x2ecc71;

/// Name the webhook posts under.
const WEBHOOK_USERNAME: &str = "release-watch";

/// Discord channel configuration.
#[derive(Debug, Clone, Default)]
pub struct DiscordConfig {
    /// Whether the channel is enabled.
    pub enabled: bool,
    /// Discord webhook URL.
    pub webhook_url: String,
}

/// Discord notification channel.
pub struct DiscordChannel {
    config: DiscordConfig,
    client: Client,
}

impl DiscordChannel {
    /// Create a new Discord channel.
    pub fn new(config: DiscordConfig) -> Self {
        github_releases::install_rustls_provider();
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Build the webhook payload for a new release.
    fn build_payload(&self, repository: &RepositorySnapshot) -> serde_json::Value {
        let release = &repository.release;
        let description: String = release
            .description
            .chars()
            .take(MAX_EMBED_DESCRIPTION_CHARS)
            .collect();

        let embed = json!({
            "title": headline(repository),
            "url": release.url,
            "description": description,
            "color": EMBED_COLOR,
            "timestamp": release.published_at.to_rfc3339(),
            "footer": {
                "text": format!("{} | {}", repository.full_name(), release_label(repository))
            }
        });

        json!({
            "username": WEBHOOK_USERNAME,
            "embeds": [embed]
        })
    }

    /// Send request with rate limit handling.
    async fn send_with_retry(&self, payload: &serde_json::Value) -> Result<()> {
        let mut attempts = 0;

        loop {
            attempts += 1;

            let response = self
                .client
                .post(&self.config.webhook_url)
                .json(payload)
                .send()
                .await
                .map_err(|e| {
                    crate::Error::notification(format!("Discord request failed: {}", e))
                })?;

            let status = response.status();

            if status.is_success() {
                return Ok(());
            }

            if status.as_u16() == 429 {
                let retry_after = parse_retry_after(&response);

                if attempts >= MAX_RATE_LIMIT_RETRIES {
                    warn!(
                        "Discord rate limit: max retries ({}) exceeded, last retry_after was {:?}",
                        MAX_RATE_LIMIT_RETRIES, retry_after
                    );
                    return Err(crate::Error::notification(format!(
                        "Discord rate limit exceeded after {} retries",
                        MAX_RATE_LIMIT_RETRIES
                    )));
                }

                let wait_duration = retry_after.unwrap_or(Duration::from_secs(1));
                debug!(
                    "Discord rate limited (429), waiting {:?} before retry (attempt {}/{})",
                    wait_duration, attempts, MAX_RATE_LIMIT_RETRIES
                );
                tokio::time::sleep(wait_duration).await;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            warn!("Discord webhook failed: {} - {}", status, body);
            return Err(crate::Error::notification(format!(
                "Discord webhook failed: {} - {}",
                status, body
            )));
        }
    }
}

/// Parse the retry delay from a 429 response.
fn parse_retry_after(response: &reqwest::Response) -> Option<Duration> {
    ["Retry-After", "X-RateLimit-Reset-After"]
        .iter()
        .filter_map(|name| response.headers().get(*name))
        .filter_map(|value| value.to_str().ok()?.parse::<f64>().ok())
        .find(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
}

#[async_trait]
impl NotificationChannel for DiscordChannel {
    fn channel_type(&self) -> &'static str {
        "discord"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.webhook_url.is_empty()
    }

    async fn send(&self, repository: &RepositorySnapshot) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let payload = self.build_payload(repository);
        self.send_with_retry(&payload).await?;

        debug!("Discord notification sent: {}", repository.full_name());
        Ok(())
    }
}
