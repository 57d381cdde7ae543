//! Notification channels.
//!
//! This module provides different channels for delivering new releases:
//! - Slack incoming webhooks
//! - Discord webhooks
//! - Generic webhooks (HTTP POST)

mod discord;
mod slack;
mod webhook;

use std::sync::Arc;

pub use discord::{DiscordChannel, DiscordConfig};
pub use slack::{SlackChannel, SlackConfig};
pub use webhook::{WebhookChannel, WebhookConfig};

use async_trait::async_trait;

use crate::Result;
use crate::domain::RepositorySnapshot;

/// Trait for notification channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Get the channel type name.
    fn channel_type(&self) -> &'static str;

    /// Check if the channel is enabled.
    fn is_enabled(&self) -> bool;

    /// Deliver a new release through this channel.
    async fn send(&self, repository: &RepositorySnapshot) -> Result<()>;
}

/// Channel configuration wrapper.
#[derive(Debug, Clone)]
pub enum ChannelConfig {
    /// Slack incoming webhook.
    Slack(SlackConfig),
    /// Discord webhook channel.
    Discord(DiscordConfig),
    /// Generic webhook channel.
    Webhook(WebhookConfig),
}

impl ChannelConfig {
    /// Get the channel type name.
    pub fn channel_type(&self) -> &'static str {
        match self {
            Self::Slack(_) => "slack",
            Self::Discord(_) => "discord",
            Self::Webhook(_) => "webhook",
        }
    }

    /// Check if the channel is enabled.
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Slack(c) => c.enabled,
            Self::Discord(c) => c.enabled,
            Self::Webhook(c) => c.enabled,
        }
    }

    /// Build the runtime channel.
    pub fn build(&self) -> Arc<dyn NotificationChannel> {
        match self {
            Self::Slack(c) => Arc::new(SlackChannel::new(c.clone())),
            Self::Discord(c) => Arc::new(DiscordChannel::new(c.clone())),
            Self::Webhook(c) => Arc::new(WebhookChannel::new(c.clone())),
        }
    }
}

/// One-line summary shared by all channels.
pub(crate) fn headline(repository: &RepositorySnapshot) -> String {
    format!(
        "New release of {}: {}",
        repository.full_name(),
        release_label(repository)
    )
}

/// Release name, falling back to the last URL segment (the tag) when unnamed.
pub(crate) fn release_label(repository: &RepositorySnapshot) -> &str {
    let release = &repository.release;
    if !release.name.trim().is_empty() {
        return &release.name;
    }
    release
        .url
        .rsplit('/')
        .next()
        .filter(|tag| !tag.is_empty())
        .unwrap_or("unnamed release")
}
