//! Notification system module.
//!
//! Delivers new-release events to human-facing channels (Slack, Discord,
//! generic webhooks). Delivery is best effort: a failed send is logged and
//! dropped, since the release was accepted and recorded as seen.
//!
//! # Example
//!
//! ```ignore
//! use release_watch::notification::{Dispatcher, ChannelConfig, SlackConfig};
//!
//! let channels = vec![ChannelConfig::Slack(SlackConfig {
//!     enabled: true,
//!     webhook_url: "https://hooks.slack.com/services/...".to_string(),
//! })];
//!
//! let dispatcher = Dispatcher::from_configs(&channels, true);
//! tokio::spawn(dispatcher.run(rx, cancel.clone()));
//! ```

pub mod channels;
mod dispatcher;
mod stability;

pub use channels::{ChannelConfig, DiscordConfig, NotificationChannel, SlackConfig, WebhookConfig};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use stability::is_nonstable;
