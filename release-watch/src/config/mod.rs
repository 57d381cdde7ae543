//! Command line and environment configuration.
//!
//! Every flag has an environment fallback, and `.env` files are loaded by
//! `main` before parsing. [`AppConfig::from_args`] validates the raw
//! arguments into typed configuration before anything starts.

use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use clap::Parser;
use regex::Regex;

use crate::domain::{WatchKey, parse_watch_list};
use crate::logging::{LogFormat, LoggingOptions};
use crate::monitor::ReleaseMonitorConfig;
use crate::notification::{ChannelConfig, DiscordConfig, SlackConfig, WebhookConfig};
use crate::{Error, Result};

static INTERVAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:\d+(?:\.\d*)?|\.\d+)(?:ns|us|ms|s|m|h))+$").unwrap()
});

static INTERVAL_PART_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d*)?|\.\d+)(ns|us|ms|s|m|h)").unwrap());

/// Watch GitHub repositories and notify about new releases.
#[derive(Parser, Clone)]
#[command(name = "release-watch", version, about, long_about = None)]
pub struct Args {
    /// GitHub personal access token used for the GraphQL API
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Repositories to watch (owner/name or GitHub URL), comma separated or repeated
    #[arg(
        short = 'r',
        long = "repository",
        env = "REPOSITORIES",
        value_delimiter = ','
    )]
    pub repositories: Vec<String>,

    /// Delay between two checks, e.g. 1h, 1.5h, 1h30m, 45s, 500ms or plain seconds
    #[arg(short, long, env = "INTERVAL", default_value = "1h")]
    pub interval: String,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Console log format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Also write daily-rotated log files to this directory
    #[arg(long, env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// File holding the last seen release of every repository
    #[arg(long, env = "RELEASES_FILE", default_value = "releases.json")]
    pub releases_file: PathBuf,

    /// Slack incoming webhook URL
    #[arg(long, env = "SLACK_HOOK", hide_env_values = true)]
    pub slack_hook: Option<String>,

    /// Discord webhook URL
    #[arg(long, env = "DISCORD_WEBHOOK", hide_env_values = true)]
    pub discord_webhook: Option<String>,

    /// Generic webhook URL receiving a JSON payload per release
    #[arg(long, env = "WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    /// Bearer token sent to the generic webhook
    #[arg(long, env = "WEBHOOK_TOKEN", hide_env_values = true)]
    pub webhook_token: Option<String>,

    /// Do not notify about alpha, beta, rc and other pre-releases
    #[arg(
        long,
        env = "IGNORE_NONSTABLE",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub ignore_nonstable: bool,

    /// GitHub GraphQL endpoint
    #[arg(long, env = "GITHUB_ENDPOINT", default_value = github_releases::DEFAULT_ENDPOINT)]
    pub github_endpoint: String,
}

impl Args {
    pub fn logging_options(&self) -> LoggingOptions {
        LoggingOptions {
            level: self.log_level.clone(),
            format: self.log_format,
            dir: self.log_dir.clone(),
        }
    }
}

/// Validated application configuration.
#[derive(Clone)]
pub struct AppConfig {
    pub token: String,
    pub github_endpoint: String,
    pub monitor: ReleaseMonitorConfig,
    pub releases_file: PathBuf,
    pub channels: Vec<ChannelConfig>,
    pub ignore_nonstable: bool,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("token", &"<redacted>")
            .field("github_endpoint", &self.github_endpoint)
            .field("monitor", &self.monitor)
            .field("releases_file", &self.releases_file)
            .field("channels", &self.channels.len())
            .field("ignore_nonstable", &self.ignore_nonstable)
            .finish()
    }
}

impl AppConfig {
    pub fn from_args(args: &Args) -> Result<Self> {
        let token = non_empty(&args.token)
            .ok_or_else(|| Error::config("a GitHub token is required (--token or GITHUB_TOKEN)"))?
            .to_string();

        let repositories: Vec<WatchKey> = parse_watch_list(&args.repositories)?;
        let poll_interval = parse_interval(&args.interval)?;

        let mut channels = Vec::new();
        if let Some(url) = non_empty(&args.slack_hook) {
            channels.push(ChannelConfig::Slack(SlackConfig {
                enabled: true,
                webhook_url: url.to_string(),
            }));
        }
        if let Some(url) = non_empty(&args.discord_webhook) {
            channels.push(ChannelConfig::Discord(DiscordConfig {
                enabled: true,
                webhook_url: url.to_string(),
            }));
        }
        if let Some(url) = non_empty(&args.webhook_url) {
            channels.push(ChannelConfig::Webhook(WebhookConfig {
                enabled: true,
                url: url.to_string(),
                token: non_empty(&args.webhook_token).map(str::to_string),
            }));
        }

        Ok(Self {
            token,
            github_endpoint: args.github_endpoint.clone(),
            monitor: ReleaseMonitorConfig {
                repositories,
                poll_interval,
            },
            releases_file: args.releases_file.clone(),
            channels,
            ignore_nonstable: args.ignore_nonstable,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Parse a polling interval such as `1h`, `1.5h`, `1h30m`, `45s`, `500ms`
/// or `90`.
///
/// A sequence of decimal numbers, each with a unit (`h`, `m`, `s`, `ms`,
/// `us`, `ns`). Bare numbers are seconds. A zero interval is rejected.
pub fn parse_interval(input: &str) -> Result<Duration> {
    let input = input.trim();
    let invalid = || Error::config(format!("invalid interval '{input}'"));

    let secs = if !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()) {
        input.parse::<u64>().map_err(|_| invalid())? as f64
    } else {
        if !INTERVAL_REGEX.is_match(input) {
            return Err(invalid());
        }

        let mut total = 0.0;
        for caps in INTERVAL_PART_REGEX.captures_iter(input) {
            let value: f64 = caps[1].parse().map_err(|_| invalid())?;
            let unit = match &caps[2] {
                "h" => 3600.0,
                "m" => 60.0,
                "s" => 1.0,
                "ms" => 1e-3,
                "us" => 1e-6,
                _ => 1e-9,
            };
            total += value * unit;
        }
        total
    };

    let interval = Duration::try_from_secs_f64(secs).map_err(|_| invalid())?;
    if interval.is_zero() {
        return Err(Error::config("interval must be greater than zero"));
    }
    Ok(interval)
}
