use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

const GITHUB_PREFIXES: [&str; 3] = ["https://github.com/", "http://github.com/", "github.com/"];

/// `owner/name` identity of a watched repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchKey {
    owner: String,
    name: String,
}

impl WatchKey {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let owner = owner.into();
        let name = name.into();
        for (part, value) in [("owner", &owner), ("name", &name)] {
            if value.is_empty() {
                return Err(Error::config(format!("repository {part} must not be empty")));
            }
            if value.contains('/') || value.chars().any(char::is_whitespace) {
                return Err(Error::config(format!(
                    "invalid repository {part} '{value}'"
                )));
            }
        }
        Ok(Self { owner, name })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `owner/name` string used as the persisted state key.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for WatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for WatchKey {
    type Err = Error;

    /// Accepts `owner/name` as well as `https://github.com/owner/name(.git)`.
    fn from_str(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let mut rest = GITHUB_PREFIXES
            .iter()
            .find_map(|prefix| trimmed.strip_prefix(prefix))
            .unwrap_or(trimmed);
        rest = rest.strip_suffix('/').unwrap_or(rest);
        rest = rest.strip_suffix(".git").unwrap_or(rest);

        let mut parts = rest.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) => Self::new(owner, name).map_err(|e| {
                Error::config(format!("malformed repository '{input}': {e}"))
            }),
            _ => Err(Error::config(format!(
                "malformed repository '{input}', expected owner/name"
            ))),
        }
    }
}

/// Parse the configured watch list, dropping duplicates and keeping first-seen order.
pub fn parse_watch_list<I, S>(items: I) -> Result<Vec<WatchKey>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut keys: Vec<WatchKey> = Vec::new();
    for item in items {
        let item = item.as_ref();
        if item.trim().is_empty() {
            continue;
        }
        let key: WatchKey = item.parse()?;
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    if keys.is_empty() {
        return Err(Error::config("no repositories to watch"));
    }
    Ok(keys)
}
