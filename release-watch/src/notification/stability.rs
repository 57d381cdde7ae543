use std::sync::LazyLock;

use regex::Regex;

/// Pre-release markers as standalone tokens, e.g. `v2.0.0-rc.1`, `1.4beta2`,
/// `nightly-2024-01-01`, plus any semver pre-release suffix (`1.2.3-foo`).
static NONSTABLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:^|[^a-z])(?:alpha|beta|rc|pre|preview|dev|snapshot|nightly|canary|eap|milestone)\d*(?:[^a-z]|$)|\d+\.\d+\.\d+-[0-9a-z]",
    )
    .unwrap()
});

/// Whether a release name looks like a pre-release.
pub fn is_nonstable(release_name: &str) -> bool {
    NONSTABLE_REGEX.is_match(release_name)
}
