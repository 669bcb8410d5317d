//! Runtime configuration for page requests

use std::time::Duration;

/// Environment variable overriding the per-request timeout, in seconds.
pub const TIMEOUT_ENV: &str = "SHOPIFY_SCRAPE_TIMEOUT";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: concat!("shopify_scrape/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchConfig {
    /// Defaults, with the timeout taken from `SHOPIFY_SCRAPE_TIMEOUT` when set.
    pub fn from_env() -> Self {
        let raw = std::env::var(TIMEOUT_ENV).ok();
        Self {
            timeout: parse_timeout(raw.as_deref()),
            ..Self::default()
        }
    }
}

/// Absent, unparsable, non-positive or unrepresentable values fall back to the default.
fn parse_timeout(raw: Option<&str>) -> Duration {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|secs| *secs > 0.0)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}
