//! HTTP page fetching
//!
//! [`PageFetcher`] is the only network seam in the crate. [`HttpFetcher`]
//! implements it with a blocking `ureq` agent; tests substitute a scripted
//! fetcher.

use ureq::ResponseExt;

use crate::config::FetchConfig;
use crate::error::FetchError;

/// A fetched response, already known to have a 2xx status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// URL the response was served from, after redirects
    pub final_url: String,
    /// Raw `Content-Type` header, if any
    pub content_type: Option<String>,
    pub body: String,
}

/// Blocking GET capability.
///
/// Implementations report non-2xx responses as [`FetchError::Http`] and
/// every other failure as [`FetchError::Transport`].
pub trait PageFetcher {
    fn get(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// `ureq`-backed fetcher with a global per-request timeout.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Self {
        let agent = ureq::Agent::new_with_config(
            ureq::Agent::config_builder()
                .timeout_global(Some(config.timeout))
                .user_agent(config.user_agent.as_str())
                .build(),
        );
        Self { agent }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(&FetchConfig::default())
    }
}

impl PageFetcher for HttpFetcher {
    fn get(&self, url: &str) -> Result<FetchedPage, FetchError> {
        tracing::debug!("GET {}", url);

        let response = self.agent.get(url).call().map_err(|err| match err {
            ureq::Error::StatusCode(status) => FetchError::Http {
                status,
                url: url.to_string(),
            },
            other => FetchError::Transport {
                url: url.to_string(),
                message: other.to_string(),
            },
        })?;

        let final_url = response.get_uri().to_string();
        let content_type = response
            .headers()
            .get(ureq::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                message: format!("failed to read body: {}", e),
            })?;

        Ok(FetchedPage {
            final_url,
            content_type,
            body,
        })
    }
}
