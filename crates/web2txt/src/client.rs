//! HTTP client configuration and one-shot fetch helpers
//!
//! The actual fetch logic lives in [`HttpFetcher`](crate::fetchers::HttpFetcher).

use crate::error::Web2TxtError;
use crate::fetchers::{Fetcher, HttpFetcher};
use crate::progress::NoProgress;
use crate::source::normalize_url;
use crate::types::FetchResult;
use crate::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use std::time::Duration;

/// Options for the HTTP fetcher
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Custom User-Agent
    pub user_agent: Option<String>,
    /// Deadline for connect + headers + body
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl FetchOptions {
    /// User-Agent to send, falling back to [`DEFAULT_USER_AGENT`]
    pub fn effective_user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }
}

/// Validate `url` and fetch it with default options
pub async fn fetch(url: &str) -> Result<FetchResult, Web2TxtError> {
    fetch_with_options(url, FetchOptions::default()).await
}

/// Validate `url` and fetch it with custom options
pub async fn fetch_with_options(
    url: &str,
    options: FetchOptions,
) -> Result<FetchResult, Web2TxtError> {
    let source = normalize_url(url)?;
    let fetcher = HttpFetcher::with_options(options);
    Ok(fetcher.fetch(&source, &NoProgress).await?)
}
