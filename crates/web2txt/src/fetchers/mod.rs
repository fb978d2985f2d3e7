//! Content fetchers
//!
//! A [`Fetcher`] turns a validated URL into a decoded 2xx response or a
//! classified [`FetchError`]. The pipeline only talks to this trait, so
//! tests and embedders can swap the transport.

mod http;

pub use http::HttpFetcher;

use crate::error::FetchError;
use crate::progress::ProgressSink;
use crate::source::SourceUrl;
use crate::types::FetchResult;
use async_trait::async_trait;

/// Trait for content fetchers
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Identifier for logging
    fn name(&self) -> &'static str;

    /// Retrieve `url`, reporting body progress to `progress`
    ///
    /// Implementations must only return `Ok` for 2xx responses.
    async fn fetch(
        &self,
        url: &SourceUrl,
        progress: &dyn ProgressSink,
    ) -> Result<FetchResult, FetchError>;
}
