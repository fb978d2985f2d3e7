//! HTTP fetcher
//!
//! GETs the page with a single deadline covering connect, headers and the
//! whole body, streams the body chunk by chunk for progress reporting, maps
//! non-2xx statuses to errors and decodes the bytes.

use crate::client::FetchOptions;
use crate::decode::{decode_body, parse_charset};
use crate::error::FetchError;
use crate::fetchers::Fetcher;
use crate::progress::{FetchProgress, ProgressSink};
use crate::source::SourceUrl;
use crate::types::FetchResult;
use crate::DEFAULT_USER_AGENT;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT};
use tokio::time::Instant;
use tracing::{debug, error, warn};

/// Binary content type prefixes
const BINARY_PREFIXES: &[&str] = &[
    "image/",
    "audio/",
    "video/",
    "application/octet-stream",
    "application/pdf",
    "application/zip",
    "application/gzip",
    "application/x-tar",
    "application/x-rar",
    "application/x-7z",
    "application/vnd.ms-",
    "application/vnd.openxmlformats",
    "font/",
];

/// Accept header sent with every request
const ACCEPT_HTML: &str = "text/html, application/xhtml+xml, text/plain;q=0.9, */*;q=0.8";

/// HTTP/HTTPS fetcher backed by reqwest
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    options: FetchOptions,
}

impl HttpFetcher {
    /// Create a fetcher with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fetcher with custom options
    pub fn with_options(options: FetchOptions) -> Self {
        Self { options }
    }

    /// Options this fetcher was built with
    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    fn build_client(&self) -> Result<reqwest::Client, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(self.options.effective_user_agent())
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
        );
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));

        reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(self.options.timeout)
            .timeout(self.options.timeout)
            .build()
            .map_err(FetchError::ClientBuild)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(
        &self,
        url: &SourceUrl,
        progress: &dyn ProgressSink,
    ) -> Result<FetchResult, FetchError> {
        let timeout_secs = self.options.timeout.as_secs();
        let deadline = Instant::now() + self.options.timeout;
        let client = self.build_client()?;

        debug!(url = %url, timeout_secs, "Sending GET request");

        let response = match tokio::time::timeout_at(deadline, client.get(url.as_str()).send()).await
        {
            Ok(result) => {
                result.map_err(|e| FetchError::from_reqwest(url.as_str(), e, timeout_secs))?
            }
            Err(_) => {
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                    seconds: timeout_secs,
                })
            }
        };

        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();
        debug!(status = status_code, url = %final_url, "Received response headers");

        if let Some(err) = FetchError::from_status(url.as_str(), status_code) {
            return Err(err);
        }

        let headers = response.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let content_length: Option<u64> = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok());

        if let Some(ref ct) = content_type {
            if is_binary_content_type(ct) {
                return Err(FetchError::BinaryContent {
                    url: url.to_string(),
                    content_type: ct.clone(),
                });
            }
        }

        progress.started(content_length);
        let body = read_body(response, deadline, content_length, progress)
            .await
            .map_err(|e| match e {
                BodyError::Deadline => FetchError::Timeout {
                    url: url.to_string(),
                    seconds: timeout_secs,
                },
                BodyError::Stream(err) => FetchError::from_reqwest(url.as_str(), err, timeout_secs),
            })?;
        let bytes_read = body.len() as u64;
        progress.finished(FetchProgress::new(bytes_read, content_length));

        let charset = content_type.as_deref().and_then(parse_charset);
        let (decoded, encoding) = decode_body(&body, charset.as_deref());
        debug!(bytes = bytes_read, encoding, lossy = decoded.is_lossy(), "Body decoded");

        Ok(FetchResult {
            url: final_url,
            status_code,
            content_type,
            encoding: encoding.to_string(),
            body: decoded,
            bytes_read,
        })
    }
}

/// Check if content type indicates binary content
fn is_binary_content_type(content_type: &str) -> bool {
    let ct_lower = content_type.trim().to_lowercase();
    BINARY_PREFIXES
        .iter()
        .any(|prefix| ct_lower.starts_with(prefix))
}

enum BodyError {
    Deadline,
    Stream(reqwest::Error),
}

/// Stream the response body until it ends or `deadline` passes
async fn read_body(
    response: reqwest::Response,
    deadline: Instant,
    total: Option<u64>,
    progress: &dyn ProgressSink,
) -> Result<Bytes, BodyError> {
    let mut body = Vec::with_capacity(total.unwrap_or(0).min(16 * 1024 * 1024) as usize);
    let mut stream = response.bytes_stream();

    loop {
        let chunk_future = stream.next();
        let timeout_future = tokio::time::sleep_until(deadline);

        tokio::select! {
            chunk = chunk_future => {
                match chunk {
                    Some(Ok(bytes)) => {
                        body.extend_from_slice(&bytes);
                        progress.advanced(FetchProgress::new(body.len() as u64, total));
                    }
                    Some(Err(e)) => {
                        error!("Error reading body chunk: {}", e);
                        return Err(BodyError::Stream(e));
                    }
                    None => {
                        return Ok(Bytes::from(body));
                    }
                }
            }
            _ = timeout_future => {
                warn!(bytes = body.len(), "Body deadline reached");
                return Err(BodyError::Deadline);
            }
        }
    }
}
