//! Core types for web2txt

use crate::decode::DecodedBody;
use serde::{Deserialize, Serialize};

/// Successful response from a fetcher
///
/// Only 2xx responses become a `FetchResult`; everything else is a
/// [`FetchError`](crate::FetchError).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// URL of the final response, after redirects
    pub url: String,
    /// HTTP status code, always in 200..=299
    pub status_code: u16,
    /// Content-Type header value
    pub content_type: Option<String>,
    /// Name of the encoding the body was decoded with
    pub encoding: String,
    /// Decoded body
    pub body: DecodedBody,
    /// Raw body bytes read from the wire
    pub bytes_read: u64,
}

impl FetchResult {
    /// Decoded body text
    pub fn text(&self) -> &str {
        self.body.text()
    }

    /// True if decoding had to substitute replacement characters
    pub fn is_lossy(&self) -> bool {
        self.body.is_lossy()
    }
}

/// Summary of a completed conversion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionReport {
    /// The fetched URL (after redirects)
    pub url: String,

    /// Path of the written text file
    pub output: String,

    /// Bytes written to the output file
    pub bytes_written: u64,

    /// HTTP status code of the page
    pub status_code: u16,

    /// Content-Type header value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Body bytes downloaded
    pub bytes_fetched: u64,

    /// Encoding used to decode the body
    pub encoding: String,

    /// True if undecodable bytes were replaced
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub lossy_decode: bool,

    /// True if the page had no readable text and the placeholder was written
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub empty_content: bool,
}
