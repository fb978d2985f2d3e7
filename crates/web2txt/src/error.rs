//! Error types for web2txt
//!
//! Each stage that can fail has its own error enum. [`Web2TxtError`] wraps
//! them for the pipeline and knows how to render the one-line message shown
//! to the user (`Error: <category>. <detail>`).

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while validating the input URL
#[derive(Debug, Error)]
pub enum UrlError {
    /// Input was empty or whitespace only
    #[error("URL cannot be empty")]
    Empty,

    /// Input could not be turned into a scheme + host URL
    #[error("Invalid URL format: {input} ({reason})")]
    Malformed { input: String, reason: String },
}

/// Errors produced while retrieving the page
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connect + read did not finish within the deadline
    #[error("Timeout: no complete response from {url} within {seconds} seconds")]
    Timeout { url: String, seconds: u64 },

    /// DNS failure, refused or reset connection
    #[error("Connection Error: could not connect to {url}")]
    ConnectionError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered 404
    #[error("Not Found (404): {url}")]
    NotFound { url: String },

    /// Server answered 5xx
    #[error("Server Error ({code}): {url}")]
    ServerError { url: String, code: u16 },

    /// Any other non-2xx status
    #[error("HTTP Error ({code}): {url}")]
    HttpStatus { url: String, code: u16 },

    /// Content-Type is not something text can be extracted from
    #[error("Binary content is not supported ({content_type}): {url}")]
    BinaryContent { url: String, content_type: String },

    /// Transport failure that is neither a timeout nor a connection problem
    #[error("Network Error: {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuild(#[source] reqwest::Error),
}

impl FetchError {
    /// Classify a reqwest error raised while talking to `url`
    pub fn from_reqwest(url: &str, err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                seconds: timeout_secs,
            }
        } else if err.is_connect() || err.is_body() {
            FetchError::ConnectionError {
                url: url.to_string(),
                source: err,
            }
        } else {
            FetchError::Request {
                url: url.to_string(),
                source: err,
            }
        }
    }

    /// Map a non-2xx status code to its error variant
    ///
    /// Returns `None` for success codes.
    pub fn from_status(url: &str, code: u16) -> Option<Self> {
        let url = url.to_string();
        match code {
            200..=299 => None,
            404 => Some(FetchError::NotFound { url }),
            500..=599 => Some(FetchError::ServerError { url, code }),
            _ => Some(FetchError::HttpStatus { url, code }),
        }
    }
}

/// Errors produced while writing the output file
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Permission denied: cannot write to {}", .path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File system error: {source}")]
    FileSystemError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WriteError {
    /// Classify an I/O error raised while writing `path`
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            WriteError::PermissionDenied { path, source }
        } else {
            WriteError::FileSystemError { path, source }
        }
    }

    /// Path that could not be written
    pub fn path(&self) -> &std::path::Path {
        match self {
            WriteError::PermissionDenied { path, .. } | WriteError::FileSystemError { path, .. } => {
                path
            }
        }
    }
}

/// Any terminal failure of a conversion run
#[derive(Debug, Error)]
pub enum Web2TxtError {
    #[error(transparent)]
    Url(#[from] UrlError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

impl Web2TxtError {
    /// Human-readable category, the part before the detail
    pub fn category(&self) -> String {
        match self {
            Web2TxtError::Url(_) => "Invalid URL".to_string(),
            Web2TxtError::Fetch(err) => match fetch_error_url(err) {
                Some(url) => format!("Could not retrieve content from {}", url),
                None => "Could not retrieve content".to_string(),
            },
            Web2TxtError::Write(err) => {
                format!("Could not write to file {}", err.path().display())
            }
        }
    }

    /// Single line shown to the user on failure
    pub fn user_message(&self) -> String {
        format!("Error: {}. {}", self.category(), self)
    }
}

fn fetch_error_url(err: &FetchError) -> Option<&str> {
    match err {
        FetchError::Timeout { url, .. }
        | FetchError::ConnectionError { url, .. }
        | FetchError::NotFound { url }
        | FetchError::ServerError { url, .. }
        | FetchError::HttpStatus { url, .. }
        | FetchError::BinaryContent { url, .. }
        | FetchError::Request { url, .. } => Some(url),
        FetchError::ClientBuild(_) => None,
    }
}
